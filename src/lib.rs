pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod itis;
pub mod middleware;
pub mod services;
pub mod state;
pub mod validation;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::AppConfig;
use crate::middleware::keycloak_auth_middleware;
use crate::state::AppState;

/// Log filter from `RUST_LOG`, defaulting to info for this crate and tower-http
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("critterbase=info,tower_http=info,sqlx=warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build the full router: public routes at the root, everything else under
/// `/api` behind Keycloak authentication
pub fn app(state: AppState, config: &AppConfig) -> Router {
    use handlers::public;

    let api = api_routes().route_layer(from_fn_with_state(state.clone(), keycloak_auth_middleware));

    Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        // Protected API
        .nest("/api", api)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer(config))
                .layer(cors_layer(config))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(critter_routes())
        .merge(event_routes())
        .merge(observation_routes())
        .merge(family_routes())
        .merge(reference_routes())
        .route("/bulk", post(handlers::protected::bulk::create).patch(handlers::protected::bulk::patch))
}

fn critter_routes() -> Router<AppState> {
    use handlers::protected::critters;

    Router::new()
        .route("/critters", get(critters::list).post(critters::create))
        .route("/critters/filter", post(critters::filter))
        .route("/critters/unique", post(critters::unique))
        .route(
            "/critters/:id",
            get(critters::get).patch(critters::update).delete(critters::delete),
        )
}

fn event_routes() -> Router<AppState> {
    use handlers::protected::{captures, locations, mortality};

    Router::new()
        .route("/captures", post(captures::create))
        .route(
            "/captures/:id",
            get(captures::get).patch(captures::update).delete(captures::delete),
        )
        .route("/captures/critter/:id", get(captures::list_by_critter))
        .route("/mortality", post(mortality::create))
        .route(
            "/mortality/:id",
            get(mortality::get).patch(mortality::update).delete(mortality::delete),
        )
        .route("/mortality/critter/:id", get(mortality::list_by_critter))
        .route("/locations", get(locations::list).post(locations::create))
        .route(
            "/locations/:id",
            get(locations::get).patch(locations::update).delete(locations::delete),
        )
}

fn observation_routes() -> Router<AppState> {
    use handlers::protected::{collection_units, markings, measurements};

    Router::new()
        .route("/markings", post(markings::create))
        .route("/markings/verify", post(markings::verify))
        .route(
            "/markings/:id",
            get(markings::get).patch(markings::update).delete(markings::delete),
        )
        .route("/markings/critter/:id", get(markings::list_by_critter))
        .route("/measurements/qualitative", post(measurements::create_qualitative))
        .route(
            "/measurements/qualitative/:id",
            get(measurements::get_qualitative)
                .patch(measurements::update_qualitative)
                .delete(measurements::delete_qualitative),
        )
        .route("/measurements/quantitative", post(measurements::create_quantitative))
        .route(
            "/measurements/quantitative/:id",
            get(measurements::get_quantitative)
                .patch(measurements::update_quantitative)
                .delete(measurements::delete_quantitative),
        )
        .route("/measurements/critter/:id", get(measurements::list_by_critter))
        .route("/measurements/verify", post(measurements::verify))
        .route("/collection-units", post(collection_units::create))
        .route(
            "/collection-units/:id",
            get(collection_units::get)
                .patch(collection_units::update)
                .delete(collection_units::delete),
        )
        .route("/collection-units/critter/:id", get(collection_units::list_by_critter))
}

fn family_routes() -> Router<AppState> {
    use handlers::protected::family;

    Router::new()
        .route("/family", get(family::list).post(family::create))
        .route(
            "/family/parents",
            get(family::list_parents)
                .post(family::add_parent)
                .delete(family::remove_parent),
        )
        .route(
            "/family/children",
            get(family::list_children)
                .post(family::add_child)
                .delete(family::remove_child),
        )
        .route("/family/critter/:id", get(family::list_by_critter))
        .route("/family/immediate/:id", get(family::immediate))
        .route(
            "/family/:id",
            get(family::get).patch(family::update).delete(family::delete),
        )
}

fn reference_routes() -> Router<AppState> {
    use handlers::protected::{lookups, users, xref};

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/me", get(users::me))
        .route(
            "/users/:id",
            get(users::get).patch(users::update).delete(users::delete),
        )
        .route("/lookups/enum/:name", get(lookups::enum_values))
        .route("/lookups/:table", get(lookups::table))
        .route("/xref/taxon-collection-categories", get(xref::collection_categories))
        .route("/xref/collection-units/:category_id", get(xref::collection_units))
        .route("/xref/taxon-marking-body-locations", get(xref::marking_body_locations))
        .route("/xref/taxon-qualitative-measurements", get(xref::qualitative_measurements))
        .route(
            "/xref/taxon-qualitative-measurement-options/:taxon_measurement_id",
            get(xref::qualitative_options),
        )
        .route("/xref/taxon-quantitative-measurements", get(xref::quantitative_measurements))
        .route("/xref/taxon-measurements", get(xref::measurements))
}

/// Request spans and response lines log at info when request logging is
/// enabled, at debug otherwise
fn trace_layer(config: &AppConfig) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    let level = if config.api.enable_request_logging {
        Level::INFO
    } else {
        Level::DEBUG
    };
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(level))
        .on_response(DefaultOnResponse::new().level(level))
}

/// Disabled CORS adds no headers; enabled with no origins allows any origin
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
