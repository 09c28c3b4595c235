use axum::response::Json;
use serde_json::{json, Value};

/// GET / - service name, version and route overview
pub async fn get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Critterbase API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Wildlife telemetry and critter records",
            "endpoints": {
                "health": "/health (public)",
                "critters": "/api/critters[/:id] (protected)",
                "events": "/api/captures, /api/mortality (protected)",
                "observations": "/api/markings, /api/measurements (protected)",
                "family": "/api/family (protected)",
                "lookups": "/api/lookups/:table, /api/lookups/enum/:name (protected)",
                "xref": "/api/xref/* (protected)",
                "bulk": "/api/bulk (protected)",
            }
        }
    }))
}
