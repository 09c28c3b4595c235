#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, KEYCLOAK_HOST, etc.
    let _ = dotenvy::dotenv();
    critterbase::init_tracing();

    critterbase::cli::commands::serve::run(critterbase::config::config()).await
}
