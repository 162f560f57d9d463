use taskreminder::{app, state::AppState};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "taskreminder=debug,axum=info,tower_http=info".to_string());
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => subscriber.with_target(false).json().init(),
        _ => subscriber.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    tracing::info!(
        issuer = %state.config.jwt.issuer,
        token_ttl_minutes = state.config.jwt.ttl_minutes,
        "task reminder service starting"
    );
    app::serve(app::build_app(state)).await
}
