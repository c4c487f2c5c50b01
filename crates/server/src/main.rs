use krishimitra_config::load_settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // KRISHI_CONFIG points at an optional TOML file; KRISHI_ env vars
    // override individual values either way
    let config_path = std::env::var("KRISHI_CONFIG").ok().map(PathBuf::from);
    let settings = load_settings(config_path.as_deref())?;

    krishimitra_server::serve(settings).await
}
