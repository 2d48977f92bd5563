use std::net::{Ipv4Addr, SocketAddr};

use api::{router, ApiState, Config};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct Secrets {
    local_database_url: String,
    jwt_secret: String,
    #[serde(default)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let secrets: Secrets = util::load_env()?;

    let repository =
        repository::init_repository(&secrets.local_database_url).await?;

    let config_name = format!("Config{}.toml", secrets.config);
    let config: Config = util::load_config(&config_name)?;
    let port = config.server.port;

    let router =
        router(ApiState::new(repository, config, &secrets.jwt_secret))?;

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(&address).await?;
    info!(task = "listen", %address);

    Ok(axum::serve(listener, router).await?)
}
