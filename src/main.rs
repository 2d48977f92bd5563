use shuttle_runtime::{Error, SecretStore, Secrets};
use tracing_subscriber::EnvFilter;

#[shuttle_runtime::main]
async fn main(
    #[Secrets] secret_store: SecretStore,
    #[shuttle_shared_db::Postgres(local_uri = "{secrets.LOCAL_DATABASE_URL}")]
    conn_string: String,
) -> shuttle_axum::ShuttleAxum {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(jwt_secret) = secret_store.get("JWT_SECRET") else {
        return Err(Error::BuildPanic("JWT_SECRET was not found".to_string()));
    };
    let config = secret_store.get("CONFIG").unwrap_or_default();
    let config_name = format!("Config{}.toml", config);

    let repository = repository::init_repository(&conn_string)
        .await
        .map_err(|e| Error::BuildPanic(e.to_string()))?;

    let router = api::serve(repository, &config_name, &jwt_secret)
        .await
        .map_err(|e| Error::BuildPanic(e.to_string()))?;

    Ok(router.into())
}
