use migration::Migrator;
use migration::MigratorTrait;
use post::PostRepository;
use response::{IntoResponse, Response};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use user::UserRepository;

mod active_models;
pub mod post;
mod response;
pub mod user;

#[derive(Clone, Debug)]
pub struct Repository {
    pub post: PostRepository,
    pub user: UserRepository,
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            post: PostRepository::new(db.clone()),
            user: UserRepository::new(db.clone()),
            db,
        }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.db.ping().await?;

        Ok(())
    }

    /// Runs raw SQL against the underlying connection, for test fixtures.
    #[cfg(any(test, feature = "testing"))]
    pub async fn execute_unprepared(&self, sql: &str) -> anyhow::Result<()> {
        use sea_orm::ConnectionTrait;

        self.db.execute_unprepared(sql).await?;

        Ok(())
    }

    /// Closes the shared pool; every later query fails.
    #[cfg(any(test, feature = "testing"))]
    pub async fn close(&self) -> anyhow::Result<()> {
        self.db.clone().close().await?;

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(
        "in sea-orm crate from unsuccessful database operations: {}: {}",
        message,
        source
    )]
    InSeaOrmDbErr {
        message: String,
        source: sea_orm::DbErr,
    },
}

pub async fn init_repository(db_url: &str) -> Response<Repository> {
    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(5)
        .min_connections(1)
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    connect(opt).await
}

pub async fn connect(opt: ConnectOptions) -> Response<Repository> {
    let db = init_db(opt).await?;

    Ok(Repository::new(db))
}

/// Single-connection SQLite database living as long as the repository.
#[cfg(any(test, feature = "testing"))]
pub async fn init_in_memory() -> Response<Repository> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    connect(opt).await
}

async fn init_db(opt: ConnectOptions) -> Response<DatabaseConnection> {
    let db = Database::connect(opt)
        .await
        .into_response("in database connect")?;

    Migrator::up(&db, None)
        .await
        .into_response("in migrator up")?;

    Ok(db)
}
