use crate::core::{service::mover::MoveService, template::PathTemplate};
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    /// Docpath services.
    pub services: ServiceState,

    /// Postgres connection pool. Used directly in tests.
    pub postgres: PgPool,
}

impl AppState {
    /// Load the application state using the provided configuration.
    pub async fn new(args: &crate::config::StartArgs) -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from(args.log()))
            .init();

        let postgres = crate::app::repo::pg::init(&args.db_url()).await;

        let page_size = args.max_page_size();
        info!("Using bulk page size {page_size}");

        let services = ServiceState::new(postgres.clone(), page_size);

        Self { services, postgres }
    }
}

#[derive(Clone)]
pub struct ServiceState {
    pub mover: MoveService<PgPool>,
}

impl ServiceState {
    pub fn new(postgres: PgPool, page_size: usize) -> Self {
        let mover = MoveService::new(postgres, PathTemplate::new()).with_page_size(page_size);
        Self { mover }
    }
}
