use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tracing::{error, info};
use user_management_api::application::user_service::UserService;
use user_management_api::data::user_repository::SqliteUserRepository;
use user_management_api::infrastructure::config::AppConfig;
use user_management_api::infrastructure::database;
use user_management_api::infrastructure::logging::init_logging;
use user_management_api::presentation::handlers::{AppState, route_not_found};
use user_management_api::presentation::middleware::{RequestTracing, cors};
use user_management_api::presentation::routes::{ROUTES, configure};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env().inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    info!(
        environment = %config.environment,
        database_url = %config.database_url,
        "Configuration loaded"
    );

    let pool = database::connect(&config).await.inspect_err(|e| {
        error!(error = %e, "Error during database connection");
    })?;
    info!("Connected to SQLite database");

    let repository = SqliteUserRepository::new(pool);
    let state = web::Data::new(AppState {
        service: UserService::new(Arc::new(repository)),
    });

    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .wrap(RequestTracing)
            .wrap(cors())
            .configure(configure)
            .default_service(web::to(route_not_found))
    });

    let (host, port) = config.bind_address();
    let server = server.bind((host.as_str(), port))?;
    info!(address = %format!("http://{}:{}", host, port), routes = %ROUTES, "Server is running");

    server.run().await?;
    Ok(())
}
