use actix_web::{web, HttpServer};
use dotenv::dotenv;
use flatfile_auth::{build_app, init_tracing, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> flatfile_auth::Result<()> {
    // Load environment variables
    dotenv().ok();

    init_tracing();

    // Refuse to start without a usable signing secret
    let config = Settings::new().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::from(e)
    })?;
    info!("Configuration loaded successfully");
    info!("User store at {}", config.store.path.display());

    let state = web::Data::new(AppState::new(config.clone())?);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at http://{}:{}", config.server.host, config.server.port);

    HttpServer::new(move || build_app(state.clone()))
        .listen(listener)?
        .workers(config.server.workers as usize)
        .run()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
