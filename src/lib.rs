pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod serverless;

use std::sync::Arc;
use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpResponse};
use tracing_subscriber::EnvFilter;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthService, CredentialService, TokenService};
pub use db::{JsonFileStore, MemoryStore, User, UserStore};

/// Install the global fmt subscriber. `RUST_LOG` overrides the `info` default.
/// Output goes to stderr so the serverless entry point keeps stdout clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Health check endpoint handler
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// State backed by the JSON user file at `config.store.path`.
    pub fn new(config: Settings) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(JsonFileStore::new(config.store.path.clone()));
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Settings, store: Arc<dyn UserStore>) -> Self {
        let auth_service = AuthService::new(
            store,
            CredentialService::new(config.auth.bcrypt_cost),
            TokenService::new(&config.auth.jwt_secret, config.auth.token_expiry_days),
        );

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        }
    }
}

pub fn cors(config: &Settings) -> Cors {
    let cors = if config.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        // same-origin only
        Cors::default()
    };

    cors.max_age(config.cors.max_age as usize)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/register", web::post().to(auth::handlers::register))
            .route("/login", web::post().to(auth::handlers::login))
            .route("/me", web::get().to(auth::handlers::me)),
    );
}

/// The application shared by the HTTP server and the serverless entry point.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let cors = cors(&state.config);

    App::new()
        .wrap(cors)
        .app_data(state)
        .configure(configure_routes)
}
