#![allow(dead_code)]

use actix_web::web;
use flatfile_auth::config::{AuthConfig, CorsConfig, ServerConfig, StoreConfig};
use flatfile_auth::{AppState, Settings};
use std::path::Path;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_settings(store_path: &Path) -> Settings {
    Settings {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        store: StoreConfig {
            path: store_path.to_path_buf(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            token_expiry_days: 7,
            // lowest bcrypt cost keeps the suite fast
            bcrypt_cost: 4,
        },
        cors: CorsConfig {
            allow_any_origin: true,
            max_age: 3600,
        },
    }
}

pub fn file_backed_state(store_path: &Path) -> web::Data<AppState> {
    let state = AppState::new(test_settings(store_path)).expect("Failed to build app state");
    web::Data::new(state)
}
