use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::error::{AppError, AuthError};
use tracing::{debug, info, error};

/// Parse a JSON or urlencoded body. An empty body, or one in any other
/// content type, is read as an empty request so missing fields surface as
/// `Missing fields` rather than a parse error.
fn parse_body<T: DeserializeOwned + Default>(req: &HttpRequest, body: &[u8]) -> Result<T, AppError> {
    if body.is_empty() {
        return Ok(T::default());
    }

    let content_type = req.content_type();
    let parsed = if content_type == "application/json" || content_type.ends_with("+json") {
        serde_json::from_slice(body).map_err(|e| e.to_string())
    } else if content_type == "application/x-www-form-urlencoded" {
        serde_urlencoded::from_bytes(body).map_err(|e| e.to_string())
    } else {
        debug!("Ignoring body with content type {:?}", content_type);
        return Ok(T::default());
    };

    parsed.map_err(|e| {
        debug!("Rejected request body: {}", e);
        AppError::ValidationError("Invalid request body".to_string())
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub persisted: bool,
}

pub async fn register(
    http: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req: RegisterRequest = parse_body(&http, &body)?;
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    info!("Received registration request for user: {}", username);

    match state.auth_service.register(&username, &password, req.email).await {
        Ok(registration) => {
            info!("Registration successful for user: {}", username);
            Ok(HttpResponse::Ok().json(RegisterResponse {
                success: true,
                message: "Registered successfully",
                persisted: registration.persisted,
            }))
        }
        Err(e) => {
            error!("Registration failed for user: {}: {}", username, e);
            Err(e)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

pub async fn login(
    http: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req: LoginRequest = parse_body(&http, &body)?;
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    info!("Received login request for user: {}", username);

    match state.auth_service.login(&username, &password).await {
        Ok(token) => {
            info!("Login successful for user: {}", username);
            Ok(HttpResponse::Ok().json(LoginResponse { success: true, token }))
        }
        Err(e) => {
            error!("Login failed for user: {}: {}", username, e);
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: String,
}

/// Token from an `Authorization: Bearer <token>` header. Any other scheme,
/// or an empty token, counts as no token.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

pub async fn me(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req).ok_or(AuthError::NoToken)?;
    let user = state.auth_service.identify(token)?;
    Ok(HttpResponse::Ok().json(MeResponse { user }))
}
