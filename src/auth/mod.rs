//! Authentication module
//!
//! Password hashing, session token issue/verify, and the register/login/identity
//! flows built on top of them.

pub mod handlers;
mod password;
mod service;
mod token;

pub use password::CredentialService;
pub use service::{AuthService, Registration};
pub use token::{Claims, TokenService, MAX_TOKEN_EXPIRY_DAYS};
