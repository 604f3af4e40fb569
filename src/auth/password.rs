use crate::error::AppError;
use actix_web::web;
use tracing::warn;

/// Salted bcrypt hashing. Both operations run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct CredentialService {
    cost: u32,
}

impl CredentialService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let digest = web::block(move || bcrypt::hash(plaintext, cost)).await??;
        Ok(digest)
    }

    /// A digest that is not valid bcrypt never matches.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        let result = web::block(move || bcrypt::verify(plaintext, &digest)).await?;

        match result {
            Ok(matched) => Ok(matched),
            Err(e) => {
                warn!("Stored password digest is unusable: {}", e);
                Ok(false)
            }
        }
    }
}
