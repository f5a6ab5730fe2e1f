use crate::error::{FormError, Result};
use tracing::warn;

/// Shared password the field teams were issued.
pub const DEFAULT_ACCESS_SECRET: &str = "bksouth";

/// A single shared password; there are no user accounts.
pub struct AccessGate {
    secret: String,
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, attempt: &str) -> Result<()> {
        if attempt == self.secret {
            Ok(())
        } else {
            warn!("rejected password attempt");
            Err(FormError::AccessDenied)
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESS_SECRET)
    }
}
