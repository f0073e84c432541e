use thiserror::Error;

/// Failures surfaced to a partner viewing insights.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("server error: {0}")]
    Server(String),
}

impl AccessError {
    /// Short message for the person at the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            AccessError::Network(_) => "Can't reach VibeCheck right now. Check your connection.",
            AccessError::Unauthorized(_) => "That PIN didn't work. Try again.",
            AccessError::Server(_) => "Something went wrong on our side. Refresh to try again.",
        }
    }
}

fn from_database(err: &sqlx::Error) -> AccessError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
            AccessError::Network(err.to_string())
        }
        _ => AccessError::Server(err.to_string()),
    }
}

/// Finds the first typed failure in an error chain, treating anything else
/// as a server failure.
pub fn classify(err: &anyhow::Error) -> AccessError {
    for cause in err.chain() {
        if let Some(access) = cause.downcast_ref::<AccessError>() {
            return access.clone();
        }
        if let Some(db) = cause.downcast_ref::<sqlx::Error>() {
            return from_database(db);
        }
    }
    AccessError::Server(err.to_string())
}

fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Checks a supplied insights PIN against the configured one.
pub fn verify_pin(expected: Option<&str>, supplied: Option<&str>) -> Result<(), AccessError> {
    let expected = expected
        .ok_or_else(|| AccessError::Server("no insights PIN is configured".to_string()))?;
    if !is_valid_pin(expected) {
        return Err(AccessError::Server(
            "configured insights PIN must be 4 digits".to_string(),
        ));
    }

    match supplied {
        None => Err(AccessError::Unauthorized("PIN required".to_string())),
        Some(pin) if !is_valid_pin(pin) => {
            Err(AccessError::Unauthorized("PIN must be 4 digits".to_string()))
        }
        Some(pin) if pin != expected => {
            Err(AccessError::Unauthorized("PIN mismatch".to_string()))
        }
        Some(_) => Ok(()),
    }
}
