use thiserror::Error;

/// Failure reported by the generation collaborator (the LLM call).
///
/// Surfaced as the source of [`SyllabiError::GenerationFailed`] and
/// [`SyllabiError::RegenerationFailed`], never on its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("quota or permission denied: {0}")]
    QuotaOrPermissionDenied(String),

    #[error("upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("generator misconfigured: {0}")]
    Config(String),
}

impl GenerationError {
    /// Classify a non-success HTTP response from a provider.
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        let message = extract_error_message(body)
            .unwrap_or_else(|| format!("{provider} returned HTTP {status}"));
        let lower = message.to_lowercase();
        if matches!(status, 401 | 403 | 429)
            || lower.contains("quota")
            || lower.contains("permission")
            || lower.contains("resource_exhausted")
        {
            Self::QuotaOrPermissionDenied(message)
        } else {
            Self::Upstream { status, message }
        }
    }
}

/// Providers wrap their error text as `{"error": {"message": ...}}`; fall back to
/// the raw body when it is something else.
fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(json) => json["error"]["message"]
            .as_str()
            .or_else(|| json["error"].as_str())
            .map(|s| s.to_string()),
        Err(_) => Some(trimmed.chars().take(500).collect()),
    }
}

#[derive(Debug, Error)]
pub enum SyllabiError {
    // -- identity --
    #[error("an account with this email already exists")]
    DuplicateIdentity,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("weak password: {0}")]
    WeakPassword(String),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("password hashing failed: {0}")]
    Credential(String),

    // -- curriculum --
    #[error("generation failed: {0}")]
    GenerationFailed(#[source] GenerationError),

    #[error("refinement failed: {0}")]
    RegenerationFailed(#[source] GenerationError),

    #[error("no active curriculum")]
    NoActiveArtifact,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("a generation request is already in progress")]
    Busy,

    // -- ambient --
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SyllabiError {
    /// The collaborator failure beneath a (re)generation error, if any.
    pub fn generation_cause(&self) -> Option<&GenerationError> {
        match self {
            Self::GenerationFailed(cause) | Self::RegenerationFailed(cause) => Some(cause),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyllabiError>;
