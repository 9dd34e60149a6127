use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("page '{title}' does not exist on {edition}wiki")]
    PageMissing { edition: String, title: String },

    #[error("no linked entity for '{title}'")]
    EntityUnresolvable { title: String },

    #[error("transient fetch failure on {edition}wiki: {message}")]
    Transient { edition: String, message: String },

    #[error("malformed template markup: {0}")]
    Parse(String),

    #[error("API error: {message}")]
    Api { message: String },
}

impl CheckerError {
    /// True when no collaborator is reachable at all, as opposed to a single
    /// page or edition misbehaving. Systemic failures abort the whole run.
    pub fn is_systemic(&self) -> bool {
        match self {
            CheckerError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckerError>;
