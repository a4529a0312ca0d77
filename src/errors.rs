use thiserror::Error;

/// Failure of a single call against the supervisor HTTP API.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("supervisor unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {status}{}", detail_suffix(.message))]
    Http { status: u16, message: String },
    #[error("invalid response payload: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RequestError {
    pub fn http(status: u16, body: &str) -> Self {
        let message = body.lines().next().unwrap_or_default().trim().to_string();
        Self::Http { status, message }
    }

    /// HTTP status for failures that reached the supervisor.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::Parse(_) => None,
        }
    }
}

fn detail_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(" ({message})")
    }
}
