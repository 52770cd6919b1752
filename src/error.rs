use reqwest::{Method, StatusCode};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing configuration value `{0}`")]
    Configuration(&'static str),

    #[error("Habitica answered {method} {path} with {status}{}", detail(.message))]
    UnexpectedResponse {
        method: Method,
        path: String,
        status: StatusCode,
        message: Option<String>,
    },

    #[error("couldn't reach Habitica: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("couldn't parse webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}
