use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::trace;

use crate::{
    config::HabiticaConfig,
    error::{Error, Result},
    sync::{TaskAlias, TaskTracker},
};

mod task;
pub use task::*;

const X_API_USER: &str = "x-api-user";
const X_API_KEY: &str = "x-api-key";
const X_CLIENT: &str = "x-client";

/// Sent in `x-client` after the user ID, so Habitica can tell which tool is calling.
const CLIENT_NAME: &str = "taskhook";

/// Authenticated client for the Habitica v3 REST API.
///
/// Every call is a single request: no retries, no timeout besides the transport's own.
pub struct HabiticaClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    api_key: String,
}

impl HabiticaClient {
    /// Builds a client on top of a shared [`reqwest::Client`], failing with
    /// [`Error::Configuration`] if the credentials are missing from `config`.
    pub fn new(http: reqwest::Client, config: &HabiticaConfig) -> Result<Self> {
        let user_id = required(&config.user_id, "habitica.user_id")?;
        let api_key = required(&config.api_key, "habitica.api_key")?;

        Ok(Self {
            http,
            base_url: config.api_url.as_str().trim_end_matches('/').to_owned(),
            user_id,
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        trace!("sending {} {} to Habitica", method, path);
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(X_API_USER, &self.user_id)
            .header(X_API_KEY, &self.api_key)
            .header(X_CLIENT, format!("{}-{}", self.user_id, CLIENT_NAME))
    }
}

#[rocket::async_trait]
impl TaskTracker for HabiticaClient {
    async fn task_exists(&self, alias: &TaskAlias) -> Result<bool> {
        let path = format!("/tasks/{}", alias);
        let response = self.request(Method::GET, &path).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected_response(Method::GET, path, response).await),
        }
    }

    async fn create_task(&self, task: &NewTask) -> Result<()> {
        let path = "/tasks/user";
        let response = self.request(Method::POST, path).json(task).send().await?;

        expect_success(Method::POST, path.to_owned(), response).await
    }

    async fn score_task(&self, alias: &TaskAlias, direction: Direction) -> Result<()> {
        let path = format!("/tasks/{}/score/{}", alias, direction);
        let response = self.request(Method::POST, &path).send().await?;

        expect_success(Method::POST, path, response).await
    }
}

/// Habitica wraps every answer in this envelope, errors included.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    message: Option<String>,
}

async fn expect_success(method: Method, path: String, response: Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        return Err(unexpected_response(method, path, response).await);
    }

    let envelope: Envelope = response.json().await?;
    if envelope.success {
        Ok(())
    } else {
        Err(Error::UnexpectedResponse {
            method,
            path,
            status,
            message: envelope.message,
        })
    }
}

async fn unexpected_response(method: Method, path: String, response: Response) -> Error {
    let status = response.status();
    // error bodies are only used for the log line, a broken one isn't worth failing over
    let message = response
        .json::<Envelope>()
        .await
        .ok()
        .and_then(|envelope| envelope.message);

    Error::UnexpectedResponse {
        method,
        path,
        status,
        message,
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(Error::Configuration(name)),
    }
}
