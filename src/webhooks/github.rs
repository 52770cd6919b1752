use anyhow::anyhow;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use tracing::{debug, info, trace, warn};

mod events;
pub use events::*;

mod signing;
use signing::SignedGitHubPayload;

use crate::{
    config::HabiticaConfig,
    error::Result,
    habitica::HabiticaClient,
    sync::sync_pull_request,
};

const X_GITHUB_EVENT: &str = "X-GitHub-Event";

pub struct GitHubSecret(pub Option<String>);

/// What a request needs to talk to Habitica. The credentials are only checked when a request
/// actually has something to sync.
pub struct Tracker {
    pub http: reqwest::Client,
    pub config: HabiticaConfig,
}

/// Once the payload is verified the answer is always 200, even if syncing failed: GitHub
/// redelivers on anything else, and creating or scoring a task twice is worse than missing one.
#[rocket::post("/api/webhooks/github", data = "<payload>")]
pub async fn github_webhook(
    event: Option<GitHubEventType>,
    tracker: &State<Tracker>,
    payload: SignedGitHubPayload,
) {
    trace!("received verified {:?} event", event);

    if let Err(e) = handle_github_event(event, &payload.0, tracker).await {
        warn!("encountered error while handling GitHub event: {}", e);
    }
}

async fn handle_github_event(
    event: Option<GitHubEventType>,
    payload: &[u8],
    tracker: &Tracker,
) -> Result<()> {
    match event {
        Some(GitHubEventType::PullRequest) => {
            let event: PullRequestEvent = serde_json::from_slice(payload)?;
            let client = HabiticaClient::new(tracker.http.clone(), &tracker.config)?;

            let outcome = sync_pull_request(&client, &event).await?;
            info!(
                "{}#{} {}: {}",
                event.repository.full_name, event.pull_request.number, event.action, outcome
            );
        }

        Some(GitHubEventType::Ping) => {
            let ping: PingEvent = serde_json::from_slice(payload)?;
            info!(
                "webhook {:?} set up on {}: {}",
                ping.hook_id,
                ping.repository
                    .as_ref()
                    .map_or("an organization", |repo| repo.full_name.as_str()),
                ping.zen
            );
        }

        Some(GitHubEventType::Other(event_type)) => {
            debug!("ignoring `{}` event", event_type)
        }

        None => debug!("ignoring event without a single {} header", X_GITHUB_EVENT),
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum GitHubEventType {
    PullRequest,
    Ping,
    Other(String),
}

impl From<&str> for GitHubEventType {
    fn from(event_type: &str) -> Self {
        match event_type {
            "pull_request" => GitHubEventType::PullRequest,
            "ping" => GitHubEventType::Ping,
            other => GitHubEventType::Other(other.to_owned()),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GitHubEventType {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let event_types = request.headers().get(X_GITHUB_EVENT).collect::<Vec<_>>();
        if event_types.len() != 1 {
            return Outcome::Error((
                Status::BadRequest,
                anyhow!("request header needs exactly one event type"),
            ));
        }

        Outcome::Success(GitHubEventType::from(event_types[0]))
    }
}
