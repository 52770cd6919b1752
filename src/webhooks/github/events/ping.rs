use serde::Deserialize;

use crate::webhooks::github::events::Repository;

/// Sent once by GitHub when the webhook is created.
#[derive(Debug, Deserialize)]
pub struct PingEvent {
    pub zen: String,
    pub hook_id: Option<u64>,
    pub repository: Option<Repository>,
}
