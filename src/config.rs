use serde::Deserialize;
use url::Url;

const DEFAULT_HABITICA_API: &str = "https://habitica.com/api/v3";

#[derive(Debug, Clone, Deserialize)]
pub struct TaskhookConfig {
    /// Secret configured on the GitHub webhook, used to check `X-Hub-Signature-256`. Requests
    /// are rejected until it is set.
    pub github_secret: Option<String>,
    /// Credentials and endpoint of the Habitica account receiving the tasks
    #[serde(default)]
    pub habitica: HabiticaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HabiticaConfig {
    /// Base URL of the Habitica v3 API
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    /// The account's user ID, sent as `x-api-user`
    pub user_id: Option<String>,
    /// The account's API token, sent as `x-api-key`
    pub api_key: Option<String>,
}

impl Default for HabiticaConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_id: None,
            api_key: None,
        }
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_HABITICA_API).expect("default Habitica URL is valid")
}
