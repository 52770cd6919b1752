use rocket::{catchers, routes, Build, Rocket};

use crate::config::TaskhookConfig;

pub mod github;
use github::{github_webhook, GitHubSecret, Tracker};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the webhook server from the configuration. Listening address and port come from
/// Rocket's own configuration.
pub fn server(config: &TaskhookConfig) -> anyhow::Result<Rocket<Build>> {
    let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

    Ok(rocket::build()
        .mount("/", routes![github_webhook])
        .register("/", catchers![forbidden])
        .manage(GitHubSecret(config.github_secret.clone()))
        .manage(Tracker {
            http,
            config: config.habitica.clone(),
        }))
}

/// Rejected deliveries get an empty body, not Rocket's HTML error page.
#[rocket::catch(403)]
fn forbidden() {}
