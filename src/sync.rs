//! Mirrors pull request lifecycle onto Habitica to-dos.
//!
//! Habitica has no compare-and-swap, so the upsert is a lookup by alias followed by a create or a
//! score. Two deliveries of the same event racing each other can both see the task as missing
//! and create it twice.

use std::fmt::Display;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::Result,
    habitica::{Direction, NewTask, Priority, TaskKind},
    webhooks::github::PullRequestEvent,
};

const MAX_TITLE_LENGTH: usize = 72;

/// Operations the mapper needs from the task tracker.
#[rocket::async_trait]
pub trait TaskTracker {
    async fn task_exists(&self, alias: &TaskAlias) -> Result<bool>;
    async fn create_task(&self, task: &NewTask) -> Result<()>;
    async fn score_task(&self, alias: &TaskAlias, direction: Direction) -> Result<()>;
}

/// Identifier of the task mirroring a pull request, shared by every event about that PR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskAlias(String);

impl TaskAlias {
    pub fn for_pull_request(owner: &str, repo: &str, number: u64) -> Self {
        Self(format!("github__{}-{}-{}", owner, repo, number).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(TaskAlias),
    AlreadySynced(TaskAlias),
    Completed(TaskAlias),
    NothingToComplete(TaskAlias),
    Ignored,
}

impl Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Created(alias) => write!(f, "created task {}", alias),
            SyncOutcome::AlreadySynced(alias) => write!(f, "task {} was already there", alias),
            SyncOutcome::Completed(alias) => write!(f, "completed task {}", alias),
            SyncOutcome::NothingToComplete(alias) => write!(f, "no task {} to complete", alias),
            SyncOutcome::Ignored => f.write_str("nothing to do"),
        }
    }
}

pub async fn sync_pull_request<T>(tracker: &T, event: &PullRequestEvent) -> Result<SyncOutcome>
where
    T: TaskTracker + Sync + ?Sized,
{
    let repository = &event.repository;
    let pr = &event.pull_request;

    match event.action.as_str() {
        "opened" => {
            let alias = alias_for(event);
            if tracker.task_exists(&alias).await? {
                info!("task {} already exists, nothing to do", alias);
                return Ok(SyncOutcome::AlreadySynced(alias));
            }

            let task = NewTask {
                alias: alias.clone(),
                kind: TaskKind::Todo,
                text: format!(
                    "[{}#{}]({}) {}",
                    repository.full_name,
                    pr.number,
                    pr.html_url,
                    shorten(&pr.title)
                ),
                notes: format!("opened by @{}", pr.user.login),
                priority: priority_for(event),
            };
            tracker.create_task(&task).await?;
            info!("created task {} with priority {:?}", alias, task.priority);

            Ok(SyncOutcome::Created(alias))
        }

        "closed" => {
            let alias = alias_for(event);
            if !tracker.task_exists(&alias).await? {
                info!("no task {} to complete, nothing to do", alias);
                return Ok(SyncOutcome::NothingToComplete(alias));
            }

            tracker.score_task(&alias, Direction::Up).await?;
            info!("completed task {}", alias);

            Ok(SyncOutcome::Completed(alias))
        }

        action => {
            debug!(
                "ignoring action `{}` on {}#{}",
                action, repository.full_name, pr.number
            );
            Ok(SyncOutcome::Ignored)
        }
    }
}

fn alias_for(event: &PullRequestEvent) -> TaskAlias {
    TaskAlias::for_pull_request(
        &event.repository.owner.login,
        &event.repository.name,
        event.pull_request.number,
    )
}

/// PRs on our own repositories weigh more than the ones we're asked to look at elsewhere.
pub fn priority_for(event: &PullRequestEvent) -> Priority {
    // GitHub logins are case-insensitive
    let author = &event.pull_request.user.login;
    if author.eq_ignore_ascii_case(&event.repository.owner.login) {
        Priority::Medium
    } else {
        Priority::Easy
    }
}

fn shorten(content: &str) -> String {
    if content.chars().count() <= MAX_TITLE_LENGTH {
        content.to_owned()
    } else {
        content.chars().take(MAX_TITLE_LENGTH).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Mutex};

    use serde_json::json;

    use super::*;
    use crate::error::Error;

    /// In-memory tracker recording every call it receives.
    #[derive(Default)]
    struct FakeTracker {
        tasks: Mutex<HashSet<TaskAlias>>,
        created: Mutex<Vec<NewTask>>,
        scored: Mutex<Vec<(TaskAlias, Direction)>>,
        lookups: Mutex<usize>,
        fail_lookups: bool,
    }

    impl FakeTracker {
        fn with_task(alias: TaskAlias) -> Self {
            let tracker = Self::default();
            tracker.tasks.lock().unwrap().insert(alias);
            tracker
        }

        fn failing() -> Self {
            Self {
                fail_lookups: true,
                ..Self::default()
            }
        }
    }

    #[rocket::async_trait]
    impl TaskTracker for FakeTracker {
        async fn task_exists(&self, alias: &TaskAlias) -> Result<bool> {
            *self.lookups.lock().unwrap() += 1;
            if self.fail_lookups {
                return Err(Error::Configuration("habitica.api_key"));
            }
            Ok(self.tasks.lock().unwrap().contains(alias))
        }

        async fn create_task(&self, task: &NewTask) -> Result<()> {
            self.tasks.lock().unwrap().insert(task.alias.clone());
            self.created.lock().unwrap().push(task.clone());
            Ok(())
        }

        async fn score_task(&self, alias: &TaskAlias, direction: Direction) -> Result<()> {
            self.scored.lock().unwrap().push((alias.clone(), direction));
            Ok(())
        }
    }

    fn pull_request_event(action: &str, author: &str) -> PullRequestEvent {
        serde_json::from_value(json!({
            "action": action,
            "number": 42,
            "repository": {
                "name": "Widgets",
                "full_name": "Acme/Widgets",
                "html_url": "https://github.com/Acme/Widgets",
                "owner": { "login": "Acme", "id": 1 },
            },
            "pull_request": {
                "number": 42,
                "title": "Make widgets spin faster",
                "html_url": "https://github.com/Acme/Widgets/pull/42",
                "user": { "login": author, "id": 2 },
            },
            "sender": { "login": author, "id": 2 },
        }))
        .unwrap()
    }

    #[test]
    fn alias_is_lowercase_and_deterministic() {
        let alias = TaskAlias::for_pull_request("Acme", "Widgets", 42);
        assert_eq!(alias.as_str(), "github__acme-widgets-42");
        assert_eq!(alias, TaskAlias::for_pull_request("ACME", "wIdGeTs", 42));
        assert_ne!(alias, TaskAlias::for_pull_request("Acme", "Widgets", 43));
    }

    #[test]
    fn own_pull_requests_get_medium_priority() {
        assert_eq!(
            priority_for(&pull_request_event("opened", "Acme")),
            Priority::Medium
        );
        assert_eq!(
            priority_for(&pull_request_event("opened", "acme")),
            Priority::Medium
        );
        assert_eq!(
            priority_for(&pull_request_event("opened", "someone-else")),
            Priority::Easy
        );
    }

    #[test]
    fn long_titles_are_shortened() {
        let title = "é".repeat(100);
        let short = shorten(&title);
        assert_eq!(short.chars().count(), MAX_TITLE_LENGTH + 1);
        assert!(short.ends_with('…'));
        assert_eq!(shorten("short"), "short");
    }

    #[tokio::test]
    async fn opened_creates_the_task() {
        let tracker = FakeTracker::default();

        let outcome = sync_pull_request(&tracker, &pull_request_event("opened", "Acme"))
            .await
            .unwrap();

        let alias = TaskAlias::for_pull_request("acme", "widgets", 42);
        assert_eq!(outcome, SyncOutcome::Created(alias.clone()));

        let created = tracker.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].alias, alias);
        assert_eq!(created[0].kind, TaskKind::Todo);
        assert_eq!(created[0].priority, Priority::Medium);
        assert_eq!(
            created[0].text,
            "[Acme/Widgets#42](https://github.com/Acme/Widgets/pull/42) Make widgets spin faster"
        );
        assert_eq!(created[0].notes, "opened by @Acme");
    }

    #[tokio::test]
    async fn opened_twice_creates_once() {
        let tracker = FakeTracker::default();
        let event = pull_request_event("opened", "someone-else");

        let first = sync_pull_request(&tracker, &event).await.unwrap();
        let second = sync_pull_request(&tracker, &event).await.unwrap();

        let alias = TaskAlias::for_pull_request("acme", "widgets", 42);
        assert_eq!(first, SyncOutcome::Created(alias.clone()));
        assert_eq!(second, SyncOutcome::AlreadySynced(alias));
        assert_eq!(tracker.created.lock().unwrap().len(), 1);
        assert_eq!(tracker.created.lock().unwrap()[0].priority, Priority::Easy);
    }

    #[tokio::test]
    async fn closed_scores_an_existing_task() {
        let alias = TaskAlias::for_pull_request("acme", "widgets", 42);
        let tracker = FakeTracker::with_task(alias.clone());

        let outcome = sync_pull_request(&tracker, &pull_request_event("closed", "Acme"))
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Completed(alias.clone()));
        assert_eq!(*tracker.scored.lock().unwrap(), vec![(alias, Direction::Up)]);
        assert!(tracker.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_without_task_does_nothing() {
        let tracker = FakeTracker::default();

        let outcome = sync_pull_request(&tracker, &pull_request_event("closed", "Acme"))
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::NothingToComplete(_)));
        assert!(tracker.scored.lock().unwrap().is_empty());
        assert!(tracker.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_actions_are_ignored() {
        let tracker = FakeTracker::default();

        for action in ["edited", "reopened", "synchronize", "labeled"] {
            let outcome = sync_pull_request(&tracker, &pull_request_event(action, "Acme"))
                .await
                .unwrap();
            assert_eq!(outcome, SyncOutcome::Ignored);
        }

        assert_eq!(*tracker.lookups.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_lookup_stops_the_upsert() {
        let tracker = FakeTracker::failing();

        let result = sync_pull_request(&tracker, &pull_request_event("opened", "Acme")).await;

        assert!(matches!(result, Err(Error::Configuration(_))));
        assert!(tracker.created.lock().unwrap().is_empty());
    }
}
