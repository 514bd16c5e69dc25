use std::time::Duration;

use tracing::warn;

use quill_db::{Applied, Mutation, MutationQueue};

use crate::error::ApiError;

/// Submits mutations to the queue and waits for their outcome.
///
/// With a timeout configured, a caller that waits too long gets
/// [`ApiError::Unavailable`]. The command is not cancelled; it runs when its
/// turn comes and its result is discarded.
#[derive(Clone)]
pub struct MutationClient {
    queue: MutationQueue,
    timeout: Option<Duration>,
}

impl MutationClient {
    pub fn new(queue: MutationQueue, timeout: Option<Duration>) -> Self {
        Self { queue, timeout }
    }

    pub fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    pub async fn apply(&self, mutation: Mutation) -> Result<Applied, ApiError> {
        let pending = self.queue.submit(mutation).await?;

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, pending.wait()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Gave up waiting on mutation after {:?}", limit);
                    return Err(ApiError::Unavailable);
                }
            },
            None => pending.wait().await,
        };

        Ok(outcome?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;

    #[tokio::test]
    async fn timed_out_caller_gets_unavailable_and_the_write_still_lands() {
        let app = TestApp::new();
        app.seed_article("alice", "first").await;

        // Another connection holds the write lock, so the worker stalls in
        // its busy handler until we commit.
        let blocker = rusqlite::Connection::open(app.db_path()).unwrap();
        blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

        let impatient = MutationClient::new(
            app.state.writes.queue().clone(),
            Some(Duration::from_millis(50)),
        );
        let err = impatient
            .apply(Mutation::CreateArticle {
                owner: "alice".into(),
                text: "slow".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unavailable));

        blocker.execute_batch("COMMIT").unwrap();

        // Queued behind the abandoned command, so it lands first.
        let id = app.seed_article("alice", "after").await;
        let texts: Vec<String> = app
            .state
            .db
            .get_all_articles()
            .unwrap()
            .into_iter()
            .map(|a| a.text)
            .collect();
        assert_eq!(texts, ["first", "slow", "after"]);
        assert_eq!(app.state.db.get_article(id).unwrap().unwrap().text, "after");
    }

    #[tokio::test]
    async fn without_a_timeout_the_outcome_is_returned() {
        let app = TestApp::new();
        let err = app
            .state
            .writes
            .apply(Mutation::DeleteArticle { id: 7 })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("article")));
    }
}
