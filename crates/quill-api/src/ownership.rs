use std::sync::Arc;

use tracing::error;

use quill_db::Database;

use crate::error::ApiError;
use crate::token::Identity;

/// Answers whether a login owns an article. Must be consulted before an
/// update or delete is submitted; the mutation queue does not re-check.
#[derive(Clone)]
pub struct OwnershipChecker {
    db: Arc<Database>,
}

impl OwnershipChecker {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn owns(&self, article_id: i64, login: &str) -> Result<bool, ApiError> {
        let db = self.db.clone();
        let login = login.to_string();
        tokio::task::spawn_blocking(move || db.owns_article(article_id, &login))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::internal(e)
            })?
            .map_err(ApiError::internal)
    }

    /// [`ApiError::Forbidden`] unless `identity` owns the article. A missing
    /// article is also forbidden, so callers learn nothing about articles
    /// that are not theirs.
    pub async fn require(&self, article_id: i64, identity: &Identity) -> Result<(), ApiError> {
        if self.owns(article_id, &identity.login).await? {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
