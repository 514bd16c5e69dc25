pub mod articles;
pub mod auth;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod mutations;
pub mod ownership;
pub mod routes;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    use chrono::TimeDelta;
    use tempfile::TempDir;

    use quill_db::writer::DEFAULT_QUEUE_CAPACITY;
    use quill_db::{Database, Mutation, MutationQueue};

    use crate::auth::{AppState, AppStateInner};
    use crate::token::TokenService;

    pub const TEST_SECRET: &str = "test-secret";

    /// App state over a throwaway database. The temp dir lives as long as
    /// this value.
    pub struct TestApp {
        pub state: AppState,
        db_path: PathBuf,
        _dir: TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db_path = dir.path().join("quill.db");
            let (db, writer) = Database::open(&db_path).unwrap();
            let queue = MutationQueue::start(writer, DEFAULT_QUEUE_CAPACITY).unwrap();
            let tokens = TokenService::new(TEST_SECRET, TimeDelta::hours(1));
            Self {
                state: AppStateInner::new(db, queue, tokens, None),
                db_path,
                _dir: dir,
            }
        }

        pub fn db_path(&self) -> &Path {
            &self.db_path
        }

        /// Registers `owner` (password `password1`) if needed and creates an
        /// article for them.
        pub async fn seed_article(&self, owner: &str, text: &str) -> i64 {
            if self.state.db.get_user_by_login(owner).unwrap().is_none() {
                self.state
                    .credentials
                    .create_user(owner, "password1")
                    .await
                    .unwrap();
            }
            self.state
                .writes
                .apply(Mutation::CreateArticle {
                    owner: owner.into(),
                    text: text.into(),
                })
                .await
                .unwrap()
                .created_id()
                .unwrap()
        }
    }
}
