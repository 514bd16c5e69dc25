use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use tracing::error;

use quill_db::{Database, Mutation};

use crate::error::ApiError;
use crate::mutations::MutationClient;

/// Logins are 5 to 15 bytes of UTF-8.
const LOGIN_LEN: std::ops::Range<usize> = 5..16;
/// Passwords are 8 to 19 bytes of UTF-8.
const PASSWORD_LEN: std::ops::Range<usize> = 8..20;

/// Password verification and account creation.
///
/// Hashes are Argon2id PHC strings with a per-user random salt.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
    writes: MutationClient,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, writes: MutationClient) -> Self {
        Self { db, writes }
    }

    /// `Ok(false)` for an unknown login or a wrong password. Errors only when
    /// the store itself fails.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<bool, ApiError> {
        let db = self.db.clone();
        let login = login.to_string();
        let password = password.to_string();

        // Argon2 is deliberately slow; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let Some(user) = db.get_user_by_login(&login).map_err(ApiError::internal)? else {
                return Ok(false);
            };
            verify_password(&password, &user.password_hash)
        })
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })?
    }

    /// Register a new account and return its id. The duplicate check runs on
    /// the mutation worker, so concurrent registrations of the same login
    /// cannot both succeed.
    pub async fn create_user(&self, login: &str, password: &str) -> Result<i64, ApiError> {
        validate_credentials(login, password)?;

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::internal(e)
            })??;

        let applied = self
            .writes
            .apply(Mutation::CreateUser {
                login: login.to_string(),
                password_hash,
            })
            .await?;

        applied
            .created_id()
            .ok_or_else(|| ApiError::internal("create_user did not report an id"))
    }
}

pub fn validate_credentials(login: &str, password: &str) -> Result<(), ApiError> {
    if !LOGIN_LEN.contains(&login.len()) {
        return Err(ApiError::Invalid(format!(
            "login must be {} to {} bytes",
            LOGIN_LEN.start,
            LOGIN_LEN.end - 1
        )));
    }
    if !PASSWORD_LEN.contains(&password.len()) {
        return Err(ApiError::Invalid(format!(
            "password must be {} to {} bytes",
            PASSWORD_LEN.start,
            PASSWORD_LEN.end - 1
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(ApiError::internal)
}

fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored).map_err(ApiError::internal)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;

    #[test]
    fn length_policy_bounds() {
        assert!(validate_credentials("alice", "password").is_ok());
        assert!(validate_credentials("fifteen_chars_x", "nineteen_characters").is_ok());
        // Multibyte input is measured in bytes: 14 and 17 here.
        assert!(validate_credentials("абвгдеж", "пароль12345").is_ok());

        for (login, password) in [
            ("abcd", "password1"),
            ("sixteen_chars_xx", "password1"),
            ("alice", "short12"),
            ("alice", "twenty_characters_xx"),
            // Eight Cyrillic letters are 16 bytes.
            ("абвгдежз", "password1"),
            ("alice", "парольпароль"),
        ] {
            assert!(matches!(
                validate_credentials(login, password),
                Err(ApiError::Invalid(_))
            ));
        }
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("password1").unwrap();
        let b = hash_password("password1").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify_password("password1", &a).unwrap());
        assert!(verify_password("password1", &b).unwrap());
        assert!(!verify_password("password2", &a).unwrap());
    }

    #[tokio::test]
    async fn authenticate_outcomes() {
        let app = TestApp::new();
        let creds = &app.state.credentials;
        creds.create_user("alice", "password1").await.unwrap();

        assert!(creds.authenticate("alice", "password1").await.unwrap());
        assert!(!creds.authenticate("alice", "password2").await.unwrap());
        assert!(!creds.authenticate("nobody", "password1").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_login_conflicts() {
        let app = TestApp::new();
        let creds = &app.state.credentials;
        creds.create_user("alice", "password1").await.unwrap();

        let err = creds.create_user("alice", "different1").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // The first password still works, the second one never took.
        assert!(creds.authenticate("alice", "password1").await.unwrap());
        assert!(!creds.authenticate("alice", "different1").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_registrations_admit_one_account() {
        let app = TestApp::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let creds = app.state.credentials.clone();
            handles.push(tokio::spawn(async move {
                creds.create_user("alice", &format!("password{i}")).await
            }));
        }

        let mut winners = Vec::new();
        for (i, h) in handles.into_iter().enumerate() {
            match h.await.unwrap() {
                Ok(id) => winners.push((i, id)),
                Err(ApiError::Conflict(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(winners.len(), 1);

        let (i, id) = winners[0];
        let row = app.state.db.get_user_by_login("alice").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert!(app
            .state
            .credentials
            .authenticate("alice", &format!("password{i}"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn invalid_credentials_never_reach_the_queue() {
        let app = TestApp::new();
        app.state.writes.queue().close().await;

        // Would be Unavailable if it had been submitted.
        let err = app.state.credentials.create_user("al", "password1").await.unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
    }
}
