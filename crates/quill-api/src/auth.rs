use std::sync::Arc;
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use quill_db::{Database, MutationQueue};
use quill_types::api::{CreatedResponse, LoginRequest, LoginResponse, RegisterRequest};

use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::mutations::MutationClient;
use crate::ownership::OwnershipChecker;
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

/// Everything the handlers need, built once at startup.
pub struct AppStateInner {
    /// Read side only. Writes go through `writes`.
    pub db: Arc<Database>,
    pub writes: MutationClient,
    pub tokens: TokenService,
    pub credentials: CredentialStore,
    pub ownership: OwnershipChecker,
}

impl AppStateInner {
    pub fn new(
        db: Database,
        queue: MutationQueue,
        tokens: TokenService,
        write_timeout: Option<Duration>,
    ) -> AppState {
        let db = Arc::new(db);
        let writes = MutationClient::new(queue, write_timeout);
        Arc::new(Self {
            credentials: CredentialStore::new(db.clone(), writes.clone()),
            ownership: OwnershipChecker::new(db.clone()),
            db,
            writes,
            tokens,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Register started for {}", req.login);

    let id = state.credentials.create_user(&req.login, &req.password).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Login attempt for {}", req.login);

    if !state.credentials.authenticate(&req.login, &req.password).await? {
        return Err(ApiError::Unauthenticated);
    }

    let token = state.tokens.issue(&req.login)?;
    Ok(Json(LoginResponse { token }))
}
