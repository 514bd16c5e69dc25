use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Identity token claims. `sub` carries the caller's login; `iat` and `exp`
/// are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// -- Articles --

/// Extra fields (`author`, `user_id`) are ignored; the owner always comes
/// from the bearer token.
#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub id: i64,
    pub text: String,
}

// -- Envelopes --

/// Returned by endpoints that create a row.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Body for errors and for successes that carry no payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub code: u16,
    pub message: String,
}
