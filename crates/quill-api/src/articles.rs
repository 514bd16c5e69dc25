use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};

use quill_db::Mutation;
use quill_types::api::{CreateArticleRequest, CreatedResponse, StatusResponse, UpdateArticleRequest};
use quill_types::models::Article;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::token::Identity;

fn ok_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        code: StatusCode::OK.as_u16(),
        message: "ok".into(),
    })
}

pub async fn get_all_articles(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.get_all_articles())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })?
        .map_err(ApiError::internal)?;

    let articles: Vec<Article> = rows.into_iter().map(Article::from).collect();
    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_article(id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })?
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("article"))?;

    Ok(Json(Article::from(row)))
}

pub async fn create_article(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("CreateArticle started for {}", identity.login);

    let applied = state
        .writes
        .apply(Mutation::CreateArticle {
            owner: identity.login,
            text: req.text,
        })
        .await?;
    let id = applied
        .created_id()
        .ok_or_else(|| ApiError::internal("create_article did not report an id"))?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn update_article(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<UpdateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("UpdateArticle started for {} by {}", req.id, identity.login);

    state.ownership.require(req.id, &identity).await?;
    state
        .writes
        .apply(Mutation::UpdateArticle {
            id: req.id,
            text: req.text,
        })
        .await?;

    Ok(ok_status())
}

pub async fn delete_article(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    info!("DeleteArticle started for {} by {}", id, identity.login);

    state.ownership.require(id, &identity).await?;
    state.writes.apply(Mutation::DeleteArticle { id }).await?;

    Ok(ok_status())
}
