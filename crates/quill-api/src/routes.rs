use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::articles;
use crate::auth::{self, AppState};
use crate::middleware::require_auth;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/article", get(articles::get_all_articles))
        .route("/article/{id}", get(articles::get_article))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/article", post(articles::create_article))
        .route("/article", put(articles::update_article))
        .route("/article/{id}", delete(articles::delete_article))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    // Any origin; browsers send the bearer token explicitly, not as a cookie
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
