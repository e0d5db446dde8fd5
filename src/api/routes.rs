/*
 * Responsibility
 * - URL 構造を定義
 * - 認証が必要な route には requires_auth で permission を付与
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::api::handlers::{
    drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
    fallback::not_found,
    health::health,
};
use crate::api::permissions::{DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS};
use crate::middleware::auth::requires_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(list_drinks).merge(requires_auth(state, POST_DRINKS, post(create_drink))),
        )
        .route(
            "/drinks-detail",
            requires_auth(state, GET_DRINKS_DETAIL, get(list_drinks_detail)),
        )
        .route(
            "/drinks/{id}",
            requires_auth(state, PATCH_DRINKS, patch(update_drink))
                .merge(requires_auth(state, DELETE_DRINKS, delete(delete_drink))),
        )
        .fallback(not_found)
}
