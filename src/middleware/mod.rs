/*
 * Responsibility
 * - middleware の公開インターフェース
 * - cors::apply / http::apply (Router 全体), auth::requires_auth (route 単位)
 */
pub mod auth;
pub mod cors;
pub mod http;
