/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - drinks: DrinkRepo (Postgres / in-memory), auth: AuthGate
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::DrinkRepo;
use crate::services::auth::AuthGate;

#[derive(Clone)]
pub struct AppState {
    pub drinks: Arc<dyn DrinkRepo>,
    pub auth: Arc<AuthGate>,
}

impl AppState {
    pub fn new(drinks: Arc<dyn DrinkRepo>, auth: Arc<AuthGate>) -> Self {
        Self { drinks, auth }
    }
}
