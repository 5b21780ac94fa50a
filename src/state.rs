/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - store: DocumentStore, auth: AuthService
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::{auth::AuthService, store::DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<AuthService>) -> Self {
        Self { store, auth }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend_name())
            .field("auth", &self.auth)
            .finish()
    }
}
