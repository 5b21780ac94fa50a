/*
 * Responsibility
 * - Handler / guard から見える「認証済みコンテキスト」の型
 * - middleware が token を検証して request extensions に格納する
 *
 * Notes
 * - JWT の検証ロジックは services/auth 側の責務
 * - subject が無い token も格納される (拒否は ownership guard が行う)
 */
use crate::services::auth::AccessTokenClaims;

/// 認証済みのリクエストに付与されるコンテキスト
#[derive(Debug, Clone)]
pub struct AuthCtx {
    claims: AccessTokenClaims,
}

impl AuthCtx {
    pub fn new(claims: AccessTokenClaims) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims.subject()
    }
}
