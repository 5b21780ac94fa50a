//! access token (JWT) 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization` ヘッダが無い request はそのまま通す (拒否は ownership guard の仕事)
//! - ヘッダがあるのに `Bearer <jwt>` として検証できない場合は 401 で打ち切る
//! - 署名検証 + exp / iss / aud は AuthService 側で実施

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// data routes に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let api = api::routes(&state);
/// let api = middleware::auth::access::apply(api, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = auth
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::warn!("malformed Authorization header");
            AppError::Unauthorized
        })?;

    let claims = match state.auth.verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(sub = ?claims.subject(), "access token verified");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}
