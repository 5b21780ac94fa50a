/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::auth::{AuthService, access_jwt::AccessJwtError};

pub fn build_auth_service(config: &AuthConfig) -> Result<Arc<AuthService>, AccessJwtError> {
    let auth = AuthService::new(
        config.algorithm,
        &config.key,
        config.issuer.as_deref(),
        config.audience.as_deref(),
        config.leeway_seconds,
    )?;

    Ok(Arc::new(auth))
}
