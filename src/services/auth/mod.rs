pub mod access_jwt;
pub mod factory;

pub use access_jwt::{AccessTokenClaims, AuthService, VerificationKey};
pub use factory::build_auth_service;
