pub mod auth_ctx;
pub mod verified_owner;

pub use auth_ctx::{AuthCtx, AuthSubject};
pub use verified_owner::VerifiedOwner;
