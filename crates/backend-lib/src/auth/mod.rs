// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod identity;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod token_generator;
mod service;
mod service_impl;

pub use identity::SessionIdentity;
pub use password::{PasswordHasher, DEFAULT_COST};
pub use rate_limit::LoginLockout;
pub use service::{AuthResult, AuthService, Principal, Registration, RejectReason};
pub use service_impl::DefaultAuth;
pub use session::{
    Session, SessionManager, SessionPayload, ANONYMOUS_TTL, MAX_ANONYMOUS_SESSIONS, SESSION_TTL,
};
