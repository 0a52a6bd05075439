// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const AUTH_LOGIN_ACCEPTED: &str = "auth.login.accepted";
pub const AUTH_LOGIN_REJECTED: &str = "auth.login.rejected";
pub const AUTH_REGISTER: &str = "auth.register";
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_ACTIVE: &str = "session.active";
pub const SESSION_EVICTED: &str = "session.evicted";
