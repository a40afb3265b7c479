pub mod bearer_auth;
pub mod rate_limit;
