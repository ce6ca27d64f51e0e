//! Rate Limiting
//!
//! Per-client sliding-window request counter gating all API traffic.
//! Pure in-process state: records are created lazily, purged opportunistically
//! on subsequent requests, and never persisted.

mod config;
mod error;
mod limiter;
mod middleware;

pub use config::RateLimitConfig;
pub use error::RateLimitError;
pub use limiter::{Decision, RateLimitStatus, RateLimiter, UNKNOWN_CLIENT};
pub use middleware::RateLimitLayer;

// vim: ts=4
