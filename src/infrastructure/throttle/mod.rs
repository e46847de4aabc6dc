//! Throttle infrastructure
//!
//! Fixed-window request counting shared by every guarded route.

mod limiter;

pub use limiter::ThrottleLimiter;
