// src/core/mod.rs

pub mod client;
pub mod html;
pub mod net;
pub mod retry;
pub mod sanitize;
pub mod throttle;

pub use client::RateLimitedClient;
pub use throttle::{SharedThrottle, Throttle};
