//! Gateway module - discovery caching, proxying, and cache expiry

pub mod discovery;
pub mod proxy;
pub mod sweeper;
