/// Redis client utilities
///
/// The session store and the tenant registry share one Redis deployment;
/// this module owns the connection handling for both.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
