// Polystore Redis Backend
//
// Key-value storage and publish/subscribe over the redis crate.

pub mod store;

pub use store::RedisStore;
