// Polystore MySQL Backend
//
// Relational table storage over sqlx.

pub mod store;

pub use store::MySqlStore;
