// Polystore Cassandra Backend
//
// Wide-column table storage over the scylla driver (speaks CQL to both
// ScyllaDB and Cassandra clusters).

pub mod store;
mod value;

pub use store::CassandraStore;
