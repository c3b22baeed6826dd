// Polystore Storage Layer
//
// Capability contracts shared by every backend, the parameterized
// statement builder, the detached-execution shim and an in-memory
// reference backend.

pub mod background;
pub mod memory;
pub mod statement;
pub mod traits;

pub use background::Detached;
pub use memory::MemoryStore;
pub use statement::{Dialect, Statement};
pub use traits::*;
