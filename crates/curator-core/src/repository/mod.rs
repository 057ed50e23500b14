//! Storage collaborators.
//!
//! The pipeline only talks to storage through [`Layer0Repository`] and
//! [`Layer2Repository`]; the in-memory implementations back tests and the
//! command line.

mod layer0;
mod layer2;
mod memory;

pub use layer0::Layer0Repository;
pub use layer2::{Layer2Repository, SearchKey, SearchParams};
pub use memory::{MemoryLayer0Repository, MemoryLayer2Repository};
