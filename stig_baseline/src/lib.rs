// Internal modules
pub mod ansible;
pub mod benchmark;
pub mod packaging;
pub mod scap;
pub mod selection;
pub mod synthesis;
pub mod tree;
pub mod validation;

// Re-export key types for library consumers
pub use benchmark::{Benchmark, Group, ParseError, Profile, Select};
pub use selection::{Preference, SelectionEngine, SelectionError};
pub use synthesis::{RationaleItem, RationaleRecord};
