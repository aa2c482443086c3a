//! An experimental pickler for CLI-style object graphs.
//!
//! An arbitrary root value and everything transitively reachable from it,
//! including reflection entities and dynamically emitted metadata with IL
//! bodies, is written into a self-describing binary stream. Heap identity
//! is preserved through position memoization, and definition cycles are
//! broken by deferring bodies onto a trailer stack.

pub mod errors;
pub mod il;
pub mod reflection;
pub mod ser;
pub mod signature;
pub mod values;
pub mod wire;

mod utilities;

pub use errors::PickleError;
pub use ser::{AssemblyPickleMode, Factory, Pickler, Reducer, ReducerRegistry, Reduction};
pub use values::Value;
