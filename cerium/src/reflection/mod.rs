mod assembly;
mod attributes;
mod members;
mod module;
mod types;
pub mod token;

pub use assembly::*;
pub use attributes::*;
pub use members::*;
pub use module::*;
pub use types::*;
