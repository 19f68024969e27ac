pub mod module;
pub mod registry;
pub mod settings;

pub use catalog_db::{Migration, Schema};
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
