//! Book catalog application library
//!
//! Catalog and wishlist modules plus the bootstrap that wires them to the
//! document store and HTTP server.

pub mod bootstrap;
pub mod modules;
pub mod utils;

pub use bootstrap::App;
pub use modules::register_all;
