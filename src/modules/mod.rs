pub mod books;
pub mod storage;
pub mod wishlist;

use catalog_db::Database;
use catalog_kernel::ModuleRegistry;

/// Register the storage core module and every catalog module with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register_core(storage::create_module(db.clone()));
    registry.register_custom(books::create_module(db));
    registry.register_custom(wishlist::create_module(db));
}
