pub mod catalog;
pub mod engine;
pub mod grants;

pub use catalog::{CatalogError, ToolCatalog};
pub use engine::evaluate;
pub use grants::SessionGrantStore;
