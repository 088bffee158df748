pub mod catalog;

pub use catalog::{default_catalog, Catalog, CatalogError};
