//! Configuration: application settings and entity definitions

pub mod app;
pub mod entities;

pub use app::AppConfig;
pub use entities::{EntityCatalog, EntityDefinition};
