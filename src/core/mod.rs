//! Core module - configuration, schema registry and record stores

pub mod actor;
pub mod config;
pub mod project;
pub mod registry;
pub mod store;

pub use actor::Actor;
pub use config::Config;
pub use project::{Project, ProjectError};
pub use registry::{
    DirectoryRegistry, EntityTypeDefinition, FieldDef, FieldType, SchemaError, SchemaProvider,
    StaticRegistry,
};
pub use store::{CreatedRecord, MemoryStore, RecordStore, SqliteStore, StoreError};
