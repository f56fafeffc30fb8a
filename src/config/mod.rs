//! Deployment descriptor subsystem.
//!
//! # Data Flow
//! ```text
//! descriptor file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MapperConfig (validated, immutable)
//!     → builder.rs (allocate handles, populate a Mapper)
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new descriptor
//!     → validation.rs validates
//!     → fresh MapperConfig delivered over a channel
//!     → owner builds a replacement Mapper and swaps it in
//! ```
//!
//! # Design Decisions
//! - A descriptor is immutable once loaded; changes require a full reload
//! - All fields have defaults to allow minimal descriptors
//! - Validation separates syntactic (serde) from semantic checks

pub mod builder;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use builder::{build_mapper, Deployment};
pub use loader::{load_config, ConfigError};
pub use schema::{ContextConfig, HostConfig, MapperConfig, ServletConfig};
