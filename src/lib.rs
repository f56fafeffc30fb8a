//! Rust Production Request Mapper Library
//!
//! Resolves (virtual host, request path) pairs to registered handlers using
//! servlet-style mapping rules: exact match, longest wildcard prefix,
//! extension match, welcome files, default handler. Lookups are lock-free
//! over copy-on-write snapshots; registrations are serialized per node.

pub mod config;
pub mod mapper;

pub use config::schema::MapperConfig;
pub use mapper::{Mapper, MappingData};
