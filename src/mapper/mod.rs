//! Host and path resolution subsystem.
//!
//! # Data Flow
//! ```text
//! map(host, uri, version)
//!     → host stage (case-insensitive lookup, default-host fallback)
//!     → context stage (longest prefix via nesting-bounded backward walk)
//!     → version selection (explicit label, or lexicographically last)
//!     → wrapper stage (exact → wildcard → extension → welcome files → default)
//!     → MappingData (unset fields = no match)
//!
//! Registration (at deploy time):
//!     add_host / add_context_version / add_wrapper / add_welcome_file
//!     → build new sorted snapshot under the smallest enclosing lock
//!     → publish with a single pointer swap
//! ```
//!
//! # Design Decisions
//! - Every array a lookup reads is an immutable snapshot; readers never lock
//! - Duplicate or dangling registrations log an error and change nothing
//! - Not-found is a normal outcome signaled by unset output fields, never an
//!   error

pub mod mapping_data;
pub mod resources;

mod registry;
mod resolve;
mod sorted;
mod types;

pub use mapping_data::MappingData;
pub use registry::{HostInfo, Mapper, WrapperMapping};
pub use types::{ContextHandle, HostHandle, WrapperHandle};
