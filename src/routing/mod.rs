//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     [backends] config section
//!     → table.rs (freeze topic → backend map)
//!     [[routes]] config section
//!     → template.rs (parse path templates, register inbound endpoints)
//!
//! Per job:
//!     topic + substituted path
//!     → RoutingTable::resolve
//!     → absolute backend URL, or NO_ROUTE
//! ```
//!
//! # Design Decisions
//! - Table built once, immutable at runtime, read without locks
//! - Exact topic lookup only; no prefix or regex matching
//! - Placeholder substitution is a string operation done at ingress

pub mod table;
pub mod template;

pub use table::RoutingTable;
pub use template::{PathTemplate, TemplateError};
