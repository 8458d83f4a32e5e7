//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → routing table, policies, worker pool built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DispatchConfig, GatewayConfig, IdentityConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, RouteConfig, ThrottleConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
