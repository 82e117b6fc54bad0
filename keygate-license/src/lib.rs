//! License key validation for keygate.
//!
//! Keys are validated in one of two modes:
//! - **Encrypted**: the key is a sealed payload opened with a configured
//!   [`DecryptCapability`] and checked in place.
//! - **Registry**: the key is an opaque token looked up in a
//!   [`RegistrySnapshot`] of issued licenses.
//!
//! # Design Principles
//!
//! - **Explicit mode**: the mode follows from the [`EngineConfig`] alone and
//!   is reported by [`ValidationEngine::describe_config`]. Encrypted mode wins
//!   when both capabilities exist, and a failed decode never falls through to
//!   the registry.
//! - **Errors as data**: [`ValidationEngine::validate`] returns a
//!   [`ValidationOutcome`] for any input and keeps every rejection reason
//!   distinct.
//! - **Read-only**: the engine never writes usage counts. See
//!   [`ValidationEngine`] for what integrators must do instead.
//!
//! # Known limitation
//!
//! Encrypted keys carry their own usage count and status from the moment
//! they were sealed. Replaying an old key validates against that snapshot.

mod config;
mod engine;
mod error;
mod info;
mod record;
mod registry;
mod strategy;

pub use config::{DEFAULT_SALT, ValidatorConfig};
pub use engine::{ActiveMode, ConfigDescription, EngineConfig, ValidationEngine, ValidationOutcome};
pub use error::{DecodeError, LicenseError, LicenseResult, ValidationError};
pub use info::{EXPIRY_FORMAT, NEVER_EXPIRES, RemainingUses, ValidSummary, project};
pub use record::{EntitlementRecord, LicenseStatus, WIRE_UNBOUNDED};
pub use registry::RegistrySnapshot;
pub use strategy::{DecodeStrategy, DecryptCapability, EncryptedDecode, RegistryLookup};
