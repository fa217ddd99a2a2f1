//! # nyay-core: Foundational Types
//!
//! Leaf crate of the workspace. Defines the identifier newtypes, the
//! UTC-only [`Timestamp`], and the error hierarchy shared by the state
//! machine, the API service, and the CLI.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `nyay-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Identifiers are newtypes. No bare strings or UUIDs cross crate seams.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{CaseId, UserId};
pub use temporal::Timestamp;
