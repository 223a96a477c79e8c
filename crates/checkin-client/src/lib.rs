//! checkin-client: Workflows and HTTP backend for face check-in.
//!
//! The admin, identify and register workflows are written against the
//! [`Backend`] trait so they run the same over HTTP and in tests.

pub mod admin;
pub mod backend;
pub mod config;
pub mod identify;
pub mod register;
pub mod selector;

#[cfg(test)]
mod testing;

pub use admin::{AdminError, AdminPanel, Dialog, EventRow, RowAction};
pub use backend::{Backend, BackendError, HttpBackend, RegisterReply};
pub use config::{ClientConfig, ConfigError};
pub use identify::{IdentifyError, IdentifyOutcome, IdentifyWorkflow};
pub use register::{RegisterError, RegisterWorkflow, RegistrationForm};
pub use selector::EventSelector;
