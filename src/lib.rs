// Main library entry point for declsmith.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod generator;
pub mod infrastructure;
pub mod ports;

pub use application::{SyncDeclaration, SyncOutcome, SyncReport};
pub use domain::declaration::{DeclarationKind, DeclarationSpec, MemberSpec};
pub use error::{Result, SyncError};
