//! # Galen Core
//!
//! Core types for the Galen bundle dispatcher.
//!
//! This crate provides the foundational types used throughout Galen:
//!
//! - [`bundle`] - Request/response envelope data model and operation outcomes
//! - [`RequestId`] - UUID v7 request identifier
//! - [`GalenError`] - Standard error taxonomy with status-code mapping
//! - [`Headers`] - Small-vector header storage with case-insensitive lookup
//! - [`transaction`] - Transaction contexts, compensations, and the archive

#![doc(html_root_url = "https://docs.rs/galen-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bundle;
mod context;
mod error;
mod headers;
pub mod transaction;

pub use bundle::{
    BundleEntry, BundleKind, EntryMethod, EntryRequest, EntryResponse, OperationOutcome,
    OutcomeIssue, RequestBundle, ResponseBundle, ResponseBundleKind, ResponseEntry,
};
pub use context::RequestId;
pub use error::{GalenError, GalenResult};
pub use headers::Headers;
pub use transaction::{ContextHandle, MemoryArchive, TracingArchive, TransactionArchive};
