//! Bundle dispatcher for Galen.
//!
//! This crate is the engine behind the batch/transaction bundle pattern:
//! it resolves each sub-request of one envelope against an immutable route
//! table, synthesizes an in-process virtual request (no transport socket),
//! executes the resolved operation capabilities strictly in declared order
//! under an explicit transaction context, and assembles the index-aligned
//! response envelope.
//!
//! # Components
//!
//! - [`synthesize`] - declarative entry → [`VirtualRequest`] (pure)
//! - [`OperationRegistry`] - async operation capabilities, type-erased
//! - [`BundleDispatcher`] - sequential executor with mode-specific failure
//!   policy (`batch` isolates failures, `transaction` aborts and rolls back)
//! - [`outcome`] - maps results and the three failure classes to entries
//! - [`DispatcherConfig`] - strictness and atomicity policy switches
//! - [`fixtures`] - CRUD stubs and an in-memory store for tests and demos

#![doc(html_root_url = "https://docs.rs/galen-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatcher;
pub mod fixtures;
pub mod outcome;
mod registry;
mod synth;

pub use config::{
    DispatcherConfig, DispatcherConfigBuilder, ScopeMeta, TransactionFailurePolicy,
    UnmatchedPolicy,
};
pub use dispatcher::BundleDispatcher;
pub use registry::{
    BoxedOperationFuture, ErasedOperation, OperationRegistry, OperationRequest, OperationResponse,
};
pub use synth::{synthesize, VirtualRequest, FHIR_JSON};
