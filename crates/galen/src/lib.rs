//! # Galen
//!
//! **In-process batch/transaction bundle dispatcher for FHIR-style record
//! exchange**
//!
//! Galen lets a caller submit one envelope ("bundle") of HTTP-style
//! sub-requests and receive one envelope of sub-responses, without any
//! sub-request making a real network round trip:
//!
//! - **Route table** - immutable, built once, matched in registration order
//! - **Virtual requests** - synthesized per entry from declarative fields
//! - **Two delivery modes** - `batch` isolates failures per entry;
//!   `transaction` aborts at the first failure and rolls its effects back
//!   through a compensating-action log
//! - **Explicit transaction contexts** - every handler invocation receives
//!   the active context as a parameter; finalized logs go to an injected
//!   archive
//! - **Normalized outcomes** - validation failures, declared operational
//!   failures, and unexpected failures map to structured response entries
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use galen::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let store = ResourceStore::new();
//! let archive = Arc::new(MemoryArchive::new());
//! let dispatcher = BundleDispatcher::new(
//!     demo_route_table(),
//!     demo_registry(&store),
//!     archive.clone(),
//! );
//!
//! let bundle = RequestBundle::transaction()
//!     .entry(BundleEntry::new(EntryRequest::get("Patient/1")))
//!     .entry(BundleEntry::new(EntryRequest::get("Patient/2")));
//!
//! let response = dispatcher.dispatch(bundle).await.unwrap();
//! assert_eq!(response.entry.len(), 2);
//! assert!(archive.logs()[0].committed());
//! # });
//! ```
//!
//! ## Architecture
//!
//! Data flows one way per bundle:
//!
//! ```text
//! RequestBundle → synthesize (per entry) → RouteTable → BundleDispatcher
//!                        (feeds ContextHandle) → outcome mapper → ResponseBundle
//! ```
//!
//! The outer transport, schema validation, and persistence are external
//! collaborators: the dispatcher is handed one already-parsed envelope and
//! returns one envelope document for the transport to serialize.

#![doc(html_root_url = "https://docs.rs/galen/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use galen_core as core;

// Re-export router types
pub use galen_router as router;

// Re-export dispatcher types
pub use galen_dispatch as dispatch;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use galen::prelude::*;
/// ```
pub mod prelude {
    pub use galen_core::bundle::{
        BundleEntry, BundleKind, EntryMethod, EntryRequest, OperationOutcome, RequestBundle,
        ResponseBundle, ResponseBundleKind, ResponseEntry,
    };
    pub use galen_core::transaction::{TransactionLog, TxRecord, TxState};
    pub use galen_core::{
        ContextHandle, GalenError, GalenResult, Headers, MemoryArchive, RequestId, TracingArchive,
        TransactionArchive,
    };

    pub use galen_router::{Params, RouteMatch, RouteTable};

    pub use galen_dispatch::fixtures::{demo_registry, demo_route_table, ResourceStore};
    pub use galen_dispatch::{
        synthesize, BundleDispatcher, DispatcherConfig, OperationRegistry, OperationRequest,
        OperationResponse, ScopeMeta, TransactionFailurePolicy, UnmatchedPolicy, VirtualRequest,
    };
}
