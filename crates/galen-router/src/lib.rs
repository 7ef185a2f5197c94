//! Route table and path matching for the Galen bundle dispatcher.
//!
//! This crate resolves virtual sub-requests against an immutable table of
//! (method, path pattern) registrations, extracting named path parameters.
//! The table is assembled once at startup and scanned in registration order;
//! the first full match wins.
//!
//! # Example
//!
//! ```rust
//! use galen_router::RouteTable;
//! use http::Method;
//!
//! let table = RouteTable::builder()
//!     .route(Method::GET, "/{resourceType}/{id}", "read")
//!     .route(Method::POST, "/{resourceType}", "create")
//!     .route(Method::PUT, "/{resourceType}/{id}", "update")
//!     .build();
//!
//! let m = table.match_route(&Method::GET, "/Patient/1").unwrap();
//! assert_eq!(m.operation_id(), "read");
//! assert_eq!(m.params().get("id"), Some("1"));
//!
//! // No registration for PATCH; the caller decides what a miss means
//! assert!(table.match_route(&Method::PATCH, "/Patient/1").is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/galen-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod table;

pub use params::Params;
pub use table::{RouteMatch, RouteTable, RouteTableBuilder};
