//! Outcome mapping.
//!
//! Translates a capability's result into a normalized [`ResponseEntry`].
//! Three disjoint failure classes exist:
//!
//! - **validation failure** → `400` with one issue record per violation;
//! - **declared operational failure** → the declared status with a single
//!   diagnostic issue;
//! - **unexpected failure** → opaque `500`, no detail leaked.
//!
//! A successful entry copies the handler's status and the `ETag`,
//! `Last-Modified`, and `Location` headers it set, and carries the handler's
//! body as the entry resource. A non-empty body that is not a JSON document
//! is an integrity violation that fails the whole bundle.

use galen_core::bundle::{EntryResponse, OperationOutcome, ResponseEntry};
use galen_core::{GalenError, GalenResult};
use http::Method;

use crate::registry::OperationResponse;

/// Maps a failed entry execution to its response entry.
///
/// Never returns a resource; `outcome` and `resource` are mutually
/// distinguishing.
#[must_use]
pub fn failure_entry(error: &GalenError) -> ResponseEntry {
    let mut response = EntryResponse::new(error.status_code().as_str());
    response.outcome = match error {
        GalenError::Validation {
            message,
            violations,
        } => {
            if violations.is_empty() {
                Some(OperationOutcome::error("exception", message.clone()))
            } else {
                Some(OperationOutcome::from_violations(
                    "exception",
                    violations.clone(),
                ))
            }
        }
        GalenError::Operation { message, .. } => {
            Some(OperationOutcome::error("exception", message.clone()))
        }
        // Unexpected failures stay opaque: status only, no diagnostics
        GalenError::Internal { .. }
        | GalenError::MalformedBundle { .. }
        | GalenError::Integrity { .. } => None,
    };

    ResponseEntry {
        response,
        resource: None,
    }
}

/// Maps an unresolved route to a `404` response entry (strict mode only).
#[must_use]
pub fn not_found_entry(method: &Method, path: &str) -> ResponseEntry {
    let mut response = EntryResponse::new("404");
    response.outcome = Some(OperationOutcome::error(
        "not-found",
        format!("no route registered for {method} {path}"),
    ));
    ResponseEntry {
        response,
        resource: None,
    }
}

/// Maps a successful capability result to its response entry.
///
/// # Errors
///
/// Returns [`GalenError::Integrity`] when the handler body is non-empty but
/// not a JSON document. That is an internal contract violation: it fails the
/// whole bundle processing rather than producing a row-level response.
pub fn success_entry(result: OperationResponse) -> GalenResult<ResponseEntry> {
    let resource = if result.body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&result.body).map_err(|e| {
            GalenError::integrity(format!("handler returned a non-document body: {e}"))
        })?)
    };

    let mut response = EntryResponse::new(result.status.as_str());
    response.etag = result.header("ETag").map(ToString::to_string);
    response.last_modified = result.header("Last-Modified").map(ToString::to_string);
    response.location = result.header("Location").map(ToString::to_string);

    Ok(ResponseEntry { response, resource })
}
