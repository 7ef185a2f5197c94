//! Operation registration and invocation.
//!
//! This module provides the infrastructure for registering and invoking the
//! async operation capabilities the route table dispatches to.
//!
//! # Architecture
//!
//! Operations in Galen are:
//!
//! - **Async**: every capability is an async function
//! - **Context-explicit**: each invocation receives the active transaction
//!   context as an explicit parameter, never through ambient state
//! - **Route-bound**: each capability is registered under the operation ID
//!   the route table resolves to
//!
//! # Example
//!
//! ```rust
//! use galen_dispatch::{OperationRegistry, OperationRequest, OperationResponse};
//! use galen_core::{ContextHandle, GalenError};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! async fn read(
//!     request: OperationRequest,
//!     _ctx: ContextHandle,
//! ) -> Result<OperationResponse, GalenError> {
//!     let resource_type = request.param("resourceType").unwrap_or_default().to_string();
//!     let id = request.param("id").unwrap_or_default().to_string();
//!     OperationResponse::json(
//!         StatusCode::OK,
//!         &json!({"resourceType": resource_type, "id": id}),
//!     )
//! }
//!
//! let mut registry = OperationRegistry::new();
//! registry.register("read", read);
//! assert!(registry.contains("read"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use galen_core::{ContextHandle, GalenError, GalenResult, Headers, RequestId};
use galen_router::Params;

/// The request descriptor an operation capability receives.
///
/// Carries everything extracted from the virtual request: path parameters,
/// query, headers, and body bytes, plus the top-level request ID for log
/// correlation.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// ID of the top-level bundle request this entry belongs to.
    pub request_id: RequestId,
    /// Operation ID the route table resolved to.
    pub operation_id: String,
    /// Rooted request path.
    pub path: String,
    /// Path parameters extracted by the route table.
    pub params: Params,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// Synthesized request headers.
    pub headers: Headers,
    /// Request body bytes; empty when the entry carried no resource.
    pub body: Bytes,
}

impl OperationRequest {
    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns a request header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Deserializes the body as a JSON document.
    ///
    /// Returns `None` for an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`GalenError::Validation`] when the body is present but not a
    /// well-formed document.
    pub fn json_body(&self) -> GalenResult<Option<Value>> {
        if self.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&self.body)
            .map(Some)
            .map_err(|e| GalenError::validation_with("malformed request body", vec![e.to_string()]))
    }
}

/// The result an operation capability returns on success.
#[derive(Debug, Clone)]
pub struct OperationResponse {
    /// HTTP-style status code.
    pub status: StatusCode,
    /// Response header subset (`Location`, `ETag`, `Last-Modified`, ...).
    pub headers: Headers,
    /// Response body bytes; when non-empty, must be a JSON document.
    pub body: Bytes,
}

impl OperationResponse {
    /// Creates a response with the given status and no body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a `204 No Content` response.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Creates a response with a JSON document body.
    ///
    /// # Errors
    ///
    /// Returns [`GalenError::Internal`] if the value cannot be serialized.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> GalenResult<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| GalenError::internal_with_source("response body serialization failed", e))?;
        Ok(Self {
            status,
            headers: Headers::new(),
            body: Bytes::from(bytes),
        })
    }

    /// Adds or replaces a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a response header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Type alias for a boxed operation future.
pub type BoxedOperationFuture =
    Pin<Box<dyn Future<Output = Result<OperationResponse, GalenError>> + Send>>;

/// A type-erased operation capability.
pub type ErasedOperation =
    Arc<dyn Fn(OperationRequest, ContextHandle) -> BoxedOperationFuture + Send + Sync>;

/// Registry of operation capabilities.
///
/// Maps operation IDs to their async capabilities, handling type erasure so
/// capabilities of different concrete future types can live in a single
/// collection.
#[derive(Default)]
pub struct OperationRegistry {
    operations: HashMap<String, ErasedOperation>,
}

impl OperationRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// Registers a capability for an operation ID.
    ///
    /// The capability must accept the request descriptor and the active
    /// transaction context, and resolve to an [`OperationResponse`] or one
    /// of the dispatcher's failure classes.
    pub fn register<F, Fut>(&mut self, operation_id: impl Into<String>, operation: F)
    where
        F: Fn(OperationRequest, ContextHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<OperationResponse, GalenError>> + Send + 'static,
    {
        let erased: ErasedOperation = Arc::new(move |request, ctx| Box::pin(operation(request, ctx)));
        self.operations.insert(operation_id.into(), erased);
    }

    /// Looks up a capability by operation ID.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&ErasedOperation> {
        self.operations.get(operation_id)
    }

    /// Checks if a capability is registered for an operation ID.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.operations.contains_key(operation_id)
    }

    /// Returns the number of registered capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if no capabilities are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns an iterator over registered operation IDs.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Invokes the capability registered for the given operation ID.
    ///
    /// # Errors
    ///
    /// Returns [`GalenError::Internal`] when no capability is registered —
    /// a route table naming an unregistered operation is a wiring bug, not
    /// a client error — or whatever failure the capability itself raises.
    pub async fn invoke(
        &self,
        operation_id: &str,
        request: OperationRequest,
        ctx: ContextHandle,
    ) -> Result<OperationResponse, GalenError> {
        let operation = self.operations.get(operation_id).ok_or_else(|| {
            GalenError::internal(format!(
                "no capability registered for operation `{operation_id}`"
            ))
        })?;

        operation(request, ctx).await
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}
