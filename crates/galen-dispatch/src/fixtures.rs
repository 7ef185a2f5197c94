//! Resource-operation fixtures for tests and demos.
//!
//! This module provides a pre-built route table and operation registry
//! exposing a minimal CRUD surface over an in-memory [`ResourceStore`]:
//!
//! - `read` - GET `/{resourceType}/{id}`, echoes the addressed resource
//! - `create` - POST `/{resourceType}`, stores the document, `Location` header
//! - `update` - PUT `/{resourceType}/{id}`, replaces the document
//! - `delete` - DELETE `/{resourceType}/{id}`, removes the document
//!
//! The reserved resource type [`ERROR_RESOURCE_TYPE`] makes `update` raise a
//! declared `501 Not implemented` failure, which tests use to exercise the
//! failure paths. Mutating operations stage compensations on the active
//! context, so transaction rollback is observable through the store.
//!
//! # Example
//!
//! ```
//! use galen_dispatch::fixtures::{demo_registry, demo_route_table, ResourceStore};
//!
//! let store = ResourceStore::new();
//! let table = demo_route_table();
//! let registry = demo_registry(&store);
//!
//! assert_eq!(table.route_count(), 4);
//! assert!(registry.contains("read"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use parking_lot::Mutex;
use serde_json::{json, Value};

use galen_core::{ContextHandle, GalenError, GalenResult};
use galen_router::RouteTable;

use crate::registry::{OperationRegistry, OperationRequest, OperationResponse};

/// Reserved resource type whose update always fails with a declared `501`.
pub const ERROR_RESOURCE_TYPE: &str = "Error";

/// Shared in-memory resource store, keyed by `resourceType/id`.
///
/// Cloning shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl ResourceStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document stored under the given key, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().get(key).cloned()
    }

    /// Stores a document, returning the previous one if present.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.lock().insert(key.into(), value)
    }

    /// Removes a document, returning it if present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.lock().remove(key)
    }

    /// Returns `true` if a document is stored under the given key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Builds the demo route table: the CRUD surface over `/{resourceType}`.
#[must_use]
pub fn demo_route_table() -> RouteTable {
    RouteTable::builder()
        .route(Method::GET, "/{resourceType}/{id}", "read")
        .route(Method::POST, "/{resourceType}", "create")
        .route(Method::PUT, "/{resourceType}/{id}", "update")
        .route(Method::DELETE, "/{resourceType}/{id}", "delete")
        .build()
}

fn require_document_object(document: &Value) -> GalenResult<()> {
    if document.is_object() {
        Ok(())
    } else {
        Err(GalenError::validation_with(
            "malformed request body",
            vec!["resource must be a JSON object".to_string()],
        ))
    }
}

fn stage_replace_undo(
    ctx: &ContextHandle,
    store: &ResourceStore,
    key: String,
    previous: Option<Value>,
) {
    let store = store.clone();
    ctx.push_compensation(move || match previous {
        Some(value) => {
            store.insert(key, value);
        }
        None => {
            store.remove(&key);
        }
    });
}

/// Builds the demo operation registry over the given store.
#[must_use]
pub fn demo_registry(store: &ResourceStore) -> OperationRegistry {
    let mut registry = OperationRegistry::new();

    registry.register(
        "read",
        |request: OperationRequest, _ctx: ContextHandle| async move {
            let resource_type = request.param("resourceType").unwrap_or_default().to_string();
            let id = request.param("id").unwrap_or_default().to_string();
            OperationResponse::json(
                StatusCode::OK,
                &json!({"resourceType": resource_type, "id": id}),
            )
        },
    );

    let create_store = store.clone();
    registry.register(
        "create",
        move |request: OperationRequest, ctx: ContextHandle| {
            let store = create_store.clone();
            async move {
                let resource_type =
                    request.param("resourceType").unwrap_or_default().to_string();
                let document = match request.json_body()? {
                    Some(document) => {
                        require_document_object(&document)?;
                        document
                    }
                    None => json!({"resourceType": resource_type.clone()}),
                };

                // The stub always allocates id 1
                let key = format!("{resource_type}/1");
                let previous = store.insert(key.clone(), document);
                stage_replace_undo(&ctx, &store, key.clone(), previous);

                Ok(OperationResponse::json(
                    StatusCode::CREATED,
                    &json!({"resourceType": resource_type}),
                )?
                .with_header("Location", format!("/{key}")))
            }
        },
    );

    let update_store = store.clone();
    registry.register(
        "update",
        move |request: OperationRequest, ctx: ContextHandle| {
            let store = update_store.clone();
            async move {
                let resource_type =
                    request.param("resourceType").unwrap_or_default().to_string();
                let id = request.param("id").unwrap_or_default().to_string();

                if resource_type == ERROR_RESOURCE_TYPE {
                    return Err(GalenError::not_implemented("Not implemented"));
                }

                let document = match request.json_body()? {
                    Some(document) => {
                        require_document_object(&document)?;
                        document
                    }
                    None => json!({"resourceType": resource_type.clone(), "id": id.clone()}),
                };

                let key = format!("{resource_type}/{id}");
                let previous = store.insert(key.clone(), document);
                stage_replace_undo(&ctx, &store, key, previous);

                OperationResponse::json(
                    StatusCode::OK,
                    &json!({"resourceType": resource_type, "id": id}),
                )
            }
        },
    );

    let delete_store = store.clone();
    registry.register(
        "delete",
        move |request: OperationRequest, ctx: ContextHandle| {
            let store = delete_store.clone();
            async move {
                let resource_type =
                    request.param("resourceType").unwrap_or_default().to_string();
                let id = request.param("id").unwrap_or_default().to_string();

                let key = format!("{resource_type}/{id}");
                if let Some(previous) = store.remove(&key) {
                    let undo = store.clone();
                    ctx.push_compensation(move || {
                        undo.insert(key, previous);
                    });
                }

                Ok(OperationResponse::no_content())
            }
        },
    );

    registry
}
