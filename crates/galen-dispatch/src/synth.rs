//! Virtual-request synthesis.
//!
//! Converts one bundle entry's declarative request into an in-process
//! [`VirtualRequest`] descriptor, without touching a real transport socket.
//! This is a pure transformation: it has no side effects and no failure
//! conditions. Malformed entry content fails later, inside the handler.

use bytes::Bytes;
use galen_core::bundle::BundleEntry;
use galen_core::Headers;
use http::uri::Scheme;
use http::{Method, Version};
use serde_json::Value;

use crate::config::ScopeMeta;

/// Content type marker attached to synthesized bodies.
pub const FHIR_JSON: &str = "application/fhir+json";

/// An ephemeral in-process request descriptor.
///
/// Owned solely by the dispatcher for the duration of one entry's execution
/// and discarded after.
#[derive(Debug, Clone)]
pub struct VirtualRequest {
    /// HTTP method of the sub-request.
    pub method: Method,
    /// Rooted request path (always starts with `/`).
    pub path: String,
    /// Raw query string, passed through unmodified; `None` when absent.
    pub query: Option<String>,
    /// Headers synthesized from the entry's non-null conditional fields,
    /// plus content markers when a body is present.
    pub headers: Headers,
    /// Serialized body bytes, present only for a non-empty resource.
    pub body: Option<Bytes>,
    /// URI scheme of the surrounding request.
    pub scheme: Scheme,
    /// HTTP protocol version of the surrounding request.
    pub version: Version,
}

/// Returns `true` for resource values that carry no content.
///
/// An empty object, array, or string is treated the same as an absent
/// resource: no body and no content headers are synthesized for it.
fn resource_is_empty(resource: &Value) -> bool {
    match resource {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Synthesizes a virtual request from one bundle entry.
///
/// Rules:
/// - Conditional headers are added only when their source field is non-null;
///   absent fields never produce empty or placeholder headers.
/// - A present, non-empty `resource` is serialized to canonical JSON and
///   becomes the body, together with a content-type marker and a
///   content-length equal to the serialized byte length.
/// - The path is always rooted; the query string, if present, is passed
///   through unmodified.
///
/// # Example
///
/// ```
/// use galen_core::bundle::{BundleEntry, EntryRequest};
/// use galen_dispatch::{synthesize, ScopeMeta};
///
/// let entry = BundleEntry::new(EntryRequest::get("Patient/1").with_if_match("W/\"1\""));
/// let request = synthesize(&entry, &ScopeMeta::default());
///
/// assert_eq!(request.path, "/Patient/1");
/// assert_eq!(request.headers.get("If-Match"), Some("W/\"1\""));
/// assert_eq!(request.headers.len(), 1);
/// assert!(request.body.is_none());
/// ```
#[must_use]
pub fn synthesize(entry: &BundleEntry, scope: &ScopeMeta) -> VirtualRequest {
    let request = &entry.request;

    let (raw_path, query) = match request.url.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (request.url.as_str(), None),
    };
    let path = format!("/{}", raw_path.trim_start_matches('/'));

    let mut headers = Headers::new();
    if let Some(value) = &request.if_none_match {
        headers.insert("If-None-Match", value.clone());
    }
    if let Some(value) = &request.if_modified_since {
        headers.insert("If-Modified-Since", value.clone());
    }
    if let Some(value) = &request.if_match {
        headers.insert("If-Match", value.clone());
    }
    if let Some(value) = &request.if_none_exist {
        headers.insert("If-None-Exist", value.clone());
    }

    let body = entry
        .resource
        .as_ref()
        .filter(|resource| !resource_is_empty(resource))
        .map(|resource| {
            let bytes =
                serde_json::to_vec(resource).expect("JSON value serialization cannot fail");
            headers.insert("Content-Type", FHIR_JSON);
            headers.insert("Content-Length", bytes.len().to_string());
            Bytes::from(bytes)
        });

    VirtualRequest {
        method: request.method.as_method(),
        path,
        query,
        headers,
        body,
        scheme: scope.scheme.clone(),
        version: scope.version,
    }
}
