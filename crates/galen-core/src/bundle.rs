//! Bundle envelope data model.
//!
//! One inbound [`RequestBundle`] carries several logically independent
//! sub-requests; one outbound [`ResponseBundle`] carries the corresponding
//! sub-responses, index-aligned with the input. The wire format is JSON with
//! camelCase field names; absent optional fields are omitted entirely,
//! never emitted as `null`.

use crate::error::{GalenError, GalenResult};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal `resourceType` discriminator carried by every bundle envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BundleMarker {
    /// The only admissible value: `"Bundle"`.
    #[default]
    Bundle,
}

/// Delivery mode of a request bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    /// Entries are independent; partial failure is expected and isolated.
    Batch,
    /// Entries must succeed or fail as one unit.
    Transaction,
}

impl BundleKind {
    /// Returns the response-bundle kind mirroring this request kind.
    #[must_use]
    pub const fn response_kind(self) -> ResponseBundleKind {
        match self {
            Self::Batch => ResponseBundleKind::BatchResponse,
            Self::Transaction => ResponseBundleKind::TransactionResponse,
        }
    }
}

/// Delivery mode of a response bundle, mirroring the request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseBundleKind {
    /// Response to a `batch` bundle.
    #[serde(rename = "batch-response")]
    BatchResponse,
    /// Response to a `transaction` bundle.
    #[serde(rename = "transaction-response")]
    TransactionResponse,
}

/// HTTP methods admissible in a bundle entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryMethod {
    /// Read a resource.
    Get,
    /// Create a resource.
    Post,
    /// Update a resource.
    Put,
    /// Delete a resource.
    Delete,
}

impl EntryMethod {
    /// Converts to the `http` crate's method type.
    #[must_use]
    pub fn as_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

/// The declarative request of one bundle entry.
///
/// Conditional-header fields are each optional and independent; only
/// non-null fields produce headers on the synthesized virtual request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    /// HTTP method of the sub-request.
    pub method: EntryMethod,
    /// Relative URL: path plus optional query (e.g. `Patient/1?summary=true`).
    pub url: String,
    /// `If-None-Match` conditional value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_none_match: Option<String>,
    /// `If-Modified-Since` conditional value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_modified_since: Option<String>,
    /// `If-Match` conditional value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_match: Option<String>,
    /// `If-None-Exist` conditional value (conditional create).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_none_exist: Option<String>,
}

impl EntryRequest {
    /// Creates a request with the given method and URL, no conditionals.
    #[must_use]
    pub fn new(method: EntryMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            if_none_match: None,
            if_modified_since: None,
            if_match: None,
            if_none_exist: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(EntryMethod::Get, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(EntryMethod::Post, url)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(EntryMethod::Put, url)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(EntryMethod::Delete, url)
    }

    /// Sets the `If-None-Match` conditional.
    #[must_use]
    pub fn with_if_none_match(mut self, value: impl Into<String>) -> Self {
        self.if_none_match = Some(value.into());
        self
    }

    /// Sets the `If-Modified-Since` conditional.
    #[must_use]
    pub fn with_if_modified_since(mut self, value: impl Into<String>) -> Self {
        self.if_modified_since = Some(value.into());
        self
    }

    /// Sets the `If-Match` conditional.
    #[must_use]
    pub fn with_if_match(mut self, value: impl Into<String>) -> Self {
        self.if_match = Some(value.into());
        self
    }

    /// Sets the `If-None-Exist` conditional.
    #[must_use]
    pub fn with_if_none_exist(mut self, value: impl Into<String>) -> Self {
        self.if_none_exist = Some(value.into());
        self
    }
}

/// One sub-request inside a request bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Optional structured document accompanying the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    /// The declarative sub-request.
    pub request: EntryRequest,
}

impl BundleEntry {
    /// Creates an entry with no resource body.
    #[must_use]
    pub fn new(request: EntryRequest) -> Self {
        Self {
            resource: None,
            request,
        }
    }

    /// Attaches a resource body to the entry.
    #[must_use]
    pub fn with_resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// An inbound envelope of sub-requests.
///
/// Sequence order is processing order. A bundle with zero entries is valid
/// and yields an empty response sequence.
///
/// # Example
///
/// ```
/// use galen_core::bundle::{BundleEntry, EntryRequest, RequestBundle};
///
/// let bundle = RequestBundle::batch()
///     .entry(BundleEntry::new(EntryRequest::get("Patient/1")))
///     .entry(BundleEntry::new(EntryRequest::get("Patient/2")));
///
/// assert_eq!(bundle.entry.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBundle {
    /// Literal `"Bundle"` discriminator.
    #[serde(rename = "resourceType")]
    pub resource_type: BundleMarker,
    /// Delivery mode.
    #[serde(rename = "type")]
    pub kind: BundleKind,
    /// Ordered sub-requests.
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl RequestBundle {
    /// Creates an empty bundle of the given kind.
    #[must_use]
    pub fn new(kind: BundleKind) -> Self {
        Self {
            resource_type: BundleMarker::Bundle,
            kind,
            entry: Vec::new(),
        }
    }

    /// Creates an empty `batch` bundle.
    #[must_use]
    pub fn batch() -> Self {
        Self::new(BundleKind::Batch)
    }

    /// Creates an empty `transaction` bundle.
    #[must_use]
    pub fn transaction() -> Self {
        Self::new(BundleKind::Transaction)
    }

    /// Appends an entry, preserving declaration order.
    #[must_use]
    pub fn entry(mut self, entry: BundleEntry) -> Self {
        self.entry.push(entry);
        self
    }

    /// Parses an inbound envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GalenError::MalformedBundle`] when the document does not
    /// have the envelope shape; this is a whole-request failure, never a
    /// per-entry one.
    pub fn from_json_slice(bytes: &[u8]) -> GalenResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| GalenError::malformed(e.to_string()))
    }

    /// Parses an inbound envelope from an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`GalenError::MalformedBundle`] when the value does not have
    /// the envelope shape.
    pub fn from_json_value(value: Value) -> GalenResult<Self> {
        serde_json::from_value(value).map_err(|e| GalenError::malformed(e.to_string()))
    }
}

/// Literal `resourceType` discriminator of an operation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutcomeMarker {
    /// The only admissible value: `"OperationOutcome"`.
    #[default]
    OperationOutcome,
}

/// Severity of an outcome issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Processing of the entry failed.
    Error,
    /// The entry succeeded with a caveat.
    Warning,
    /// Informational note.
    Information,
}

/// One issue record inside an operation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeIssue {
    /// Issue severity.
    pub severity: IssueSeverity,
    /// Machine-readable issue code.
    pub code: String,
    /// Human-readable diagnostic text.
    pub diagnostics: String,
}

impl OutcomeIssue {
    /// Creates an error-severity issue.
    #[must_use]
    pub fn error(code: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            diagnostics: diagnostics.into(),
        }
    }
}

/// Structured error description attached to a failed response entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Literal `"OperationOutcome"` discriminator.
    #[serde(rename = "resourceType")]
    pub resource_type: OutcomeMarker,
    /// One record per violation or diagnostic.
    pub issue: Vec<OutcomeIssue>,
}

impl OperationOutcome {
    /// Creates an outcome with a single error issue.
    #[must_use]
    pub fn error(code: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: OutcomeMarker::OperationOutcome,
            issue: vec![OutcomeIssue::error(code, diagnostics)],
        }
    }

    /// Creates an outcome with one error issue per violation.
    #[must_use]
    pub fn from_violations<I, S>(code: impl Into<String>, violations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let code = code.into();
        Self {
            resource_type: OutcomeMarker::OperationOutcome,
            issue: violations
                .into_iter()
                .map(|v| OutcomeIssue::error(code.clone(), v))
                .collect(),
        }
    }
}

/// The response part of one response entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    /// HTTP-style status code as a string (e.g. `"200"`).
    pub status: String,
    /// `Location` header value, if the handler set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// `ETag` header value, if the handler set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// `Last-Modified` header value, if the handler set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Structured error description; never present on a successful entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OperationOutcome>,
}

impl EntryResponse {
    /// Creates a bare response with the given status string.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            location: None,
            etag: None,
            last_modified: None,
            outcome: None,
        }
    }
}

/// One sub-response inside a response bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEntry {
    /// Status, headers, and optional outcome of the sub-response.
    pub response: EntryResponse,
    /// Resource body of a successful entry, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

/// An outbound envelope of sub-responses, index-aligned with the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBundle {
    /// Literal `"Bundle"` discriminator.
    #[serde(rename = "resourceType")]
    pub resource_type: BundleMarker,
    /// Delivery mode mirroring the request kind.
    #[serde(rename = "type")]
    pub kind: ResponseBundleKind,
    /// Ordered sub-responses.
    pub entry: Vec<ResponseEntry>,
}

impl ResponseBundle {
    /// Creates an empty response bundle of the given kind.
    #[must_use]
    pub fn new(kind: ResponseBundleKind) -> Self {
        Self {
            resource_type: BundleMarker::Bundle,
            kind,
            entry: Vec::new(),
        }
    }

    /// Serializes the envelope to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`GalenError::Internal`] if serialization fails, which would
    /// indicate a bug in the envelope types rather than bad input.
    pub fn to_json_value(&self) -> GalenResult<Value> {
        serde_json::to_value(self).map_err(|e| GalenError::internal_with_source("response bundle serialization failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundle_kind_response_mirror() {
        assert_eq!(
            BundleKind::Batch.response_kind(),
            ResponseBundleKind::BatchResponse
        );
        assert_eq!(
            BundleKind::Transaction.response_kind(),
            ResponseBundleKind::TransactionResponse
        );
    }

    #[test]
    fn test_entry_method_as_method() {
        assert_eq!(EntryMethod::Get.as_method(), Method::GET);
        assert_eq!(EntryMethod::Delete.as_method(), Method::DELETE);
    }

    #[test]
    fn test_request_bundle_parses_wire_format() {
        let bundle = RequestBundle::from_json_value(json!({
            "resourceType": "Bundle",
            "type": "batch",
            "entry": [
                { "request": { "method": "GET", "url": "Patient/1" } },
                {
                    "resource": { "resourceType": "Patient", "id": "1" },
                    "request": { "method": "PUT", "url": "Patient/1", "ifMatch": "W/\"1\"" }
                }
            ]
        }))
        .expect("wire format should parse");

        assert_eq!(bundle.kind, BundleKind::Batch);
        assert_eq!(bundle.entry.len(), 2);
        assert_eq!(bundle.entry[0].request.method, EntryMethod::Get);
        assert!(bundle.entry[0].resource.is_none());
        assert_eq!(bundle.entry[1].request.if_match.as_deref(), Some("W/\"1\""));
        assert!(bundle.entry[1].resource.is_some());
    }

    #[test]
    fn test_request_bundle_rejects_wrong_resource_type() {
        let result = RequestBundle::from_json_value(json!({
            "resourceType": "Patient",
            "type": "batch",
            "entry": []
        }));
        assert!(matches!(result, Err(GalenError::MalformedBundle { .. })));
    }

    #[test]
    fn test_request_bundle_rejects_unknown_method() {
        let result = RequestBundle::from_json_value(json!({
            "resourceType": "Bundle",
            "type": "batch",
            "entry": [ { "request": { "method": "PATCH", "url": "Patient/1" } } ]
        }));
        assert!(matches!(result, Err(GalenError::MalformedBundle { .. })));
    }

    #[test]
    fn test_request_bundle_zero_entries_is_valid() {
        let bundle = RequestBundle::from_json_value(json!({
            "resourceType": "Bundle",
            "type": "transaction"
        }))
        .expect("missing entry array defaults to empty");
        assert!(bundle.entry.is_empty());
    }

    #[test]
    fn test_malformed_json_is_whole_request_failure() {
        let result = RequestBundle::from_json_slice(b"not json at all");
        assert!(matches!(result, Err(GalenError::MalformedBundle { .. })));
    }

    #[test]
    fn test_response_bundle_omits_absent_fields() {
        let mut bundle = ResponseBundle::new(ResponseBundleKind::BatchResponse);
        bundle.entry.push(ResponseEntry {
            response: EntryResponse::new("200"),
            resource: Some(json!({"resourceType": "Patient", "id": "1"})),
        });

        let value = bundle.to_json_value().expect("serializes");
        assert_eq!(value["resourceType"], "Bundle");
        assert_eq!(value["type"], "batch-response");

        let entry = &value["entry"][0];
        assert_eq!(entry["response"]["status"], "200");
        // Absent optional fields must be omitted, not null
        let response = entry["response"].as_object().expect("object");
        assert!(!response.contains_key("location"));
        assert!(!response.contains_key("etag"));
        assert!(!response.contains_key("lastModified"));
        assert!(!response.contains_key("outcome"));
        assert_eq!(entry["resource"]["id"], "1");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = OperationOutcome::error("exception", "Not implemented");
        let value = serde_json::to_value(&outcome).expect("serializes");

        assert_eq!(value["resourceType"], "OperationOutcome");
        assert_eq!(value["issue"][0]["severity"], "error");
        assert_eq!(value["issue"][0]["code"], "exception");
        assert_eq!(value["issue"][0]["diagnostics"], "Not implemented");
    }

    #[test]
    fn test_outcome_from_violations() {
        let outcome = OperationOutcome::from_violations(
            "exception",
            vec!["missing field `id`", "unexpected field `foo`"],
        );
        assert_eq!(outcome.issue.len(), 2);
        assert_eq!(outcome.issue[1].diagnostics, "unexpected field `foo`");
    }

    #[test]
    fn test_entry_request_builders() {
        let request = EntryRequest::put("Patient/1").with_if_match("W/\"3\"");
        assert_eq!(request.method, EntryMethod::Put);
        assert_eq!(request.url, "Patient/1");
        assert_eq!(request.if_match.as_deref(), Some("W/\"3\""));
        assert!(request.if_none_match.is_none());
    }

    #[test]
    fn test_conditional_fields_round_trip() {
        let request = EntryRequest::get("Patient/1")
            .with_if_none_match("*")
            .with_if_modified_since("Sat, 01 Jan 2000 00:00:00 GMT");
        let value = serde_json::to_value(&request).expect("serializes");

        assert_eq!(value["ifNoneMatch"], "*");
        assert_eq!(value["ifModifiedSince"], "Sat, 01 Jan 2000 00:00:00 GMT");
        let object = value.as_object().expect("object");
        assert!(!object.contains_key("ifMatch"));
        assert!(!object.contains_key("ifNoneExist"));
    }
}
