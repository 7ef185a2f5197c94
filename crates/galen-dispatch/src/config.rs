//! Dispatcher configuration types.
//!
//! This module provides configuration for the bundle dispatcher, using the
//! builder pattern for ergonomic construction.
//!
//! # Example
//!
//! ```rust
//! use galen_dispatch::{DispatcherConfig, TransactionFailurePolicy, UnmatchedPolicy};
//!
//! let config = DispatcherConfig::builder()
//!     .unmatched_policy(UnmatchedPolicy::NotFound)
//!     .build();
//!
//! assert_eq!(config.unmatched_policy(), UnmatchedPolicy::NotFound);
//! assert_eq!(
//!     config.transaction_failure_policy(),
//!     TransactionFailurePolicy::Abort
//! );
//! ```

use http::uri::Scheme;
use http::Version;

/// What to do with an entry whose route does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Silently skip the entry; no response entry is emitted at its index.
    ///
    /// This mirrors the historical contract where an unroutable sub-request
    /// is a no-op rather than an error.
    #[default]
    Skip,
    /// Emit a `404` response entry with a structured outcome.
    NotFound,
}

/// How a `transaction` bundle reacts to a failed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFailurePolicy {
    /// Stop at the first failure, run staged compensations, and return only
    /// the entries processed so far (the failure carrying its outcome).
    #[default]
    Abort,
    /// Keep processing every entry and only write a rollback marker, without
    /// undoing prior effects. This reproduces the log-only baseline and is
    /// not atomic.
    ContinueLogOnly,
}

/// Ambient metadata of the surrounding request, copied onto every
/// synthesized virtual request.
#[derive(Debug, Clone)]
pub struct ScopeMeta {
    /// URI scheme of the surrounding request.
    pub scheme: Scheme,
    /// HTTP protocol version of the surrounding request.
    pub version: Version,
}

impl Default for ScopeMeta {
    fn default() -> Self {
        Self {
            scheme: Scheme::HTTP,
            version: Version::HTTP_11,
        }
    }
}

/// Bundle dispatcher configuration.
///
/// Use [`DispatcherConfig::builder()`] to construct instances.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Policy for entries whose route does not resolve
    unmatched: UnmatchedPolicy,

    /// Policy for failures inside a `transaction` bundle
    transaction_failure: TransactionFailurePolicy,

    /// Ambient request metadata for virtual-request synthesis
    scope: ScopeMeta,
}

impl DispatcherConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::default()
    }

    /// Returns the unmatched-route policy.
    #[must_use]
    pub fn unmatched_policy(&self) -> UnmatchedPolicy {
        self.unmatched
    }

    /// Returns the transaction failure policy.
    #[must_use]
    pub fn transaction_failure_policy(&self) -> TransactionFailurePolicy {
        self.transaction_failure
    }

    /// Returns the ambient scope metadata.
    #[must_use]
    pub fn scope_meta(&self) -> &ScopeMeta {
        &self.scope
    }
}

/// Builder for [`DispatcherConfig`].
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfigBuilder {
    unmatched: UnmatchedPolicy,
    transaction_failure: TransactionFailurePolicy,
    scope: ScopeMeta,
}

impl DispatcherConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy for entries whose route does not resolve.
    #[must_use]
    pub fn unmatched_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Sets the policy for failures inside a `transaction` bundle.
    #[must_use]
    pub fn transaction_failure_policy(mut self, policy: TransactionFailurePolicy) -> Self {
        self.transaction_failure = policy;
        self
    }

    /// Sets the ambient scope metadata copied onto virtual requests.
    #[must_use]
    pub fn scope_meta(mut self, scope: ScopeMeta) -> Self {
        self.scope = scope;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> DispatcherConfig {
        DispatcherConfig {
            unmatched: self.unmatched,
            transaction_failure: self.transaction_failure,
            scope: self.scope,
        }
    }
}
