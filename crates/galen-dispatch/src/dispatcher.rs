//! The bundle dispatcher.
//!
//! [`BundleDispatcher`] is the engine that turns one [`RequestBundle`] into
//! one [`ResponseBundle`]: it synthesizes a virtual request per entry,
//! resolves it against the route table, executes the resolved capability
//! under the active transaction context, and maps each result into the
//! response envelope.
//!
//! Entries execute strictly sequentially and in declared order; a later
//! entry may depend on identifiers produced by an earlier one, so there is
//! no intra-bundle parallelism, speculation, or reordering. Distinct
//! top-level bundles may run concurrently on separate dispatch calls; each
//! gets its own isolated context.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use galen_core::bundle::{BundleEntry, EntryRequest, RequestBundle};
//! use galen_core::MemoryArchive;
//! use galen_dispatch::fixtures::{demo_registry, demo_route_table, ResourceStore};
//! use galen_dispatch::BundleDispatcher;
//!
//! # tokio_test::block_on(async {
//! let store = ResourceStore::new();
//! let dispatcher = BundleDispatcher::new(
//!     demo_route_table(),
//!     demo_registry(&store),
//!     Arc::new(MemoryArchive::new()),
//! );
//!
//! let bundle = RequestBundle::batch()
//!     .entry(BundleEntry::new(EntryRequest::get("Patient/1")));
//! let response = dispatcher.dispatch(bundle).await.unwrap();
//! assert_eq!(response.entry[0].response.status, "200");
//! # });
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use galen_core::bundle::{BundleEntry, BundleKind, RequestBundle, ResponseBundle};
use galen_core::{ContextHandle, GalenError, GalenResult, RequestId, TransactionArchive};
use galen_router::{RouteMatch, RouteTable};

use crate::config::{DispatcherConfig, TransactionFailurePolicy, UnmatchedPolicy};
use crate::outcome;
use crate::registry::{OperationRegistry, OperationRequest, OperationResponse};
use crate::synth::{synthesize, VirtualRequest};

/// Dispatches bundle entries against a route table and operation registry.
///
/// The route table and registry are fixed at construction; one dispatcher
/// serves any number of concurrent bundles.
pub struct BundleDispatcher {
    /// Immutable route table
    routes: RouteTable,

    /// Operation capabilities, keyed by operation ID
    registry: OperationRegistry,

    /// Failure and strictness policies plus ambient scope metadata
    config: DispatcherConfig,

    /// Sink for finalized transaction logs
    archive: Arc<dyn TransactionArchive>,
}

impl BundleDispatcher {
    /// Creates a dispatcher with the default configuration.
    #[must_use]
    pub fn new(
        routes: RouteTable,
        registry: OperationRegistry,
        archive: Arc<dyn TransactionArchive>,
    ) -> Self {
        Self::with_config(routes, registry, archive, DispatcherConfig::default())
    }

    /// Creates a dispatcher with an explicit configuration.
    #[must_use]
    pub fn with_config(
        routes: RouteTable,
        registry: OperationRegistry,
        archive: Arc<dyn TransactionArchive>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            routes,
            registry,
            config,
            archive,
        }
    }

    /// Returns the route table.
    #[must_use]
    pub fn route_table(&self) -> &RouteTable {
        &self.routes
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Processes one bundle with no surrounding request scope.
    ///
    /// A `transaction` bundle gets a single bundle-scoped context that the
    /// dispatcher finalizes itself (commit on success, rollback on abort).
    /// Each `batch` entry gets a private context finalized around just that
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns an error only for whole-bundle failures (handler integrity
    /// violations); per-entry failures are mapped into the response.
    pub async fn dispatch(&self, bundle: RequestBundle) -> GalenResult<ResponseBundle> {
        self.run(bundle, None).await
    }

    /// Processes one bundle under a context the surrounding request already
    /// opened.
    ///
    /// Both `transaction` and `batch` entries record into the supplied
    /// context; the owner of the scope finalizes it when the scope exits.
    /// The dispatcher finalizes it early only when a `transaction` bundle
    /// aborts (the rollback must run before the failure response is
    /// returned).
    ///
    /// # Errors
    ///
    /// Returns an error only for whole-bundle failures; per-entry failures
    /// are mapped into the response.
    pub async fn dispatch_in_scope(
        &self,
        bundle: RequestBundle,
        scope: &ContextHandle,
    ) -> GalenResult<ResponseBundle> {
        self.run(bundle, Some(scope)).await
    }

    async fn run(
        &self,
        bundle: RequestBundle,
        outer: Option<&ContextHandle>,
    ) -> GalenResult<ResponseBundle> {
        let request_id = RequestId::new();
        let kind = bundle.kind;
        info!(
            %request_id,
            kind = ?kind,
            entries = bundle.entry.len(),
            in_scope = outer.is_some(),
            "bundle dispatch start"
        );

        let mut response = ResponseBundle::new(kind.response_kind());
        match kind {
            BundleKind::Transaction => {
                self.run_transaction(&bundle, outer, request_id, &mut response)
                    .await?;
            }
            BundleKind::Batch => {
                self.run_batch(&bundle, outer, request_id, &mut response)
                    .await?;
            }
        }

        info!(
            %request_id,
            entries = response.entry.len(),
            "bundle dispatch complete"
        );
        Ok(response)
    }

    async fn run_transaction(
        &self,
        bundle: &RequestBundle,
        outer: Option<&ContextHandle>,
        request_id: RequestId,
        response: &mut ResponseBundle,
    ) -> GalenResult<()> {
        // All entries of a transaction share one context: the caller's when
        // supplied, otherwise a bundle-scoped one owned by this call.
        let shared = outer
            .cloned()
            .unwrap_or_else(|| ContextHandle::begin(self.archive.clone()));
        let owned = outer.is_none();
        let mut first_failure: Option<String> = None;

        for (index, entry) in bundle.entry.iter().enumerate() {
            let Some((matched, request)) = self.resolve(request_id, index, entry, response) else {
                continue;
            };

            match self
                .execute(request_id, index, matched, request, &shared)
                .await
            {
                Ok(result) => match outcome::success_entry(result) {
                    Ok(mapped) => response.entry.push(mapped),
                    Err(fatal) => {
                        // Contract violation: undo everything before failing
                        // the whole bundle.
                        shared.rollback(fatal.to_string());
                        return Err(fatal);
                    }
                },
                Err(error) => {
                    warn!(%request_id, index, error = %error, "transaction entry failed");
                    response.entry.push(outcome::failure_entry(&error));
                    match self.config.transaction_failure_policy() {
                        TransactionFailurePolicy::Abort => {
                            shared.rollback(error.to_string());
                            return Ok(());
                        }
                        TransactionFailurePolicy::ContinueLogOnly => {
                            first_failure.get_or_insert_with(|| error.to_string());
                        }
                    }
                }
            }
        }

        if owned {
            match first_failure {
                Some(reason) => shared.rollback_log_only(reason),
                None => shared.commit(),
            }
        }
        Ok(())
    }

    async fn run_batch(
        &self,
        bundle: &RequestBundle,
        outer: Option<&ContextHandle>,
        request_id: RequestId,
        response: &mut ResponseBundle,
    ) -> GalenResult<()> {
        for (index, entry) in bundle.entry.iter().enumerate() {
            let Some((matched, request)) = self.resolve(request_id, index, entry, response) else {
                continue;
            };

            // Reuse the surrounding request's context when it opened one;
            // otherwise this entry gets a private context finalized around
            // just this entry.
            let (ctx, private) = match outer {
                Some(scope) => (scope.clone(), false),
                None => (ContextHandle::begin(self.archive.clone()), true),
            };

            match self.execute(request_id, index, matched, request, &ctx).await {
                Ok(result) => match outcome::success_entry(result) {
                    Ok(mapped) => {
                        if private {
                            ctx.commit();
                        }
                        response.entry.push(mapped);
                    }
                    Err(fatal) => {
                        if private {
                            ctx.rollback(fatal.to_string());
                        }
                        return Err(fatal);
                    }
                },
                Err(error) => {
                    warn!(%request_id, index, error = %error, "batch entry failed");
                    if private {
                        ctx.rollback(error.to_string());
                    }
                    // Batch entries are isolated: keep going regardless
                    response.entry.push(outcome::failure_entry(&error));
                }
            }
        }
        Ok(())
    }

    /// Synthesizes and resolves one entry.
    ///
    /// Returns `None` when the entry produces no executable work: under the
    /// default lenient policy the entry is skipped outright, under the
    /// strict policy a `404` entry is pushed in its place.
    fn resolve(
        &self,
        request_id: RequestId,
        index: usize,
        entry: &BundleEntry,
        response: &mut ResponseBundle,
    ) -> Option<(RouteMatch, VirtualRequest)> {
        let request = synthesize(entry, self.config.scope_meta());

        match self.routes.match_route(&request.method, &request.path) {
            Some(matched) => {
                debug!(
                    %request_id,
                    index,
                    method = %request.method,
                    path = %request.path,
                    operation_id = matched.operation_id(),
                    "entry route matched"
                );
                Some((matched, request))
            }
            None => {
                warn!(
                    %request_id,
                    index,
                    method = %request.method,
                    path = %request.path,
                    policy = ?self.config.unmatched_policy(),
                    "no route matched for entry"
                );
                if self.config.unmatched_policy() == UnmatchedPolicy::NotFound {
                    response
                        .entry
                        .push(outcome::not_found_entry(&request.method, &request.path));
                }
                None
            }
        }
    }

    /// Executes one resolved entry under the active context.
    ///
    /// Exactly one operation record is appended per execution, before the
    /// capability runs, so the record exists regardless of the outcome.
    async fn execute(
        &self,
        request_id: RequestId,
        index: usize,
        matched: RouteMatch,
        request: VirtualRequest,
        ctx: &ContextHandle,
    ) -> Result<OperationResponse, GalenError> {
        let (operation_id, params) = matched.into_parts();
        ctx.record(format!("{operation_id} {}", request.path));

        debug!(%request_id, index, %operation_id, "entry dispatched");

        let operation_request = OperationRequest {
            request_id,
            operation_id: operation_id.clone(),
            path: request.path,
            params,
            query: request.query,
            headers: request.headers,
            body: request.body.unwrap_or_default(),
        };

        self.registry
            .invoke(&operation_id, operation_request, ctx.clone())
            .await
    }
}

impl std::fmt::Debug for BundleDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleDispatcher")
            .field("routes", &self.routes.route_count())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
