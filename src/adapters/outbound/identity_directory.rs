//! Identity Directory
//!
//! Implements IpResolver over two live indexes: workload instances (pods)
//! and stable endpoints (services). Each index is kept current by its own
//! background sync task; lookups only touch the indexes.

use super::dashmap_identity_index::IdentityIndex;
use super::kubernetes_identity_source::{self, KubernetesIdentitySource};
use crate::domain::entities::{IdentityEvent, IdentityKind};
use crate::domain::ports::{IdentitySource, IpResolver};
use crate::error::ConfigurationError;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, Service};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// IP → identity resolver fed by list+watch streams.
///
/// Priority is applied at lookup time: a workload instance wins over a
/// stable endpoint with the same IP. Dropping the directory stops its sync
/// tasks.
pub struct IdentityDirectory {
    workloads: Arc<IdentityIndex>,
    endpoints: Arc<IdentityIndex>,
    tasks: Vec<JoinHandle<()>>,
}

impl IdentityDirectory {
    /// Connect to the cluster and start watching pods and services.
    ///
    /// Fails when the kubeconfig cannot be loaded or the API server does
    /// not answer. Must be called inside a Tokio runtime.
    pub async fn connect(kubeconfig: Option<&str>) -> Result<Self, ConfigurationError> {
        let client = kubernetes_identity_source::connect(kubeconfig).await?;

        let pods: Arc<dyn IdentitySource> =
            Arc::new(KubernetesIdentitySource::<Pod>::new(client.clone()));
        let services: Arc<dyn IdentitySource> =
            Arc::new(KubernetesIdentitySource::<Service>::new(client));

        Ok(Self::start(pods, services))
    }

    /// Start syncing from arbitrary sources.
    pub fn start(workloads: Arc<dyn IdentitySource>, endpoints: Arc<dyn IdentitySource>) -> Self {
        let workload_index = Arc::new(IdentityIndex::new(IdentityKind::WorkloadInstance));
        let endpoint_index = Arc::new(IdentityIndex::new(IdentityKind::StableEndpoint));

        let tasks = vec![
            tokio::spawn(run_sync(workload_index.clone(), workloads)),
            tokio::spawn(run_sync(endpoint_index.clone(), endpoints)),
        ];

        Self {
            workloads: workload_index,
            endpoints: endpoint_index,
            tasks,
        }
    }

    /// Whether both indexes have applied a full listing.
    pub fn is_synced(&self) -> bool {
        self.workloads.is_synced() && self.endpoints.is_synced()
    }

    pub fn workloads(&self) -> &IdentityIndex {
        &self.workloads
    }

    pub fn endpoints(&self) -> &IdentityIndex {
        &self.endpoints
    }
}

impl IpResolver for IdentityDirectory {
    fn resolve(&self, ip: &str) -> String {
        self.workloads
            .lookup(ip)
            .or_else(|| self.endpoints.lookup(ip))
            .unwrap_or_else(|| ip.to_string())
    }
}

impl Drop for IdentityDirectory {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Apply one source's events to its index until the stream ends.
async fn run_sync(index: Arc<IdentityIndex>, source: Arc<dyn IdentitySource>) {
    let kind = source.kind();
    if kind != index.kind() {
        tracing::warn!("{} source feeding {} index", kind, index.kind());
    }

    let mut events = source.events();
    // Keys announced since the last Init
    let mut relisted: Option<HashSet<String>> = None;

    while let Some(event) = events.next().await {
        match event {
            Ok(IdentityEvent::Apply(record)) => {
                tracing::trace!("{} apply {} -> {}", kind, record.object_key(), record.ip);
                index.upsert(record);
            }
            Ok(IdentityEvent::Delete(record)) => {
                tracing::trace!("{} delete {}", kind, record.object_key());
                index.evict(&record);
            }
            Ok(IdentityEvent::Init) => {
                relisted = Some(HashSet::new());
            }
            Ok(IdentityEvent::InitApply(record)) => {
                if let Some(seen) = relisted.as_mut() {
                    seen.insert(record.object_key());
                }
                index.upsert(record);
            }
            Ok(IdentityEvent::InitDone) => {
                if let Some(seen) = relisted.take() {
                    let removed = index.retain_objects(&seen);
                    if removed > 0 {
                        tracing::debug!("{} relist evicted {} stale entries", kind, removed);
                    }
                }
                if !index.is_synced() {
                    tracing::info!("{} index synced, {} addresses", kind, index.len());
                }
                index.mark_synced();
            }
            Err(e) => tracing::warn!("{} identity stream: {}", kind, e),
        }
    }

    tracing::warn!("{} identity stream ended", kind);
}
