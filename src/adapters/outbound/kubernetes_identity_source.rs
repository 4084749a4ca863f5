//! Kubernetes Identity Source
//!
//! Implements IdentitySource with a cluster-wide list+watch on pods or
//! services via `kube::runtime::watcher`.

use crate::domain::entities::{IdentityEvent, IdentityKind, IdentityRecord};
use crate::domain::ports::IdentitySource;
use crate::error::{ConfigurationError, IdentitySourceError};
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, Config, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Objects that can be turned into an identity record.
pub trait ToIdentity {
    const KIND: IdentityKind;

    /// Identity of the object; the IP is empty when none is assigned yet.
    fn to_identity(&self) -> IdentityRecord;
}

impl ToIdentity for Pod {
    const KIND: IdentityKind = IdentityKind::WorkloadInstance;

    fn to_identity(&self) -> IdentityRecord {
        // Host-network pods report the node address; the last one applied owns it
        let ip = self
            .status
            .as_ref()
            .and_then(|s| s.pod_ip.clone())
            .unwrap_or_default();

        IdentityRecord::new(
            Self::KIND,
            self.metadata.namespace.clone().unwrap_or_default(),
            self.metadata.name.clone().unwrap_or_default(),
            ip,
        )
    }
}

impl ToIdentity for Service {
    const KIND: IdentityKind = IdentityKind::StableEndpoint;

    fn to_identity(&self) -> IdentityRecord {
        let ip = self
            .spec
            .as_ref()
            .and_then(|s| s.cluster_ip.clone())
            .unwrap_or_default();

        IdentityRecord::new(
            Self::KIND,
            self.metadata.namespace.clone().unwrap_or_default(),
            self.metadata.name.clone().unwrap_or_default(),
            ip,
        )
    }
}

/// Build a client from an explicit kubeconfig path, or infer one
/// (in-cluster service account, then `$KUBECONFIG` / `~/.kube/config`).
///
/// The API server is probed once so that bad credentials or an unreachable
/// control plane fail here rather than later in the watch loops.
pub async fn connect(kubeconfig: Option<&str>) -> Result<Client, ConfigurationError> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|source| {
                ConfigurationError::Kubeconfig {
                    path: path.to_string(),
                    source,
                }
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|source| ConfigurationError::Kubeconfig {
                    path: path.to_string(),
                    source,
                })?
        }
        None => Config::infer().await?,
    };

    let client = Client::try_from(config).map_err(ConfigurationError::Client)?;

    let version = client
        .apiserver_version()
        .await
        .map_err(ConfigurationError::Unreachable)?;
    tracing::info!("connected to Kubernetes API server {}", version.git_version);

    Ok(client)
}

/// Cluster-wide watch over one resource type.
pub struct KubernetesIdentitySource<K> {
    api: Api<K>,
}

impl<K> KubernetesIdentitySource<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    /// Watch `K` in all namespaces.
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

impl<K> IdentitySource for KubernetesIdentitySource<K>
where
    K: Resource + ToIdentity + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    fn kind(&self) -> IdentityKind {
        K::KIND
    }

    fn events(&self) -> BoxStream<'static, Result<IdentityEvent, IdentitySourceError>> {
        watcher(self.api.clone(), watcher::Config::default())
            .default_backoff()
            .map(|event| {
                event
                    .map(map_event)
                    .map_err(|e| IdentitySourceError::Watch(e.to_string()))
            })
            .boxed()
    }
}

/// Translate a watcher event.
fn map_event<K: ToIdentity>(event: watcher::Event<K>) -> IdentityEvent {
    match event {
        watcher::Event::Apply(obj) => IdentityEvent::Apply(obj.to_identity()),
        watcher::Event::Delete(obj) => IdentityEvent::Delete(obj.to_identity()),
        watcher::Event::Init => IdentityEvent::Init,
        watcher::Event::InitApply(obj) => IdentityEvent::InitApply(obj.to_identity()),
        watcher::Event::InitDone => IdentityEvent::InitDone,
    }
}
