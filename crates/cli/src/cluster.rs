//! Kubernetes-backed cluster source

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use doctor_lib::{
    ClusterError, ClusterSource, ContainerSpec, ContainerStatusSnapshot, PodSnapshot, RawEvent,
};
use k8s_openapi::api::core::v1::{Container, ContainerStatus, Event, Namespace, Pod};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

/// Build a client from an explicit kubeconfig, or from the environment
/// (`KUBECONFIG`, `~/.kube/config`, in-cluster service account)
pub async fn connect(kubeconfig: Option<&Path>) -> Result<Client> {
    match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Failed to load kubeconfig")?;
            Client::try_from(config).context("Failed to create Kubernetes client")
        }
        None => Client::try_default()
            .await
            .context("Failed to create Kubernetes client"),
    }
}

/// [`ClusterSource`] reading pods, events and namespaces through `kube`
pub struct KubeClusterSource {
    client: Client,
}

impl KubeClusterSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn classify_error(err: kube::Error) -> ClusterError {
    match &err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound,
        kube::Error::Api(response) if response.code == 401 || response.code == 403 => {
            ClusterError::Forbidden
        }
        _ => ClusterError::Other(err.into()),
    }
}

#[async_trait]
impl ClusterSource for KubeClusterSource {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get(name).await.map_err(classify_error)?;
        Ok(pod_snapshot(pod, namespace))
    }

    async fn list_pod_events(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Vec<RawEvent>, ClusterError> {
        let events: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!("involvedObject.name={},involvedObject.kind=Pod", pod_name);
        let list = events
            .list(&ListParams::default().fields(&selector))
            .await
            .map_err(classify_error)?;

        debug!(pod = %pod_name, namespace = %namespace, events = list.items.len(), "Listed pod events");
        Ok(list.items.into_iter().map(raw_event).collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces
            .list(&ListParams::default())
            .await
            .map_err(classify_error)?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSnapshot>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(classify_error)?;

        Ok(list
            .items
            .into_iter()
            .map(|pod| pod_snapshot(pod, namespace))
            .collect())
    }
}

fn container_spec(container: Container) -> ContainerSpec {
    ContainerSpec {
        name: container.name,
        image: container.image.unwrap_or_default(),
    }
}

fn status_snapshot(status: ContainerStatus) -> ContainerStatusSnapshot {
    let waiting_reason = |state: Option<&k8s_openapi::api::core::v1::ContainerState>| {
        state
            .and_then(|s| s.waiting.as_ref())
            .and_then(|w| w.reason.clone())
    };

    ContainerStatusSnapshot {
        waiting_reason: waiting_reason(status.state.as_ref()),
        last_waiting_reason: waiting_reason(status.last_state.as_ref()),
        name: status.name,
        restart_count: status.restart_count,
    }
}

/// Project a pod onto the fields the analysis reads
pub(crate) fn pod_snapshot(pod: Pod, namespace: &str) -> PodSnapshot {
    let spec = pod.spec.unwrap_or_default();
    let status = pod.status.unwrap_or_default();

    PodSnapshot {
        name: pod.metadata.name.unwrap_or_default(),
        namespace: pod
            .metadata
            .namespace
            .unwrap_or_else(|| namespace.to_string()),
        phase: status.phase,
        containers: spec.containers.into_iter().map(container_spec).collect(),
        init_containers: spec
            .init_containers
            .unwrap_or_default()
            .into_iter()
            .map(container_spec)
            .collect(),
        container_statuses: status
            .container_statuses
            .unwrap_or_default()
            .into_iter()
            .map(status_snapshot)
            .collect(),
        init_container_statuses: status
            .init_container_statuses
            .unwrap_or_default()
            .into_iter()
            .map(status_snapshot)
            .collect(),
    }
}

/// Project a core/v1 event, falling back to `eventTime` for missing timestamps
pub(crate) fn raw_event(event: Event) -> RawEvent {
    let event_time = event.event_time.map(|t| t.0);

    RawEvent {
        reason: event.reason.unwrap_or_default(),
        message: event.message.unwrap_or_default(),
        count: event.count.and_then(|c| u32::try_from(c).ok()),
        first_seen: event.first_timestamp.map(|t| t.0).or(event_time),
        last_seen: event.last_timestamp.map(|t| t.0).or(event_time),
    }
}
