use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;

/// Errors emitted by the Kubernetes integration.
///
/// Variants wrap lower-level libraries where appropriate to preserve context.
#[derive(Debug, Error)]
pub enum K8sError {
    /// A serialization or deserialization error while building or parsing
    /// Kubernetes resources.
    #[error("An error occurred in serde when dealing with K8s: {0}")]
    Serde(#[from] serde_json::error::Error),
    /// An error returned by the [`kube`] client when talking to the API
    /// server.
    #[error("An error occurred with kube when dealing with K8s: {0}")]
    Kube(#[from] kube::Error),
    /// The requested workload does not exist in the configured namespace.
    #[error("The workload {0} was not found")]
    WorkloadNotFound(String),
    /// The requested workload has no pod selector to resolve pods with.
    #[error("The workload {0} has no pod selector")]
    MissingSelector(String),
    /// The requested pod does not exist in the configured namespace.
    #[error("The pod {0} was not found")]
    PodNotFound(String),
}

/// A simplified view of a pod phase.
///
/// This mirrors the string phases reported by Kubernetes, with one addition:
/// a pod whose deletion timestamp is set reports [`PodPhase::Terminating`]
/// regardless of its underlying phase. Unknown values map to
/// [`PodPhase::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Terminating,
    Unknown,
}

impl From<&str> for PodPhase {
    /// Converts a Kubernetes pod phase string into a [`PodPhase`].
    ///
    /// Unrecognized values result in [`PodPhase::Unknown`].
    fn from(value: &str) -> Self {
        match value {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Terminating => "terminating",
            PodPhase::Unknown => "Unknown",
        };
        write!(f, "{phase}")
    }
}

/// The subset of pod metadata the API renders.
#[derive(Debug, Clone)]
pub struct PodSummary {
    pub name: String,
    pub phase: PodPhase,
    /// Pod creation time as a unix timestamp in seconds.
    pub created_at_ts: i64,
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let created_at_ts = pod
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|time| time.0.timestamp())
            .unwrap_or_default();

        // A pod with a deletion timestamp is on its way out regardless of
        // the phase it still reports.
        let phase = if pod.metadata.deletion_timestamp.is_some() {
            PodPhase::Terminating
        } else {
            pod.status
                .as_ref()
                .and_then(|status| status.phase.as_deref())
                .map(PodPhase::from)
                .unwrap_or(PodPhase::Unknown)
        };

        Self {
            name,
            phase,
            created_at_ts,
        }
    }
}

/// Client interface describing the Kubernetes operations used by the API.
#[async_trait]
pub trait K8sClient: Send + Sync {
    /// Resolves the pods currently backing `workload`'s Deployment in
    /// `namespace`, via the Deployment's pod selector.
    async fn get_workload_pods(
        &self,
        namespace: &str,
        workload: &str,
    ) -> Result<Vec<PodSummary>, K8sError>;

    /// Returns a single pod by name.
    async fn get_pod(&self, namespace: &str, pod: &str) -> Result<PodSummary, K8sError>;
}
