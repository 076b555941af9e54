use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};

use crate::k8s::base::{K8sClient, K8sError, PodSummary};

/// [`K8sClient`] implementation backed by the [`kube`] crate.
///
/// Uses the ambient configuration (in-cluster or local `~/.kube/config`).
#[derive(Clone)]
pub struct HttpK8sClient {
    client: Client,
}

impl HttpK8sClient {
    pub async fn new() -> Result<HttpK8sClient, K8sError> {
        let client = Client::try_default().await?;

        Ok(HttpK8sClient { client })
    }
}

#[async_trait]
impl K8sClient for HttpK8sClient {
    async fn get_workload_pods(
        &self,
        namespace: &str,
        workload: &str,
    ) -> Result<Vec<PodSummary>, K8sError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployment = deployments
            .get_opt(workload)
            .await?
            .ok_or_else(|| K8sError::WorkloadNotFound(workload.to_string()))?;

        let match_labels = deployment
            .spec
            .and_then(|spec| spec.selector.match_labels)
            .filter(|labels| !labels.is_empty())
            .ok_or_else(|| K8sError::MissingSelector(workload.to_string()))?;

        let selector = match_labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",");

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod_list = pods.list(&ListParams::default().labels(&selector)).await?;

        Ok(pod_list.items.iter().map(PodSummary::from).collect())
    }

    async fn get_pod(&self, namespace: &str, pod: &str) -> Result<PodSummary, K8sError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod_resource = pods
            .get_opt(pod)
            .await?
            .ok_or_else(|| K8sError::PodNotFound(pod.to_string()))?;

        Ok(PodSummary::from(&pod_resource))
    }
}
