#![allow(dead_code)]

use std::io;
use std::net::TcpListener;
use std::sync::Arc;

use prism::prometheus::MetricsQuerier;
use prism_api::k8s::K8sClient;
use prism_api::{config::ApiConfig, startup::run};
use prism_config::{Environment, load_config};
use rand::random_range;
use reqwest::{IntoUrl, RequestBuilder};

use crate::support::mocks::{FakeQuerier, MockK8sClient};

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub api_key: String,
    server_handle: tokio::task::JoinHandle<io::Result<()>>,
}

impl TestApp {
    fn get_authenticated<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.api_client.get(url).bearer_auth(self.api_key.clone())
    }

    pub async fn get_workload_metrics(&self, workload: &str, query: &str) -> reqwest::Response {
        self.get_authenticated(format!(
            "{}/v1/workloads/{workload}/metrics{query}",
            &self.address
        ))
        .send()
        .await
        .expect("failed to execute request")
    }

    pub async fn get_pod_metrics(&self, pod: &str, query: &str) -> reqwest::Response {
        self.get_authenticated(format!("{}/v1/pods/{pod}/metrics{query}", &self.address))
            .send()
            .await
            .expect("failed to execute request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_test_app_with_querier(Arc::new(FakeQuerier), None).await
}

/// Spawns the API against mock clients, optionally overriding the batch
/// deadline in seconds.
pub async fn spawn_test_app_with_querier(
    querier: Arc<dyn MetricsQuerier>,
    timeout_secs: Option<u64>,
) -> TestApp {
    // We set the environment to dev.
    Environment::Dev.set();

    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let mut config = load_config::<ApiConfig>().expect("Failed to read configuration");
    if let Some(timeout_secs) = timeout_secs {
        config.query.timeout_secs = timeout_secs;
    }

    // We choose a random API key from the ones configured to show that rotation works.
    let api_key_index = random_range(0..config.api_keys.len());
    let api_key = config.api_keys[api_key_index].clone();

    let k8s_client = Some(Arc::new(MockK8sClient) as Arc<dyn K8sClient>);

    let server = run(config, listener, querier, k8s_client)
        .await
        .expect("failed to bind address");

    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        api_client: reqwest::Client::new(),
        api_key,
        server_handle,
    }
}
