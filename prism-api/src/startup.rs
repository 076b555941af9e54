use std::{net::TcpListener, sync::Arc, time::Duration};

use actix_web::{App, HttpServer, dev::Server, web};
use actix_web_httpauth::middleware::HttpAuthentication;
use prism::prometheus::{HttpPromClient, MetricsQuerier};
use tracing::warn;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    authentication::auth_validator,
    config::ApiConfig,
    k8s::{K8sClient, http::HttpK8sClient},
    metrics::init_metrics,
    routes::{
        ErrorMessage,
        health_check::health_check,
        metrics::metrics,
        pods::get_pod_metrics,
        workloads::{
            CpuMeasurement, CpuUsageView, MemUsageView, PodMetrics, PodStatusView,
            get_workload_metrics,
        },
    },
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: ApiConfig) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let querier = HttpPromClient::new(
            &config.prometheus.url,
            Duration::from_secs(config.prometheus.request_timeout_secs),
        )?;
        let querier = Arc::new(querier) as Arc<dyn MetricsQuerier>;

        let k8s_client = match HttpK8sClient::new().await {
            Ok(client) => Some(Arc::new(client) as Arc<dyn K8sClient>),
            Err(e) => {
                warn!(
                    "Failed to create Kubernetes client: {}. Running without Kubernetes support.",
                    e
                );
                None
            }
        };

        let server = run(config, listener, querier, k8s_client).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

// HttpK8sClient is wrapped in an option so the server can come up outside a
// cluster; the metrics routes then answer 500 via the missing app data.
// Tests inject a mock client instead.
pub async fn run(
    config: ApiConfig,
    listener: TcpListener,
    querier: Arc<dyn MetricsQuerier>,
    k8s_client: Option<Arc<dyn K8sClient>>,
) -> Result<Server, anyhow::Error> {
    let metrics_handle = init_metrics()?;

    let config = web::Data::new(config);
    let querier: web::Data<dyn MetricsQuerier> = web::Data::from(querier);
    let k8s_client: Option<web::Data<dyn K8sClient>> = k8s_client.map(Into::into);

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::routes::health_check::health_check,
            crate::routes::metrics::metrics,
            crate::routes::workloads::get_workload_metrics,
            crate::routes::pods::get_pod_metrics,
        ),
        components(schemas(
            ErrorMessage,
            PodMetrics,
            PodStatusView,
            CpuUsageView,
            MemUsageView,
            CpuMeasurement,
        ))
    )]
    struct ApiDoc;

    let openapi = ApiDoc::openapi();

    let server = HttpServer::new(move || {
        let tracing_logger = TracingLogger::default();
        let authentication = HttpAuthentication::bearer(auth_validator);
        let app = App::new()
            .wrap(
                sentry_actix::Sentry::builder()
                    .capture_server_errors(true)
                    .start_transaction(true)
                    .finish(),
            )
            .wrap(tracing_logger)
            .service(health_check)
            .service(metrics)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("v1")
                    .wrap(authentication)
                    .service(get_workload_metrics)
                    .service(get_pod_metrics),
            )
            .app_data(config.clone())
            .app_data(querier.clone())
            .app_data(web::ThinData(metrics_handle.clone()));

        if let Some(k8s_client) = k8s_client.clone() {
            app.app_data(k8s_client.clone())
        } else {
            app
        }
    })
    .listen(listener)?
    .run();

    Ok(server)
}
