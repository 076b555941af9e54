use actix_web::{HttpResponse, Responder, get};

#[utoipa::path(
    summary = "Service health",
    description = "Returns 'ok' while the server is up and able to accept requests. \
                   Does not probe the metrics backend or the cluster.",
    responses(
        (status = 200, description = "The service is healthy; returns 'ok'.", body = String),
    ),
    tag = "Health",
)]
#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("ok")
}
