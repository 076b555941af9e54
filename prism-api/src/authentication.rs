use actix_web::{Error, dev::ServiceRequest, web::Data};
use actix_web_httpauth::extractors::{
    AuthenticationError,
    bearer::{BearerAuth, Config},
};
use constant_time_eq::constant_time_eq_n;

use crate::config::{ApiConfig, ApiKey};

/// Validates the bearer token against the configured API keys.
///
/// Every key in `api_keys` is accepted, which allows keys to be rotated
/// without downtime. Comparison is constant time.
pub async fn auth_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let config = req
        .app_data::<Config>()
        .cloned()
        .unwrap_or_default()
        .scope("v1");

    let api_config = req
        .app_data::<Data<ApiConfig>>()
        .expect("missing api configuration");

    let token: ApiKey = match credentials.token().try_into() {
        Ok(token) => token,
        Err(_) => {
            return Err((AuthenticationError::from(config).into(), req));
        }
    };

    for configured_key in &api_config.api_keys {
        if let Ok(api_key) = ApiKey::try_from(configured_key.as_str())
            && constant_time_eq_n(&api_key.key, &token.key)
        {
            return Ok(req);
        }
    }

    Err((AuthenticationError::from(config).into(), req))
}
