use std::fmt::Debug;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::api::types::ApiError;

/// Builds the response for every rejected request.
///
/// Called the same way whatever the reason for the rejection was.
pub trait UnauthorizedHandler: Send + Sync + Debug {
    fn build_response(&self, prefix: &str, realm: &str) -> Response;
}

/// 401 with a `WWW-Authenticate` challenge and a JSON error body
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUnauthorizedHandler;

impl UnauthorizedHandler for DefaultUnauthorizedHandler {
    fn build_response(&self, prefix: &str, realm: &str) -> Response {
        let mut response =
            ApiError::unauthorized("Credentials are required to access this resource.")
                .into_response();

        let challenge = format!("{} realm=\"{}\"", prefix, realm.replace('"', "'"));
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        response
    }
}
