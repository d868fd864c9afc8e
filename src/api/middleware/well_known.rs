//! Publishes the public key set at `/.well-known/jwks.json`
//!
//! Applied as a layer around the whole router so the path stays absolute
//! whatever prefixes the application routes are nested under.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};
use tracing::debug;

use crate::domain::{DomainError, KeySet};

pub const WELL_KNOWN_JWKS_PATH: &str = "/.well-known/jwks.json";

/// Serves the JWKS document; any other request goes to the wrapped service
#[derive(Debug, Clone)]
pub struct WellKnownJwksLayer {
    document: Arc<str>,
    keys: usize,
}

impl WellKnownJwksLayer {
    /// Serializes the public projection of `keys` once
    pub fn new(keys: &KeySet) -> Result<Self, DomainError> {
        let public = keys.to_public();
        let document = serde_json::to_string(&public)
            .map_err(|e| DomainError::internal(format!("Failed to serialize JWKS: {}", e)))?;

        Ok(Self {
            document: document.into(),
            keys: public.len(),
        })
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    fn respond(&self, method: &Method) -> Response {
        if method != Method::GET {
            debug!(%method, "Rejecting non-GET request for JWKS");
            return StatusCode::NOT_ACCEPTABLE.into_response();
        }

        debug!(keys = self.keys, "Serving JWKS");
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.document.to_string(),
        )
            .into_response()
    }
}

impl<S> Layer<S> for WellKnownJwksLayer {
    type Service = WellKnownJwks<S>;

    fn layer(&self, inner: S) -> Self::Service {
        WellKnownJwks {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WellKnownJwks<S> {
    inner: S,
    layer: WellKnownJwksLayer,
}

impl<S, B> Service<Request<B>> for WellKnownJwks<S>
where
    S: Service<Request<B>, Response = Response>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        if request.uri().path() == WELL_KNOWN_JWKS_PATH {
            let response = self.layer.respond(request.method());
            return Box::pin(async move { Ok(response) });
        }

        Box::pin(self.inner.call(request))
    }
}
