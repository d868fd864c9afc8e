//! JWT request authentication
//!
//! [`JwtAuthFilter`] runs the whole pipeline for one request: locate a
//! credential, verify it, map the claims to a principal and check the role.
//! Every failure except a backend error from the [`Authenticator`] ends in
//! the same unauthorized response.

use std::fmt::Debug;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::Algorithm;
use tracing::{debug, error};

use super::credentials::CredentialExtractor;
use super::unauthorized::{DefaultUnauthorizedHandler, UnauthorizedHandler};
use crate::api::types::ApiError;
use crate::config::JwtSettings;
use crate::domain::{Authenticator, Authorizer, DomainError, KeySet, PermitAll};
use crate::infrastructure::auth::{Clock, JwtBundle, SystemClock, TokenVerifier};

/// Everything the filter needs, checked once by [`JwtAuthFilter::new`]
pub struct JwtAuthOptions<P> {
    pub keys: Arc<KeySet>,
    pub issuer: String,
    pub algorithm: Algorithm,
    pub query_parameter_name: String,
    /// `None` disables cookie lookup
    pub cookie_name: Option<String>,
    pub header_prefix: String,
    /// Challenge realm, the issuer when unset
    pub realm: Option<String>,
    pub authenticator: Option<Arc<dyn Authenticator<P>>>,
    pub authorizer: Arc<dyn Authorizer<P>>,
    pub unauthorized_handler: Arc<dyn UnauthorizedHandler>,
    pub clock: Arc<dyn Clock>,
    pub enforce_expiry: bool,
    pub expiry_leeway_secs: u64,
}

impl<P: Send + Sync + 'static> JwtAuthOptions<P> {
    /// RS256, `token` query parameter and cookie, `Bearer` prefix, permit-all
    /// authorization. The authenticator still has to be set.
    pub fn new(keys: Arc<KeySet>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            algorithm: Algorithm::RS256,
            query_parameter_name: "token".to_string(),
            cookie_name: Some("token".to_string()),
            header_prefix: "Bearer".to_string(),
            realm: None,
            authenticator: None,
            authorizer: Arc::new(PermitAll),
            unauthorized_handler: Arc::new(DefaultUnauthorizedHandler),
            clock: Arc::new(SystemClock),
            enforce_expiry: true,
            expiry_leeway_secs: 0,
        }
    }

    pub fn from_settings(settings: &JwtSettings, keys: Arc<KeySet>) -> Result<Self, DomainError> {
        Ok(Self {
            algorithm: settings.algorithm()?,
            query_parameter_name: settings.query_parameter_name.clone(),
            cookie_name: settings.cookie().map(str::to_string),
            header_prefix: settings.header_prefix.clone(),
            enforce_expiry: settings.enforce_expiry,
            expiry_leeway_secs: settings.expiry_leeway_secs,
            ..Self::new(keys, settings.issuer.clone())
        })
    }

    /// Options matching the bundle's settings, key set and clock
    pub async fn from_bundle(bundle: &JwtBundle) -> Result<Self, DomainError> {
        let keys = bundle.key_set().await?;
        let mut options = Self::from_settings(bundle.settings(), keys)?;
        options.clock = bundle.clock();
        Ok(options)
    }
}

/// Authenticates requests. Built once, shared by every guarded route.
pub struct JwtAuthFilter<P> {
    verifier: TokenVerifier,
    credentials: CredentialExtractor,
    realm: String,
    authenticator: Arc<dyn Authenticator<P>>,
    authorizer: Arc<dyn Authorizer<P>>,
    unauthorized_handler: Arc<dyn UnauthorizedHandler>,
}

impl<P> Debug for JwtAuthFilter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthFilter")
            .field("verifier", &self.verifier)
            .field("credentials", &self.credentials)
            .field("realm", &self.realm)
            .field("unauthorized_handler", &self.unauthorized_handler)
            .finish()
    }
}

impl<P: Send + Sync + 'static> JwtAuthFilter<P> {
    pub fn new(options: JwtAuthOptions<P>) -> Result<Self, DomainError> {
        let authenticator = options
            .authenticator
            .ok_or_else(|| DomainError::configuration("An authenticator is required"))?;

        if options.query_parameter_name.trim().is_empty() {
            return Err(DomainError::configuration("Query parameter name must not be empty"));
        }

        let prefix = options.header_prefix.trim();
        if prefix.is_empty() || prefix.contains(char::is_whitespace) {
            return Err(DomainError::configuration(format!(
                "Invalid authorization header prefix '{}'",
                options.header_prefix
            )));
        }

        let verifier = TokenVerifier::new(&options.keys, options.issuer.clone(), options.algorithm)?
            .with_clock(options.clock)
            .with_expiry(options.enforce_expiry, options.expiry_leeway_secs);

        Ok(Self {
            verifier,
            credentials: CredentialExtractor::new(
                options.query_parameter_name,
                options.cookie_name,
                prefix,
            ),
            realm: options.realm.unwrap_or(options.issuer),
            authenticator,
            authorizer: options.authorizer,
            unauthorized_handler: options.unauthorized_handler,
        })
    }

    /// Run the pipeline. `Ok(None)` for any rejection, `Err` only when the
    /// authenticator itself failed.
    pub async fn authenticate(
        &self,
        parts: &Parts,
        role: Option<&str>,
    ) -> Result<Option<P>, DomainError> {
        let Some(credential) = self.credentials.extract(parts) else {
            debug!("No credential in request");
            return Ok(None);
        };

        let claims = match self.verifier.verify(&credential.token) {
            Ok(claims) => claims,
            Err(rejection) => {
                debug!(location = %credential.location, reason = %rejection, "Token rejected");
                return Ok(None);
            }
        };

        let principal = match self.authenticator.authenticate(&claims).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                debug!(location = %credential.location, "Authenticator rejected claims");
                return Ok(None);
            }
            Err(e) => {
                error!(error = %e, "Authenticator failed");
                return Err(e);
            }
        };

        if let Some(role) = role {
            if !self.authorizer.authorize(&principal, role) {
                debug!(role, "Principal lacks role");
                return Ok(None);
            }
        }

        Ok(Some(principal))
    }

    pub fn unauthorized(&self) -> Response {
        self.unauthorized_handler
            .build_response(self.credentials.header_prefix(), &self.realm)
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }
}

/// Middleware state: the shared filter and the role a route requires
pub struct JwtGuard<P> {
    filter: Arc<JwtAuthFilter<P>>,
    role: Option<String>,
}

impl<P> Clone for JwtGuard<P> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            role: self.role.clone(),
        }
    }
}

impl<P> JwtGuard<P> {
    pub fn new(filter: Arc<JwtAuthFilter<P>>) -> Self {
        Self { filter, role: None }
    }

    /// Same filter, additionally requiring `role`
    pub fn with_role(&self, role: impl Into<String>) -> Self {
        Self {
            filter: self.filter.clone(),
            role: Some(role.into()),
        }
    }
}

/// Principal of an authenticated request.
///
/// Inserted into the request extensions by [`require_jwt`] and extracted by
/// handlers behind it.
#[derive(Debug, Clone)]
pub struct Authenticated<P>(pub P);

/// Use with `axum::middleware::from_fn_with_state(guard, require_jwt::<P>)`
pub async fn require_jwt<P>(State(guard): State<JwtGuard<P>>, request: Request, next: Next) -> Response
where
    P: Clone + Send + Sync + 'static,
{
    let (mut parts, body) = request.into_parts();

    match guard.filter.authenticate(&parts, guard.role.as_deref()).await {
        Ok(Some(principal)) => {
            parts.extensions.insert(Authenticated(principal));
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(None) => guard.filter.unauthorized(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

impl<S, P> FromRequestParts<S> for Authenticated<P>
where
    S: Send + Sync,
    P: Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated<P>>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::MockAuthenticator;
    use crate::domain::ClaimsSet;
    use crate::infrastructure::auth::FixedClock;
    use crate::test_support::{factory, factory_with, key_set, other_key_set, TEST_ISSUER, TEST_NOW};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn token(subject: &str) -> String {
        factory()
            .mint(ClaimsSet::new().with_claim("sub", subject))
            .unwrap()
            .into_string()
    }

    /// Accepts any token whose `sub` is in `accepted`
    fn authenticator(accepted: &'static [&'static str]) -> MockAuthenticator<String> {
        let mut mock = MockAuthenticator::<String>::new();
        mock.expect_authenticate().returning(move |claims| {
            Ok(claims
                .get_str("sub")
                .filter(|sub| accepted.contains(sub))
                .map(str::to_string))
        });
        mock
    }

    fn options(authenticator: MockAuthenticator<String>) -> JwtAuthOptions<String> {
        let mut options = JwtAuthOptions::new(Arc::new(key_set()), TEST_ISSUER);
        options.authenticator = Some(Arc::new(authenticator));
        options.clock = Arc::new(FixedClock::new(TEST_NOW));
        options
    }

    fn app(options: JwtAuthOptions<String>) -> Router {
        let guard = JwtGuard::new(Arc::new(JwtAuthFilter::new(options).unwrap()));

        let admin = Router::new()
            .route("/admin", get(whoami))
            .layer(from_fn_with_state(guard.with_role("admin"), require_jwt::<String>));

        Router::new()
            .route("/me", get(whoami))
            .layer(from_fn_with_state(guard, require_jwt::<String>))
            .merge(admin)
    }

    async fn whoami(Authenticated(principal): Authenticated<String>) -> String {
        principal
    }

    async fn send(app: Router, request: HttpRequest<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> axum::http::request::Builder {
        HttpRequest::builder().method("GET").uri(uri)
    }

    #[tokio::test]
    async fn test_bearer_header() {
        let request = get_request("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(options(authenticator(&["alice"]))), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn test_query_parameter_has_priority() {
        let request = get_request(&format!("/me?token={}", token("Q")))
            .header(header::COOKIE, format!("token={}", token("C")))
            .header(header::AUTHORIZATION, format!("Bearer {}", token("H")))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(options(authenticator(&["Q"]))), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Q");
    }

    #[tokio::test]
    async fn test_no_fallback_after_first_candidate() {
        // the query token is rejected, the valid header token is never tried
        let request = get_request(&format!("/me?token={}", token("Q")))
            .header(header::AUTHORIZATION, format!("Bearer {}", token("H")))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(options(authenticator(&["H"]))), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_query_parameter_blocks_cookie() {
        let request = get_request("/me?token=")
            .header(header::COOKIE, format!("token={}", token("C")))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(options(authenticator(&["C"]))), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_cookie_blocks_header() {
        let request = get_request("/me")
            .header(header::COOKIE, "token=")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("H")))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(options(authenticator(&["H"]))), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cookie_used_with_foreign_authorization_scheme() {
        let request = get_request("/me")
            .header(header::COOKIE, format!("token={}", token("C")))
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(options(authenticator(&["C"]))), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "C");
    }

    #[tokio::test]
    async fn test_missing_credential_is_unauthorized() {
        let request = get_request("/me").body(Body::empty()).unwrap();

        let response = app(options(authenticator(&["alice"])))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            format!("Bearer realm=\"{}\"", TEST_ISSUER)
        );
    }

    #[tokio::test]
    async fn test_rejections_are_indistinguishable() {
        let foreign = factory_with(other_key_set()).mint_empty().unwrap().into_string();
        let cases = [
            format!("Bearer {}", foreign),
            "Bearer not.a.jwt".to_string(),
            format!("Bearer {}", token("mallory")),
        ];

        let (_, reference) = send(
            app(options(authenticator(&["alice"]))),
            get_request("/me").body(Body::empty()).unwrap(),
        )
        .await;

        for value in cases {
            let request = get_request("/me")
                .header(header::AUTHORIZATION, value)
                .body(Body::empty())
                .unwrap();

            let (status, body) = send(app(options(authenticator(&["alice"]))), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, reference);
        }
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let mut options = options(authenticator(&["alice"]));
        options.clock = Arc::new(FixedClock::new(TEST_NOW + 7200));

        let request = get_request("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(options), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_backend_error_is_server_error() {
        let mut mock = MockAuthenticator::<String>::new();
        mock.expect_authenticate()
            .returning(|_| Err(DomainError::authentication("directory unreachable")));

        let request = get_request("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(options(mock)), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("authentication_backend_error"));
    }

    #[tokio::test]
    async fn test_role_check() {
        let mut options = options(authenticator(&["root", "guest"]));
        options.authorizer = Arc::new(|principal: &String, role: &str| principal == "root" && role == "admin");
        let app = app(options);

        let as_user = |subject: &str| {
            get_request("/admin")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(subject)))
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) = send(app.clone(), as_user("root")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "root");

        let (status, _) = send(app.clone(), as_user("guest")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // no role required on /me
        let request = get_request("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("guest")))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disabled_cookie() {
        let mut options = options(authenticator(&["C"]));
        options.cookie_name = None;

        let request = get_request("/me")
            .header(header::COOKIE, format!("token={}", token("C")))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(options), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_eager_validation() {
        let missing_authenticator = JwtAuthOptions::<String>::new(Arc::new(key_set()), TEST_ISSUER);
        assert!(JwtAuthFilter::new(missing_authenticator).is_err());

        let mut empty_issuer = options(authenticator(&[]));
        empty_issuer.issuer = String::new();
        assert!(JwtAuthFilter::new(empty_issuer).is_err());

        let mut bad_prefix = options(authenticator(&[]));
        bad_prefix.header_prefix = "Bea rer".to_string();
        assert!(JwtAuthFilter::new(bad_prefix).is_err());

        let mut hmac = options(authenticator(&[]));
        hmac.algorithm = Algorithm::HS256;
        assert!(JwtAuthFilter::new(hmac).is_err());
    }
}
