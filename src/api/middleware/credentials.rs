//! Locating the bearer token in a request

use axum::extract::Query;
use axum::http::{header, request::Parts, HeaderMap, Uri};
use axum_extra::extract::cookie::CookieJar;

use crate::domain::{Credential, CredentialLocation};

/// Ordered token lookup: query parameter, then cookie, then `Authorization`.
///
/// The first source holding a candidate wins even if that candidate later
/// fails verification. A query parameter or cookie that is present but empty
/// is still a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialExtractor {
    query_parameter: String,
    cookie: Option<String>,
    header_prefix: String,
}

impl Default for CredentialExtractor {
    fn default() -> Self {
        Self::new("token", Some("token".to_string()), "Bearer")
    }
}

impl CredentialExtractor {
    pub fn new(
        query_parameter: impl Into<String>,
        cookie: Option<String>,
        header_prefix: impl Into<String>,
    ) -> Self {
        Self {
            query_parameter: query_parameter.into(),
            cookie: cookie.filter(|name| !name.trim().is_empty()),
            header_prefix: header_prefix.into(),
        }
    }

    pub fn query_parameter(&self) -> &str {
        &self.query_parameter
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn header_prefix(&self) -> &str {
        &self.header_prefix
    }

    pub fn extract(&self, parts: &Parts) -> Option<Credential> {
        self.from_query(&parts.uri)
            .or_else(|| self.from_cookie(&parts.headers))
            .or_else(|| self.from_authorization(&parts.headers))
    }

    fn from_query(&self, uri: &Uri) -> Option<Credential> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;

        pairs
            .into_iter()
            .find(|(name, _)| *name == self.query_parameter)
            .map(|(name, value)| Credential::new(CredentialLocation::QueryParameter(name), value))
    }

    fn from_cookie(&self, headers: &HeaderMap) -> Option<Credential> {
        let wanted = self.cookie.as_deref()?;
        let jar = CookieJar::from_headers(headers);

        jar.get(wanted).map(|cookie| {
            Credential::new(
                CredentialLocation::Cookie(wanted.to_string()),
                cookie.value_trimmed(),
            )
        })
    }

    fn from_authorization(&self, headers: &HeaderMap) -> Option<Credential> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.trim().split_once(' ')?;

        if !scheme.eq_ignore_ascii_case(&self.header_prefix) {
            return None;
        }

        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        Some(Credential::new(
            CredentialLocation::AuthorizationHeader(self.header_prefix.clone()),
            token,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn token_of(credential: Option<Credential>) -> Option<String> {
        credential.map(|c| c.token)
    }

    #[test]
    fn test_query_wins_over_cookie_and_header() {
        let parts = parts(
            "/me?token=tokQ",
            &[
                (header::COOKIE, "token=tokC"),
                (header::AUTHORIZATION, "Bearer tokH"),
            ],
        );

        let credential = CredentialExtractor::default().extract(&parts).unwrap();
        assert_eq!(credential.token, "tokQ");
        assert_eq!(credential.location, CredentialLocation::QueryParameter("token".to_string()));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let parts = parts(
            "/me",
            &[
                (header::COOKIE, "theme=dark; token=tokC"),
                (header::AUTHORIZATION, "Bearer tokH"),
            ],
        );

        assert_eq!(token_of(CredentialExtractor::default().extract(&parts)).as_deref(), Some("tokC"));
    }

    #[test]
    fn test_cookie_used_when_header_scheme_does_not_match() {
        let parts = parts(
            "/me",
            &[
                (header::COOKIE, "token=tokC"),
                (header::AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            ],
        );

        assert_eq!(token_of(CredentialExtractor::default().extract(&parts)).as_deref(), Some("tokC"));
    }

    #[test]
    fn test_header_scheme_case_insensitive() {
        let parts = parts("/me", &[(header::AUTHORIZATION, "bEaReR   tokH  ")]);

        let credential = CredentialExtractor::default().extract(&parts).unwrap();
        assert_eq!(credential.token, "tokH");
    }

    #[test]
    fn test_malformed_or_foreign_header_is_no_credential() {
        let extractor = CredentialExtractor::default();

        for value in ["Bearer", "BearertokH", "Basic abc", "Bearer    "] {
            let parts = parts("/me", &[(header::AUTHORIZATION, value)]);
            assert!(extractor.extract(&parts).is_none(), "{value}");
        }
    }

    #[test]
    fn test_disabled_cookie_is_skipped() {
        let extractor = CredentialExtractor::new("token", None, "Bearer");
        let parts = parts(
            "/me",
            &[
                (header::COOKIE, "token=tokC"),
                (header::AUTHORIZATION, "Bearer tokH"),
            ],
        );

        assert_eq!(token_of(extractor.extract(&parts)).as_deref(), Some("tokH"));
        assert_eq!(CredentialExtractor::new("token", Some(String::new()), "Bearer").cookie(), None);
    }

    #[test]
    fn test_custom_names() {
        let extractor = CredentialExtractor::new("access_token", Some("session".to_string()), "JWT");

        let query = parts("/?token=ignored&access_token=abc", &[]);
        assert_eq!(token_of(extractor.extract(&query)).as_deref(), Some("abc"));

        let cookie = parts("/", &[(header::COOKIE, "token=ignored; session=def")]);
        assert_eq!(token_of(extractor.extract(&cookie)).as_deref(), Some("def"));

        let auth = parts("/", &[(header::AUTHORIZATION, "jwt ghi")]);
        assert_eq!(token_of(extractor.extract(&auth)).as_deref(), Some("ghi"));
    }

    #[test]
    fn test_first_query_value_wins() {
        let parts = parts("/?token=first&token=second", &[]);
        assert_eq!(token_of(CredentialExtractor::default().extract(&parts)).as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_query_parameter_is_still_the_candidate() {
        let parts = parts(
            "/me?token=",
            &[
                (header::COOKIE, "token=tokC"),
                (header::AUTHORIZATION, "Bearer tokH"),
            ],
        );

        let credential = CredentialExtractor::default().extract(&parts).unwrap();
        assert_eq!(credential.location, CredentialLocation::QueryParameter("token".to_string()));
        assert_eq!(credential.token, "");
    }

    #[test]
    fn test_empty_cookie_is_still_the_candidate() {
        let parts = parts(
            "/me",
            &[
                (header::COOKIE, "token=; theme=dark"),
                (header::AUTHORIZATION, "Bearer tokH"),
            ],
        );

        let credential = CredentialExtractor::default().extract(&parts).unwrap();
        assert_eq!(credential.location, CredentialLocation::Cookie("token".to_string()));
        assert_eq!(credential.token, "");
    }

    #[test]
    fn test_quoted_cookie_value() {
        let parts = parts("/me", &[(header::COOKIE, "token=\"tokC\"")]);
        assert_eq!(token_of(CredentialExtractor::default().extract(&parts)).as_deref(), Some("tokC"));
    }

    #[test]
    fn test_no_credential() {
        let parts = parts("/me?other=1", &[(header::COOKIE, "theme=dark")]);
        assert!(CredentialExtractor::default().extract(&parts).is_none());
    }
}
