//! Route guard middleware layer for Axum.

use crate::extractor::AuthToken;
use axum::body::Body;
use http::{header, Request, Response, StatusCode};
use ride_admin_core::guard::{self, GuardDecision};
use ride_admin_core::traits::AuthProvider;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer that applies the dashboard route guard.
///
/// Redirect decisions only look at cookie presence. When a provider is
/// set, the token is also verified and the identity made available to
/// [`AdminSession`](crate::AdminSession).
#[derive(Clone, Default)]
pub struct GuardLayer {
    provider: Option<Arc<dyn AuthProvider>>,
}

impl GuardLayer {
    /// Creates a presence-only guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies cookie tokens with `provider`.
    pub fn verify_with(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardMiddleware {
            inner,
            provider: self.provider.clone(),
        }
    }
}

/// Middleware service that redirects according to the route guard.
#[derive(Clone)]
pub struct GuardMiddleware<S> {
    inner: S,
    provider: Option<Arc<dyn AuthProvider>>,
}

impl<S> Service<Request<Body>> for GuardMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let provider = self.provider.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let token = extract_cookie_token(&req);

            if let GuardDecision::Redirect(to) = guard::evaluate(req.uri().path(), token.is_some()) {
                tracing::debug!(path = %req.uri().path(), to, "Guard redirect");
                return Ok(redirect(to));
            }

            if let Some(token) = token {
                if let Some(provider) = provider {
                    match provider.verify_token(&token).await {
                        Ok(identity) => {
                            req.extensions_mut().insert(identity);
                        }
                        Err(e) => tracing::debug!(error = %e, "Cookie token did not verify"),
                    }
                }
                req.extensions_mut().insert(AuthToken(token));
            }

            inner.call(req).await
        })
    }
}

fn redirect(to: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SEE_OTHER;
    response
        .headers_mut()
        .insert(header::LOCATION, header::HeaderValue::from_static(to));
    response
}

/// Extracts the auth token from the cookie header.
fn extract_cookie_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(guard::token_from_cookie_header)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cookie_token() {
        let req = Request::builder()
            .header("cookie", "other=value; auth_token=token_456; another=test")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_cookie_token(&req), Some("token_456".to_string()));
    }

    #[test]
    fn test_no_token() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert!(extract_cookie_token(&req).is_none());
    }

    #[test]
    fn test_redirect_response() {
        let response = redirect(guard::LOGIN_PATH);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }
}
