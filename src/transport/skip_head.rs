//! HEAD-suppressing transport decorator.
//!
//! Registries answer "does this blob already exist" with a HEAD request
//! before every layer upload. Against rate-limited registries those probes
//! count against the quota, so this layer answers every HEAD locally with
//! `404 Not Found`. The push pipeline then treats each layer as missing and
//! uploads it. All other methods pass through to the wrapped transport
//! untouched.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use futures_util::future::{self, Either, Ready};
use tower::{Layer, Service};

use crate::observability::metrics;

/// Label printed in front of each suppression notice.
pub const DEFAULT_LABEL: &str = env!("CARGO_PKG_NAME");

/// The line announcing a suppressed HEAD request, without the newline.
pub fn notice(label: &str, uri: &Uri) -> String {
    format!("{label}: skipping HEAD request to {uri} (--skip-existing-layers-check)")
}

/// Identifies the request a synthesized response answers.
///
/// Attached to the response extensions so callers can tell a local 404 from
/// one the registry sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRequest {
    pub method: Method,
    pub uri: Uri,
}

/// Where suppression notices are written.
#[derive(Clone)]
enum NoticeSink {
    Stdout,
    Writer(Arc<Mutex<dyn Write + Send>>),
}

impl NoticeSink {
    fn emit(&self, line: &str) -> io::Result<()> {
        match self {
            NoticeSink::Stdout => writeln!(io::stdout().lock(), "{line}"),
            NoticeSink::Writer(writer) => {
                let mut writer = writer
                    .lock()
                    .map_err(|_| io::Error::other("notice writer poisoned"))?;
                writeln!(writer, "{line}")?;
                writer.flush()
            }
        }
    }
}

impl fmt::Debug for NoticeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeSink::Stdout => f.write_str("Stdout"),
            NoticeSink::Writer(_) => f.write_str("Writer"),
        }
    }
}

/// Layer that wraps a transport in a [`SkipHeadService`].
#[derive(Debug, Clone)]
pub struct SkipHeadLayer {
    label: Arc<str>,
    sink: NoticeSink,
}

impl SkipHeadLayer {
    pub fn new() -> Self {
        Self::with_label(DEFAULT_LABEL)
    }

    /// Use a different prefix for the stdout notice.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Arc::from(label.into()),
            sink: NoticeSink::Stdout,
        }
    }

    /// Write notices to `writer` instead of stdout.
    pub fn with_writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.sink = NoticeSink::Writer(Arc::new(Mutex::new(writer)));
        self
    }
}

impl Default for SkipHeadLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for SkipHeadLayer {
    type Service = SkipHeadService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SkipHeadService {
            inner,
            label: Arc::clone(&self.label),
            sink: self.sink.clone(),
        }
    }
}

/// Transport that answers HEAD requests with a canned 404.
#[derive(Debug, Clone)]
pub struct SkipHeadService<S> {
    inner: S,
    label: Arc<str>,
    sink: NoticeSink,
}

impl<S> SkipHeadService<S> {
    /// The wrapped transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    fn announce(&self, uri: &Uri) {
        if let Err(e) = self.sink.emit(&notice(&self.label, uri)) {
            tracing::warn!(url = %uri, error = %e, "Failed to write skip notice");
        }
        tracing::debug!(url = %uri, "Suppressed HEAD request");
        metrics::record_head_skipped();
    }
}

impl<S> Service<Request<Body>> for SkipHeadService<S>
where
    S: Service<Request<Body>, Response = Response<Body>>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response<Body>, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if req.method() == Method::HEAD {
            self.announce(req.uri());
            return Either::Left(future::ready(Ok(not_found(&req))));
        }

        metrics::record_forwarded(req.method());
        Either::Right(self.inner.call(req))
    }
}

/// Build the synthetic response for a suppressed request.
fn not_found(req: &Request<Body>) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NOT_FOUND;
    *response.headers_mut() = HeaderMap::new();
    response.extensions_mut().insert(SkippedRequest {
        method: req.method().clone(),
        uri: req.uri().clone(),
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::{service_fn, ServiceExt};

    fn counting_transport(
        calls: Arc<AtomicUsize>,
    ) -> impl Service<Request<Body>, Response = Response<Body>, Error = TransportError> + Clone {
        service_fn(move |_req: Request<Body>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let mut response = Response::new(Body::from("upstream"));
                *response.status_mut() = StatusCode::ACCEPTED;
                response.headers_mut().insert("x-upstream", "yes".parse().unwrap());
                Ok::<_, TransportError>(response)
            }
        })
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_head_is_answered_locally() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = SkipHeadLayer::new().layer(counting_transport(calls.clone()));

        let uri = "http://registry.local/v2/library/alpine/blobs/sha256:abc";
        let res = svc.oneshot(request(Method::HEAD, uri)).await.unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0, "wrapped transport must not be called");

        let skipped = res.extensions().get::<SkippedRequest>().unwrap();
        assert_eq!(skipped.method, Method::HEAD);
        assert_eq!(skipped.uri, uri.parse::<Uri>().unwrap());

        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_pass_through_once() {
        for method in [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let calls = Arc::new(AtomicUsize::new(0));
            let svc = SkipHeadLayer::with_label("test").layer(counting_transport(calls.clone()));

            let res = svc
                .oneshot(request(method.clone(), "http://registry.local/v2/"))
                .await
                .unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 1, "{} should be forwarded once", method);
            assert_eq!(res.status(), StatusCode::ACCEPTED);
            assert_eq!(res.headers()["x-upstream"], "yes");
            assert!(res.extensions().get::<SkippedRequest>().is_none());
            let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
            assert_eq!(&body[..], b"upstream");
        }
    }

    #[tokio::test]
    async fn test_upstream_error_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cc = calls.clone();
        let failing = service_fn(move |_req: Request<Body>| {
            let cc = cc.clone();
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<Response<Body>, _>(TransportError::InvalidRequest("boom".into()))
            }
        });
        let svc = SkipHeadLayer::new().layer(failing);

        let err = svc
            .oneshot(request(Method::GET, "http://registry.local/v2/"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::InvalidRequest(ref m) if m == "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_head_skipped_even_when_upstream_fails() {
        let failing = service_fn(|_req: Request<Body>| async {
            Err::<Response<Body>, _>(TransportError::InvalidRequest("unreachable".into()))
        });
        let svc = SkipHeadLayer::new().layer(failing);

        let res = svc
            .oneshot(request(Method::HEAD, "http://registry.local/v2/"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_notice_format() {
        let uri: Uri = "https://registry-1.docker.io/v2/library/alpine/blobs/sha256:abc"
            .parse()
            .unwrap();
        assert_eq!(
            notice("nerdctl", &uri),
            "nerdctl: skipping HEAD request to https://registry-1.docker.io/v2/library/alpine/blobs/sha256:abc (--skip-existing-layers-check)"
        );
        assert!(notice(DEFAULT_LABEL, &uri).starts_with("registry-nocheck: skipping HEAD"));
    }

    #[tokio::test]
    async fn test_one_notice_line_per_skipped_head() {
        let calls = Arc::new(AtomicUsize::new(0));
        let out = SharedBuf::default();
        let layer = SkipHeadLayer::with_label("push").with_writer(out.clone());
        let svc = layer.layer(counting_transport(calls.clone()));

        let first = "http://registry.local/v2/app/blobs/sha256:aa";
        let second = "http://registry.local/v2/app/blobs/sha256:bb";
        svc.clone().oneshot(request(Method::HEAD, first)).await.unwrap();
        svc.clone().oneshot(request(Method::HEAD, second)).await.unwrap();

        assert_eq!(
            out.contents(),
            format!(
                "push: skipping HEAD request to {first} (--skip-existing-layers-check)\n\
                 push: skipping HEAD request to {second} (--skip-existing-layers-check)\n"
            )
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forwarded_requests_write_no_notice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let out = SharedBuf::default();
        let svc = SkipHeadLayer::new()
            .with_writer(out.clone())
            .layer(counting_transport(calls.clone()));

        for method in [Method::GET, Method::PUT, Method::POST] {
            svc.clone()
                .oneshot(request(method, "http://registry.local/v2/app/blobs/uploads/"))
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(out.contents().is_empty());
    }
}
