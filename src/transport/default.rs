//! Standard transport backed by the hyper-util pooled client.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower::util::BoxCloneSyncService;
use tower::Service;

use crate::error::TransportError;
use crate::transport::Transport;

/// Transport that performs real network I/O.
///
/// Speaks `https` (rustls, webpki roots) and plain `http`, over HTTP/1.1 or
/// HTTP/2 as negotiated.
#[derive(Clone, Debug)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for HyperTransport {
    type Response = Response<Body>;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<Response<Body>, TransportError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            tracing::trace!(method = %req.method(), url = %req.uri(), "Sending request");
            let response: Response<Incoming> = client.request(req).await?;
            Ok(response.map(Body::new))
        })
    }
}

/// The transport used when a client has none configured.
pub fn default_transport() -> Transport {
    BoxCloneSyncService::new(HyperTransport::new())
}
