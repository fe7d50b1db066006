use bytes::Bytes;
use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::error::DavError;
use crate::http::HttpTransport;
use crate::options::RequestOptions;

/// A response as returned by a transport.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DavError> {
        serde_json::from_slice(&self.body).map_err(DavError::from)
    }
}

/// Something that can send a prepared request.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: RequestOptions) -> BoxFuture<'a, Result<Response, DavError>>;
}

/// Hand a prepared request to `transport` and return its future untouched.
pub fn request(
    transport: &dyn Transport,
    options: RequestOptions,
) -> BoxFuture<'_, Result<Response, DavError>> {
    transport.send(options)
}

/// Dispatch point holding the transport requests are sent through.
///
/// Defaults to [`HttpTransport`]; swap it by constructing with another
/// [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn dispatch(&self, options: RequestOptions) -> BoxFuture<'_, Result<Response, DavError>> {
        debug!(method = %options.method, url = %options.url, "dispatching request");
        request(self.transport.as_ref(), options)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(HttpTransport::new()))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Adapter turning an async closure into a [`Transport`].
pub struct FnTransport<F> {
    send: F,
}

/// Wrap `send` so it can stand in for the HTTP transport.
pub fn transport_fn<F, Fut>(send: F) -> FnTransport<F>
where
    F: Fn(RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, DavError>> + Send + 'static,
{
    FnTransport { send }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, DavError>> + Send + 'static,
{
    fn send<'a>(&'a self, request: RequestOptions) -> BoxFuture<'a, Result<Response, DavError>> {
        Box::pin((self.send)(request))
    }
}
