use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;
use futures_util::{StreamExt, stream};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use std::convert::Infallible;
use tracing::debug;

use crate::error::DavError;
use crate::options::{Body, RequestOptions, UploadProgress, UploadProgressFn};
use crate::transport::{Response, Transport};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// The built-in transport, backed by reqwest.
///
/// Uses the request's agent for its URL scheme when one is supplied and its
/// own client otherwise.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn execute(&self, request: RequestOptions) -> Result<Response, DavError> {
        let client = request.agent().unwrap_or(&self.http_client);
        let mut request_builder = client.request(request.method.clone(), &request.url);

        if let Some(headers) = &request.headers {
            request_builder = request_builder.headers(headers.clone());
        }

        if let Some(data) = request.data.clone() {
            let is_json = matches!(data, Body::Json(_));
            let bytes = data.into_bytes()?;
            let length = bytes.len() as u64;

            if let Some(limit) = request.max_body_length
                && length > limit
            {
                return Err(DavError::BodyLengthExceeded { limit, length });
            }

            let has_content_type = request
                .headers
                .as_ref()
                .is_some_and(|headers| headers.contains_key(CONTENT_TYPE));
            if is_json && !has_content_type {
                request_builder =
                    request_builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }

            request_builder = match &request.on_upload_progress {
                Some(callback) => request_builder
                    .header(CONTENT_LENGTH, length)
                    .body(progress_body(bytes, callback.clone())),
                None => request_builder.body(bytes),
            };
        }

        debug!(method = %request.method, url = %request.url, "sending request");
        let mut response = request_builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if let Some(limit) = request.max_content_length
            && response.content_length().is_some_and(|length| length > limit)
        {
            return Err(DavError::ContentLengthExceeded { limit });
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if let Some(limit) = request.max_content_length
                && body.len() as u64 > limit
            {
                return Err(DavError::ContentLengthExceeded { limit });
            }
        }
        let body = body.freeze();

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            url = %request.url,
            "received response"
        );

        if !request.is_status_valid(status.as_u16()) {
            return Err(DavError::StatusError {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, request: RequestOptions) -> BoxFuture<'a, Result<Response, DavError>> {
        Box::pin(self.execute(request))
    }
}

/// Stream `bytes` in fixed-size chunks, reporting progress as each chunk is
/// pulled by the connection.
fn progress_body(bytes: Bytes, callback: UploadProgressFn) -> reqwest::Body {
    let total = bytes.len() as u64;
    // An empty body yields no chunks, so its single completion event is
    // reported up front
    if total == 0 {
        callback(UploadProgress {
            loaded: 0,
            total: Some(0),
        });
        return reqwest::Body::from(bytes);
    }

    let chunks = upload_chunks(bytes);
    let mut loaded = 0u64;
    let reporting = stream::iter(chunks).map(move |chunk| {
        loaded += chunk.len() as u64;
        callback(UploadProgress {
            loaded,
            total: Some(total),
        });
        Ok::<Bytes, Infallible>(chunk)
    });
    reqwest::Body::wrap_stream(reporting)
}

fn upload_chunks(bytes: Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(UPLOAD_CHUNK_SIZE));
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + UPLOAD_CHUNK_SIZE).min(bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}
