//! WebDAV client facade over `webdav-request-core`.

pub mod client;

pub use client::{Client, ClientConfig};

// Re-export core types
pub use webdav_request_core::{
    Body, Bytes, DavError, DigestContext, Dispatcher, HttpTransport, Method, RequestOptions,
    Response, StatusCode, Transport, UploadProgress, UploadProgressFn, UserOptions, encode_path,
    header, join_url, transport_fn,
};
