//! Request preparation for WebDAV clients.
//!
//! Encodes paths, joins URLs, merges per-call options into a request
//! descriptor and hands the result to a pluggable [`Transport`].

pub mod error;
pub mod http;
pub mod merge;
pub mod options;
pub mod path;
pub mod prepare;
pub mod transport;
pub mod url;

pub use error::DavError;
pub use http::HttpTransport;
pub use merge::{deep_merge, merge_headers};
pub use options::{
    Body, DigestContext, RequestOptions, StatusValidator, UploadProgress, UploadProgressFn,
    UserOptions,
};
pub use path::{encode_path, encode_uri_component};
pub use prepare::{digest_status_validator, prepare_request_options};
pub use transport::{Dispatcher, FnTransport, Response, Transport, request, transport_fn};
pub use url::{join_url, join_url_parts};

pub use bytes::Bytes;
pub use reqwest::{Method, StatusCode, header};
