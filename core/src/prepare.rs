use std::sync::Arc;
use tracing::trace;

use crate::merge::merge_headers;
use crate::options::{RequestOptions, StatusValidator, UserOptions};

/// Apply caller overrides to a request descriptor.
///
/// Only fields present in `options` are written. Headers are merged key by
/// key with the caller's values winning. Supplying a digest context also
/// installs [`digest_status_validator`], so the 401 challenge reaches the
/// auth layer as a response instead of an error.
pub fn prepare_request_options(request: &mut RequestOptions, options: &UserOptions) {
    if let Some(agent) = &options.http_agent {
        request.http_agent = Some(agent.clone());
    }
    if let Some(agent) = &options.https_agent {
        request.https_agent = Some(agent.clone());
    }
    if let Some(data) = options.data.as_ref().filter(|data| data.is_present()) {
        request.data = Some(data.clone());
    }
    if let Some(headers) = &options.headers {
        request.headers = Some(match &request.headers {
            Some(existing) => merge_headers(existing, headers),
            None => headers.clone(),
        });
    }
    if let Some(with_credentials) = options.with_credentials {
        request.with_credentials = Some(with_credentials);
    }
    if let Some(limit) = options.max_content_length.filter(|limit| *limit > 0) {
        request.max_content_length = Some(limit);
    }
    if let Some(limit) = options.max_body_length.filter(|limit| *limit > 0) {
        request.max_body_length = Some(limit);
    }
    if let Some(callback) = &options.on_upload_progress {
        request.on_upload_progress = Some(Arc::clone(callback));
    }
    if let Some(digest) = &options.digest {
        request.digest = Some(digest.clone());
        request.validate_status = Some(digest_status_validator());
    }

    trace!(
        method = %request.method,
        url = %request.url,
        digest = request.digest.is_some(),
        "prepared request options"
    );
}

/// Accepts any 2xx status, plus 401 for digest challenges.
pub fn digest_status_validator() -> StatusValidator {
    Arc::new(|status| (200..300).contains(&status) || status == 401)
}
