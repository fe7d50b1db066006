use reqwest::Client as HttpClient;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, IntoHeaderName};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use webdav_request_core::{
    Body, Bytes, DavError, Dispatcher, HttpTransport, Method, RequestOptions, Response, Transport,
    UserOptions, encode_path, join_url, merge_headers, prepare_request_options,
};

#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: HeaderMap,
}

// Header values may carry credentials, so only names are printed
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.keys().map(|name| name.as_str()).collect();
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("headers", &header_names)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, key: impl IntoHeaderName, value: &str) -> Result<Self, DavError> {
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| DavError::ConfigError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(key, header_value);
        Ok(self)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = merge_headers(&self.headers, &headers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) config: Arc<ClientConfig>,
    dispatcher: Dispatcher,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DavError> {
        Self::from_config(ClientConfig::new(base_url))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, DavError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| DavError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_transport(
            config,
            Arc::new(HttpTransport::with_client(http_client)),
        ))
    }

    /// Build a client that sends every request through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for a remote path, with the path percent-encoded.
    pub fn url_for(&self, path: &str) -> String {
        join_url(&[self.config.base_url.as_str(), encode_path(path).as_str()])
    }

    /// Request descriptor for `path`, seeded with the configured headers.
    pub fn descriptor(&self, method: Method, path: &str) -> RequestOptions {
        let request = RequestOptions::new(method, self.url_for(path));
        if self.config.headers.is_empty() {
            request
        } else {
            request.with_headers(self.config.headers.clone())
        }
    }

    /// Merge `options` into a descriptor for `path` and send it.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: &UserOptions,
    ) -> Result<Response, DavError> {
        let request = self.descriptor(method, path);
        self.send(request, options).await
    }

    async fn send(
        &self,
        mut request: RequestOptions,
        options: &UserOptions,
    ) -> Result<Response, DavError> {
        prepare_request_options(&mut request, options);
        debug!(method = %request.method, url = %request.url, "sending webdav request");
        self.dispatcher.dispatch(request).await
    }

    /// Download a file's contents.
    ///
    /// GET {path}
    pub async fn get_file_contents(&self, path: &str) -> Result<Bytes, DavError> {
        self.get_file_contents_with_options(path, &UserOptions::default())
            .await
    }

    pub async fn get_file_contents_with_options(
        &self,
        path: &str,
        options: &UserOptions,
    ) -> Result<Bytes, DavError> {
        let response = self.request(Method::GET, path, options).await?;
        Ok(response.body)
    }

    /// Upload a file, replacing any existing one.
    ///
    /// PUT {path}
    pub async fn put_file_contents(
        &self,
        path: &str,
        data: impl Into<Body>,
    ) -> Result<Response, DavError> {
        self.put_file_contents_with_options(path, data, &UserOptions::default())
            .await
    }

    /// Upload a file with custom options. A `data` field in `options` takes
    /// precedence over `data`.
    pub async fn put_file_contents_with_options(
        &self,
        path: &str,
        data: impl Into<Body>,
        options: &UserOptions,
    ) -> Result<Response, DavError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

        let mut request = self.descriptor(Method::PUT, path);
        request.headers = Some(match request.headers.take() {
            Some(configured) => merge_headers(&headers, &configured),
            None => headers,
        });
        request.data = Some(data.into());

        self.send(request, options).await
    }

    /// Create a collection.
    ///
    /// MKCOL {path}
    pub async fn create_directory(&self, path: &str) -> Result<Response, DavError> {
        self.create_directory_with_options(path, &UserOptions::default())
            .await
    }

    pub async fn create_directory_with_options(
        &self,
        path: &str,
        options: &UserOptions,
    ) -> Result<Response, DavError> {
        let mkcol = Method::from_bytes(b"MKCOL")
            .map_err(|e| DavError::ConfigError(format!("Invalid method: {}", e)))?;
        self.request(mkcol, path, options).await
    }

    /// Delete a file or collection.
    ///
    /// DELETE {path}
    pub async fn delete_file(&self, path: &str) -> Result<Response, DavError> {
        self.delete_file_with_options(path, &UserOptions::default())
            .await
    }

    pub async fn delete_file_with_options(
        &self,
        path: &str,
        options: &UserOptions,
    ) -> Result<Response, DavError> {
        self.request(Method::DELETE, path, options).await
    }
}
