use bytes::Bytes;
use serde_json::json;
use std::sync::{Arc, Mutex};
use webdav_request_core::header::{HeaderMap, HeaderValue};
use webdav_request_core::{
    Body, DavError, DigestContext, Dispatcher, HttpTransport, Method, RequestOptions, Response,
    StatusCode, Transport, UploadProgress, UploadProgressFn, UserOptions, prepare_request_options,
    request, transport_fn,
};
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sends_method_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/dav/notes.txt"))
        .and(header("x-client", "webdav"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert("x-client", HeaderValue::from_static("webdav"));
    let options = RequestOptions::new(Method::PUT, format!("{}/dav/notes.txt", mock_server.uri()))
        .with_headers(headers)
        .with_data("hello");

    let response = HttpTransport::new()
        .send(options)
        .await
        .expect("PUT should succeed");
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_json_body_defaults_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "lock": "exclusive" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
        .mount(&mock_server)
        .await;

    let options = RequestOptions::new(Method::POST, mock_server.uri())
        .with_data(json!({ "lock": "exclusive" }));
    let response = HttpTransport::new().send(options).await.unwrap();

    let payload: serde_json::Value = response.json().unwrap();
    assert_eq!(payload["token"], "abc");
}

#[tokio::test]
async fn test_webdav_extension_method_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/"))
        .and(header("depth", "1"))
        .respond_with(ResponseTemplate::new(207).set_body_string("<d:multistatus/>"))
        .mount(&mock_server)
        .await;

    let propfind = Method::from_bytes(b"PROPFIND").unwrap();
    let mut request_options = RequestOptions::new(propfind, format!("{}/dav/", mock_server.uri()));
    let mut headers = HeaderMap::new();
    headers.insert("depth", HeaderValue::from_static("1"));
    prepare_request_options(
        &mut request_options,
        &UserOptions::builder().headers(headers).build(),
    );

    let response = HttpTransport::new().send(request_options).await.unwrap();
    assert_eq!(response.status.as_u16(), 207);
    assert_eq!(response.text(), "<d:multistatus/>");
}

#[tokio::test]
async fn test_unauthorized_is_an_error_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("challenge"))
        .mount(&mock_server)
        .await;

    let options = RequestOptions::new(Method::GET, mock_server.uri());
    let err = HttpTransport::new()
        .send(options)
        .await
        .expect_err("401 should be rejected");

    match err {
        DavError::StatusError { status, body } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "challenge");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_digest_options_let_unauthorized_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("www-authenticate", "Digest realm=\"dav\", nonce=\"n1\""),
        )
        .mount(&mock_server)
        .await;

    let mut options = RequestOptions::new(Method::GET, mock_server.uri());
    let user_options = UserOptions::builder()
        .digest(DigestContext::new("alice", "secret"))
        .build();
    prepare_request_options(&mut options, &user_options);

    let response = HttpTransport::new().send(options).await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.headers.contains_key("www-authenticate"));
}

#[tokio::test]
async fn test_digest_options_still_reject_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut options = RequestOptions::new(Method::GET, mock_server.uri());
    prepare_request_options(
        &mut options,
        &UserOptions::builder().digest(DigestContext::default()).build(),
    );

    let err = HttpTransport::new().send(options).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn test_response_over_max_content_length_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 100]))
        .mount(&mock_server)
        .await;

    let mut options = RequestOptions::new(Method::GET, mock_server.uri());
    prepare_request_options(
        &mut options,
        &UserOptions::builder().max_content_length(10).build(),
    );

    let err = HttpTransport::new().send(options).await.unwrap_err();
    assert!(matches!(err, DavError::ContentLengthExceeded { limit: 10 }));
}

#[tokio::test]
async fn test_body_over_max_body_length_is_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut options = RequestOptions::new(Method::PUT, mock_server.uri());
    prepare_request_options(
        &mut options,
        &UserOptions::builder()
            .data(vec![0u8; 20])
            .max_body_length(5)
            .build(),
    );

    let err = HttpTransport::new().send(options).await.unwrap_err();
    assert!(matches!(
        err,
        DavError::BodyLengthExceeded {
            limit: 5,
            length: 20
        }
    ));
}

#[tokio::test]
async fn test_upload_progress_reaches_total() {
    let mock_server = MockServer::start().await;
    let payload = vec![b'a'; 150_000];

    Mock::given(method("PUT"))
        .and(path("/big.bin"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let events: Arc<Mutex<Vec<UploadProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: UploadProgressFn = Arc::new(move |progress| {
        sink.lock().unwrap().push(progress);
    });

    let mut options = RequestOptions::new(Method::PUT, format!("{}/big.bin", mock_server.uri()));
    prepare_request_options(
        &mut options,
        &UserOptions::builder()
            .data(Bytes::from(payload.clone()))
            .on_upload_progress(callback)
            .build(),
    );

    HttpTransport::new().send(options).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].body.len(), payload.len());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    let last = events.last().unwrap();
    assert_eq!(last.loaded, 150_000);
    assert_eq!(last.total, Some(150_000));
    assert!(events.windows(2).all(|pair| pair[0].loaded < pair[1].loaded));
}

#[tokio::test]
async fn test_empty_upload_reports_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/empty.bin"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let events: Arc<Mutex<Vec<UploadProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: UploadProgressFn = Arc::new(move |progress| {
        sink.lock().unwrap().push(progress);
    });

    let mut options = RequestOptions::new(Method::PUT, format!("{}/empty.bin", mock_server.uri()));
    prepare_request_options(
        &mut options,
        &UserOptions::builder()
            .data(Bytes::new())
            .on_upload_progress(callback)
            .build(),
    );

    HttpTransport::new().send(options).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].loaded, 0);
    assert_eq!(events[0].total, Some(0));
}

#[tokio::test]
async fn test_agent_for_scheme_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-agent", "custom"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut agent_headers = HeaderMap::new();
    agent_headers.insert("x-agent", HeaderValue::from_static("custom"));
    let agent = reqwest::Client::builder()
        .default_headers(agent_headers)
        .build()
        .unwrap();

    let mut options = RequestOptions::new(Method::GET, mock_server.uri());
    prepare_request_options(&mut options, &UserOptions::builder().http_agent(agent).build());

    HttpTransport::new().send(options).await.unwrap();
}

#[tokio::test]
async fn test_dispatch_forwards_descriptor_unchanged() {
    let seen: Arc<Mutex<Option<RequestOptions>>> = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let transport = transport_fn(move |options: RequestOptions| {
        *recorder.lock().unwrap() = Some(options);
        async {
            Ok(Response {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"stub"),
            })
        }
    });

    let mut headers = HeaderMap::new();
    headers.insert("depth", HeaderValue::from_static("0"));
    let options = RequestOptions::new(Method::DELETE, "https://dav.example.com/a%20b")
        .with_headers(headers.clone())
        .with_data(Body::Text("payload".into()));

    let response = request(&transport, options).await.unwrap();
    assert_eq!(response.text(), "stub");

    let forwarded = seen.lock().unwrap().take().expect("transport should see request");
    assert_eq!(forwarded.method, Method::DELETE);
    assert_eq!(forwarded.url, "https://dav.example.com/a%20b");
    assert_eq!(forwarded.headers, Some(headers));
    assert_eq!(forwarded.data, Some(Body::Text("payload".into())));
}

#[tokio::test]
async fn test_dispatcher_exposes_injected_transport() {
    let transport: Arc<dyn Transport> = Arc::new(transport_fn(|_options: RequestOptions| async {
        Ok(Response {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        })
    }));
    let dispatcher = Dispatcher::new(Arc::clone(&transport));
    assert!(Arc::ptr_eq(dispatcher.transport(), &transport));

    let response = dispatcher
        .transport()
        .send(RequestOptions::new(Method::DELETE, "https://dav.example.com/old"))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_dispatcher_propagates_transport_errors() {
    let dispatcher = Dispatcher::new(Arc::new(transport_fn(|_options: RequestOptions| async {
        Err(DavError::TransportError("connection refused".to_string()))
    })));

    let err = dispatcher
        .dispatch(RequestOptions::new(Method::GET, "http://unreachable.invalid/"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Transport error: connection refused");
}
