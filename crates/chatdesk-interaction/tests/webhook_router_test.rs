//! WebhookRouter against a canned local HTTP responder.

use chatdesk_core::{QueryRouter, RouterError};
use chatdesk_interaction::WebhookRouter;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves exactly one request with `status` and `body`, handing the request
/// body back through the returned channel.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/webhook/chat", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request_body(&mut socket).await;
        let _ = tx.send(request);

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    (url, rx)
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
    let content_length: usize = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|value| value.trim().parse().unwrap())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buffer[header_end..]).to_string()
}

#[tokio::test]
async fn test_posts_session_payload_and_reads_array_reply() {
    let (url, request) = serve_once("200 OK", r#"[{"output": "hi there"}]"#).await;
    let router = WebhookRouter::new(url, Duration::from_secs(5));

    let reply = router.send("hello").await.unwrap();
    assert_eq!(reply, "hi there");

    let body: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
    assert_eq!(body["action"], "sendMessage");
    assert_eq!(body["chatInput"], "hello");
    assert_eq!(body["sessionId"], router.session_id());
}

#[tokio::test]
async fn test_object_and_plain_text_replies() {
    let (url, _request) = serve_once("200 OK", r#"{"response": "from object"}"#).await;
    let router = WebhookRouter::new(url, Duration::from_secs(5));
    assert_eq!(router.send("q").await.unwrap(), "from object");

    let (url, _request) = serve_once("200 OK", "plain words").await;
    let router = WebhookRouter::new(url, Duration::from_secs(5));
    assert_eq!(router.send("q").await.unwrap(), "plain words");
}

#[tokio::test]
async fn test_error_status_is_backend_unavailable() {
    let (url, _request) = serve_once("500 Internal Server Error", "workflow crashed").await;
    let router = WebhookRouter::new(url, Duration::from_secs(5));

    match router.send("q").await {
        Err(RouterError::BackendUnavailable(message)) => {
            assert!(message.contains("500"), "{message}");
            assert!(message.contains("workflow crashed"), "{message}");
        }
        other => panic!("expected BackendUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_webhook_is_backend_unavailable() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let router = WebhookRouter::new(format!("http://{}/hook", addr), Duration::from_secs(5));
    assert!(matches!(
        router.send("q").await,
        Err(RouterError::BackendUnavailable(_))
    ));
}

#[tokio::test]
async fn test_slow_webhook_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let router = WebhookRouter::new(url, Duration::from_millis(200));
    assert_eq!(
        router.send("q").await,
        Err(RouterError::Timeout(Duration::from_millis(200)))
    );
}
