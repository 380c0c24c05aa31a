//! HttpRelayer against a local one-shot HTTP server

use aegis_core::gateway::{AcceptanceRequest, AccountSaltRequest, RelayerGateway};
use aegis_core::Error;
use aegis_relayer::{HttpRelayer, RelayerConfig};
use alloy_primitives::Address;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Captured request: (request line + headers, body)
type Captured = (String, String);

/// Serve exactly one request with the given status line and body.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            assert!(n > 0, "connection closed before headers");
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let lower = line.to_ascii_lowercase();
                lower
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let request_body =
            String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        (head, request_body)
    });

    (format!("http://{}", addr), handle)
}

fn acceptance() -> AcceptanceRequest {
    AcceptanceRequest {
        controller_eth_addr: Address::repeat_byte(0xee),
        guardian_email_addr: "guardian@gmail.com".to_string(),
        account_code: "07".repeat(32),
        template_idx: 0,
        command: "Accept guardian request for 0xABCD".to_string(),
    }
}

#[tokio::test]
async fn test_acceptance_request_wire_format() {
    let (url, server) = serve_once("200 OK", r#"{"requestId":"42"}"#).await;
    let relayer = HttpRelayer::new(RelayerConfig::new(url).with_api_key("rk-test-key-123456")).unwrap();

    let body = relayer.acceptance_request(acceptance()).await.unwrap();
    assert_eq!(body, serde_json::json!({ "requestId": "42" }));

    let (head, sent) = server.await.unwrap();
    assert!(head.starts_with("POST /acceptanceRequest HTTP/1.1"));
    assert!(head.to_ascii_lowercase().contains("authorization: bearer rk-test-key-123456"));

    let sent: serde_json::Value = serde_json::from_str(&sent).unwrap();
    assert_eq!(sent["guardian_email_addr"], "guardian@gmail.com");
    assert_eq!(sent["template_idx"], 0);
    assert_eq!(sent["command"], "Accept guardian request for 0xABCD");
    assert_eq!(sent["account_code"].as_str().unwrap().len(), 64);
    assert!(sent["controller_eth_addr"]
        .as_str()
        .unwrap()
        .eq_ignore_ascii_case("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"));
}

#[tokio::test]
async fn test_client_error_is_rejection() {
    let (url, server) = serve_once("400 Bad Request", r#"{"error":"Invalid command"}"#).await;
    let relayer = HttpRelayer::new(RelayerConfig::new(url)).unwrap();

    let err = relayer.acceptance_request(acceptance()).await.unwrap_err();
    assert!(matches!(err, Error::RelayerRejected(_)));
    assert!(err.to_string().contains("Invalid command"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let (url, server) = serve_once("503 Service Unavailable", "{}").await;
    let relayer = HttpRelayer::new(RelayerConfig::new(url)).unwrap();

    let err = relayer.acceptance_request(acceptance()).await.unwrap_err();
    assert!(err.is_transient());
    server.await.unwrap();
}

#[tokio::test]
async fn test_rate_limit_is_transport() {
    let (url, server) = serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#).await;
    let relayer = HttpRelayer::new(RelayerConfig::new(url)).unwrap();

    let err = relayer.acceptance_request(acceptance()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_transient());
    server.await.unwrap();
}

#[tokio::test]
async fn test_request_timeout_status_is_transport() {
    let (url, server) = serve_once("408 Request Timeout", "{}").await;
    let relayer = HttpRelayer::new(RelayerConfig::new(url)).unwrap();

    let err = relayer.acceptance_request(acceptance()).await.unwrap_err();
    assert!(err.is_transient());
    server.await.unwrap();
}

#[tokio::test]
async fn test_salt_body_passes_through() {
    let salt = r#""0x0102030405060708091011121314151617181920212223242526272829303132""#;
    let (url, server) = serve_once("200 OK", salt).await;
    let relayer = HttpRelayer::new(RelayerConfig::new(url)).unwrap();

    let body = relayer
        .get_account_salt(AccountSaltRequest {
            account_code: "07".repeat(32),
            email_addr: "guardian@gmail.com".to_string(),
        })
        .await
        .unwrap();
    assert!(body.as_str().unwrap().starts_with("0x0102"));

    let (head, _) = server.await.unwrap();
    assert!(head.starts_with("POST /getAccountSalt"));
}

#[tokio::test]
async fn test_unreachable_relayer_is_transport() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let relayer = HttpRelayer::new(
        RelayerConfig::new(format!("http://{}", addr)).with_timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let err = relayer.acceptance_request(acceptance()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
