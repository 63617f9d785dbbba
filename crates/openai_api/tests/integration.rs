use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use openai_api::{ChatCompletionRequest, OpenAiApiClient, OpenAiApiConfig, OpenAiApiError, WireMessage};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

#[derive(Clone)]
enum ScriptedResponse {
    Respond {
        status: u16,
        delay_ms: u64,
        body: String,
    },
    Reset,
}

struct ScriptedServer {
    base_url: String,
    request_count: Arc<AtomicUsize>,
    request_bodies: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_bodies = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}/v1");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);
            let request_bodies = Arc::clone(&request_bodies);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    let request_bodies = Arc::clone(&request_bodies);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count, request_bodies).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            request_bodies,
            handle,
        }
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    fn request_bodies(&self) -> Vec<String> {
        self.request_bodies
            .lock()
            .expect("request body log should not be poisoned")
            .clone()
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn response_json(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        delay_ms: 0,
        body: body.to_string(),
    }
}

fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
    })
    .to_string()
}

fn request() -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        "gpt-4o-mini",
        vec![
            WireMessage::new("user", "hello"),
            WireMessage::new("assistant", "hi"),
            WireMessage::new("user", "how are you?"),
        ],
    )
    .with_max_tokens(256)
}

#[tokio::test]
async fn complete_integration_successful_response() {
    let server = ScriptedServer::new(vec![response_json(200, &completion_body("fine, thanks"))]).await;

    let config = OpenAiApiConfig::new("sk-test").with_base_url(&server.base_url);
    let client = OpenAiApiClient::new(config).expect("client");

    let response = client
        .complete(&request())
        .await
        .expect("completion should succeed");

    assert_eq!(
        response.first_message().map(|message| message.content.as_str()),
        Some("fine, thanks")
    );
    assert_eq!(server.request_count(), 1);

    let bodies = server.request_bodies();
    let sent: serde_json::Value = serde_json::from_str(&bodies[0]).expect("request body json");
    assert_eq!(sent["model"], "gpt-4o-mini");
    assert_eq!(sent["max_tokens"], 256);
    assert_eq!(sent["messages"].as_array().map(Vec::len), Some(3));
    assert_eq!(sent["messages"][2]["content"], "how are you?");

    server.shutdown();
}

#[tokio::test]
async fn complete_integration_error_status_is_not_retried() {
    let server = ScriptedServer::new(vec![
        response_json(503, r##"{"error":{"message":"overloaded"}}"##),
        response_json(200, &completion_body("never reached")),
    ])
    .await;

    let config = OpenAiApiConfig::new("sk-test").with_base_url(&server.base_url);
    let client = OpenAiApiClient::new(config).expect("client");

    let error = client
        .complete(&request())
        .await
        .expect_err("503 should fail the call");

    assert!(matches!(&error, OpenAiApiError::Status(code, message) if code.as_u16() == 503 && message == "overloaded"));
    assert_eq!(server.request_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn complete_integration_unauthorized_is_classified() {
    let server = ScriptedServer::new(vec![response_json(
        401,
        r##"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"##,
    )])
    .await;

    let config = OpenAiApiConfig::new("sk-wrong").with_base_url(&server.base_url);
    let client = OpenAiApiClient::new(config).expect("client");

    let error = client.complete(&request()).await.expect_err("401 should fail");

    assert!(error.is_authentication());
    assert!(error.to_string().contains("Incorrect API key provided"));

    server.shutdown();
}

#[tokio::test]
async fn complete_integration_rate_limit_is_classified() {
    let server = ScriptedServer::new(vec![response_json(
        429,
        r##"{"error":{"message":"Rate limit reached for requests","type":"requests","code":"rate_limit_exceeded"}}"##,
    )])
    .await;

    let config = OpenAiApiConfig::new("sk-test").with_base_url(&server.base_url);
    let client = OpenAiApiClient::new(config).expect("client");

    let error = client.complete(&request()).await.expect_err("429 should fail");
    assert!(error.is_rate_limited());

    server.shutdown();
}

#[tokio::test]
async fn complete_integration_empty_choices_fail_explicitly() {
    let server = ScriptedServer::new(vec![response_json(200, r##"{"choices":[]}"##)]).await;

    let config = OpenAiApiConfig::new("sk-test").with_base_url(&server.base_url);
    let client = OpenAiApiClient::new(config).expect("client");

    let error = client.complete(&request()).await.expect_err("no choices");
    assert!(matches!(error, OpenAiApiError::EmptyChoices));

    server.shutdown();
}

#[tokio::test]
async fn complete_integration_connection_reset_surfaces_request_error() {
    let server = ScriptedServer::new(vec![ScriptedResponse::Reset]).await;

    let config = OpenAiApiConfig::new("sk-test").with_base_url(&server.base_url);
    let client = OpenAiApiClient::new(config).expect("client");

    let error = timeout(Duration::from_secs(10), client.complete(&request()))
        .await
        .expect("reset should resolve promptly")
        .expect_err("reset should surface as failure");

    assert!(matches!(error, OpenAiApiError::Request(_)));
    assert_eq!(server.request_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn complete_integration_timeout_bounds_hanging_server() {
    let server = ScriptedServer::new(vec![ScriptedResponse::Respond {
        status: 200,
        delay_ms: 2_000,
        body: completion_body("too late"),
    }])
    .await;

    let config = OpenAiApiConfig::new("sk-test")
        .with_base_url(&server.base_url)
        .with_timeout(Duration::from_millis(200));
    let client = OpenAiApiClient::new(config).expect("client");

    let error = client
        .complete(&request())
        .await
        .expect_err("configured timeout should abort the call");

    assert!(matches!(error, OpenAiApiError::Request(ref source) if source.is_timeout()));

    server.shutdown();
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    request_bodies: Arc<Mutex<Vec<String>>>,
) {
    let body = match read_request(&mut socket).await {
        Ok(body) => body,
        Err(_) => return,
    };

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    if let Ok(mut bodies) = request_bodies.lock() {
        bodies.push(body);
    }
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| response_json(500, r##"{"error":{"message":"unexpected request"}}"##));

    match response {
        ScriptedResponse::Reset => {}
        ScriptedResponse::Respond {
            status,
            delay_ms,
            body,
        } => {
            if delay_ms > 0 {
                sleep(Duration::from_millis(delay_ms)).await;
            }
            let payload = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                status_reason(status),
                body.len(),
            );

            let _ = socket.write_all(payload.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 2048];

    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(String::new());
        }
        request.extend_from_slice(&buffer[..n]);
        if let Some(position) = request.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while request.len() < header_end + content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buffer[..n]);
    }

    Ok(String::from_utf8_lossy(&request[header_end..]).into_owned())
}
