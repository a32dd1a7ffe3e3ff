use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use assert_matches::assert_matches;
use crm_api::{
    ChatReply, ChatRequest, ChatRole, EmailDraftRequest, EmailIntent, ErrorCode, Gateway,
    GatewayConfig, GatewayError, HistoryEntry, OfferDraftRequest, QueryParams, StaticCredential,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Clone)]
enum ScriptedResponse {
    Respond {
        status: u16,
        content_type: &'static str,
        headers: Vec<(&'static str, &'static str)>,
        body: Vec<u8>,
    },
    Reset,
}

#[derive(Debug, Clone)]
struct RecordedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn body_json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

struct ScriptedServer {
    base_url: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}/api");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);
            let requests = Arc::clone(&requests);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    let requests = Arc::clone(&requests);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count, requests).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            requests,
            handle,
        }
    }

    fn gateway(&self) -> Gateway {
        Gateway::new(GatewayConfig::new(&self.base_url)).expect("gateway")
    }

    fn authenticated_gateway(&self, token: &str) -> Gateway {
        Gateway::with_credentials(
            GatewayConfig::new(&self.base_url),
            Arc::new(StaticCredential::new(token)),
        )
        .expect("gateway")
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn response_json(status: u16, body: Value) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        content_type: "application/json",
        headers: Vec::new(),
        body: body.to_string().into_bytes(),
    }
}

fn response_raw(status: u16, content_type: &'static str, body: &[u8]) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        content_type,
        headers: Vec::new(),
        body: body.to_vec(),
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    requests.lock().expect("requests lock").push(request);

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    let script = scripts
        .get(index)
        .cloned()
        .or_else(|| scripts.last().cloned())
        .unwrap_or(ScriptedResponse::Reset);

    match script {
        ScriptedResponse::Reset => {
            drop(socket);
        }
        ScriptedResponse::Respond {
            status,
            content_type,
            headers,
            body,
        } => {
            let mut head = format!(
                "HTTP/1.1 {status} {}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n",
                reason_phrase(status),
                body.len()
            );
            for (key, value) in headers {
                head.push_str(&format!("{key}: {value}\r\n"));
            }
            head.push_str("\r\n");

            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = find_header_end(&buffer) {
            break position;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Some(RecordedRequest {
        request_line,
        headers,
        body,
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Status",
    }
}

/// Address that refuses connections: bound once, then released.
async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("local TCP listener should bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{addr}/api")
}

#[tokio::test]
async fn successful_call_returns_envelope_with_status() {
    let server = ScriptedServer::new(vec![response_json(
        200,
        json!({"success": true, "data": {"id": "c-1", "name": "Acme"}}),
    )])
    .await;

    let envelope = server
        .gateway()
        .get::<Value>("/clients/c-1", QueryParams::new())
        .await
        .expect("call succeeds");

    assert!(envelope.success);
    assert_eq!(envelope.http_status, 200);
    assert_eq!(envelope.data, Some(json!({"id": "c-1", "name": "Acme"})));
    assert_eq!(envelope.error, None);
    assert_eq!(server.request_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn query_params_skip_empty_values_on_the_wire() {
    let server = ScriptedServer::new(vec![response_json(
        200,
        json!({"success": true, "data": [], "meta": {"page": 1, "total": 0, "totalPages": 0}}),
    )])
    .await;

    let page = server
        .gateway()
        .list::<Value>(
            "/offers",
            QueryParams::new()
                .with("status", "draft")
                .with("search", "")
                .with("clientId", Value::Null)
                .with("page", 1),
        )
        .await
        .expect("list succeeds");

    assert!(page.items.is_empty());
    assert_eq!(page.meta.total_pages, Some(0));

    let requests = server.requests();
    let request_line = &requests[0].request_line;
    assert!(request_line.starts_with("GET /api/offers?"));
    assert!(request_line.contains("status=draft"));
    assert!(request_line.contains("page=1"));
    assert!(!request_line.contains("search"));
    assert!(!request_line.contains("clientId"));

    server.shutdown();
}

#[tokio::test]
async fn bearer_header_is_attached_when_credential_present() {
    let server = ScriptedServer::new(vec![response_json(
        200,
        json!({"success": true, "data": null}),
    )])
    .await;

    server
        .authenticated_gateway("secret-token")
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect("call succeeds");
    server
        .gateway()
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect("anonymous call is still sent");

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer secret-token")
    );
    assert_eq!(requests[1].header("authorization"), None);

    server.shutdown();
}

#[tokio::test]
async fn non_success_status_carries_backend_error_code() {
    let server = ScriptedServer::new(vec![response_json(
        404,
        json!({
            "success": false,
            "error": {"message": "Client not found", "code": "NOT_FOUND", "details": {"id": "c-9"}}
        }),
    )])
    .await;

    let error = server
        .gateway()
        .get::<Value>("/clients/c-9", QueryParams::new())
        .await
        .expect_err("404 should fail");

    assert_eq!(error.code, ErrorCode::Backend("NOT_FOUND".to_string()));
    assert_eq!(error.http_status, 404);
    assert_eq!(error.message, "Client not found");
    assert_eq!(error.details, Some(json!({"id": "c-9"})));
    assert_eq!(server.request_count(), 1, "no retries");

    server.shutdown();
}

#[tokio::test]
async fn non_success_status_without_error_is_unknown() {
    let server = ScriptedServer::new(vec![response_json(500, json!({"success": false}))]).await;

    let error = server
        .gateway()
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect_err("500 should fail");

    assert_eq!(error.code, ErrorCode::Unknown);
    assert_eq!(error.http_status, 500);

    server.shutdown();
}

#[tokio::test]
async fn html_error_page_keeps_status_and_is_unknown() {
    let server =
        ScriptedServer::new(vec![response_raw(502, "text/html", b"<html>bad gateway</html>")])
            .await;

    let error = server
        .gateway()
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect_err("502 should fail");

    assert_eq!(error.code, ErrorCode::Unknown);
    assert_eq!(error.http_status, 502);
    assert_eq!(error.message, "An unexpected error occurred");
    assert!(!error.is_network());

    server.shutdown();
}

#[tokio::test]
async fn unparseable_success_body_is_a_network_error() {
    let server =
        ScriptedServer::new(vec![response_raw(200, "text/html", b"<html>login</html>")]).await;

    let error = server
        .gateway()
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect_err("html should fail");

    assert_eq!(error.code, ErrorCode::Network);
    assert_eq!(error.http_status, 0);

    server.shutdown();
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    let gateway = Gateway::new(GatewayConfig::new(refused_base_url().await)).expect("gateway");

    let error = gateway
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect_err("refused connection should fail");

    assert_matches!(
        error,
        GatewayError {
            code: ErrorCode::Network,
            http_status: 0,
            ..
        }
    );
}

#[tokio::test]
async fn connection_reset_is_a_network_error() {
    let server = ScriptedServer::new(vec![ScriptedResponse::Reset]).await;

    let error = server
        .gateway()
        .get::<Value>("/clients", QueryParams::new())
        .await
        .expect_err("reset should fail");

    assert!(error.is_network());
    assert_eq!(error.http_status, 0);

    server.shutdown();
}

#[tokio::test]
async fn chat_posts_message_and_history() {
    let server = ScriptedServer::new(vec![response_json(
        200,
        json!({
            "success": true,
            "data": {
                "message": "Acme has two open offers.",
                "suggestions": ["Show them"],
                "actions": [{"type": "view_client", "payload": {"clientId": "42"}}]
            }
        }),
    )])
    .await;

    let reply: ChatReply = server
        .gateway()
        .chat(&ChatRequest {
            message: "What about Acme?".to_string(),
            history: vec![HistoryEntry {
                role: ChatRole::User,
                content: "Hi".to_string(),
            }],
        })
        .await
        .expect("chat succeeds");

    assert_eq!(reply.message, "Acme has two open offers.");
    assert_eq!(reply.suggestions, vec!["Show them".to_string()]);
    assert_eq!(reply.actions[0].kind, "view_client");

    let requests = server.requests();
    assert!(requests[0].request_line.starts_with("POST /api/ai/chat "));
    assert_eq!(
        requests[0].body_json(),
        json!({"message": "What about Acme?", "history": [{"role": "user", "content": "Hi"}]})
    );

    server.shutdown();
}

#[tokio::test]
async fn chat_with_unsuccessful_envelope_fails_with_backend_code() {
    let server = ScriptedServer::new(vec![response_json(
        200,
        json!({"success": false, "error": {"message": "AI quota exhausted", "code": "AI_QUOTA"}}),
    )])
    .await;

    let error = server
        .gateway()
        .chat(&ChatRequest {
            message: "hello".to_string(),
            history: Vec::new(),
        })
        .await
        .expect_err("unsuccessful envelope");

    assert_eq!(error.code.as_str(), "AI_QUOTA");
    assert_eq!(error.http_status, 200);

    server.shutdown();
}

#[tokio::test]
async fn auxiliary_endpoints_hit_their_paths() {
    let server = ScriptedServer::new(vec![
        response_json(
            200,
            json!({"success": true, "data": {"suggestions": [{"type": "followup", "title": "Call Acme"}], "stats": {"openOffers": 3}}}),
        ),
        response_json(
            200,
            json!({"success": true, "data": {"title": "Consulting", "items": [{"description": "Day rate", "quantity": 3, "unitPrice": 800}]}}),
        ),
        response_json(
            200,
            json!({"success": true, "data": {"subject": "Following up", "body": "Hi Acme"}}),
        ),
        response_json(
            200,
            json!({"success": true, "data": {"summary": "Healthy", "riskLevel": "low", "opportunities": ["Upsell support"]}}),
        ),
        response_json(200, json!({"success": true})),
    ])
    .await;
    let gateway = server.gateway();

    let snapshot = gateway.suggestions().await.expect("suggestions");
    assert_eq!(snapshot.suggestions[0].title, "Call Acme");
    assert_eq!(snapshot.stats["openOffers"], 3);

    let offer = gateway
        .generate_offer(&OfferDraftRequest {
            description: "three consulting days".to_string(),
            client_id: Some("42".to_string()),
        })
        .await
        .expect("offer");
    assert_eq!(offer.total(), 2400.0);

    let email = gateway
        .generate_email(&EmailDraftRequest::new(EmailIntent::FollowUp).for_client("42"))
        .await
        .expect("email");
    assert_eq!(email.subject, "Following up");

    let analysis = gateway.analyze_client("42").await.expect("analysis");
    assert_eq!(analysis.risk_level.as_deref(), Some("low"));

    gateway.clear_history().await.expect("clear");

    let lines: Vec<String> = server
        .requests()
        .into_iter()
        .map(|request| request.request_line)
        .collect();
    assert!(lines[0].starts_with("GET /api/ai/suggestions "));
    assert!(lines[1].starts_with("POST /api/ai/generate-offer "));
    assert!(lines[2].starts_with("POST /api/ai/generate-email "));
    assert!(lines[3].starts_with("GET /api/ai/analyze-client/42 "));
    assert!(lines[4].starts_with("DELETE /api/ai/history "));

    let email_body = server.requests()[2].body_json();
    assert_eq!(email_body, json!({"intent": "follow_up", "clientId": "42"}));

    server.shutdown();
}

#[tokio::test]
async fn analyze_client_encodes_spaces_and_plus_in_the_path() {
    let analysis = json!({"success": true, "data": {"summary": "Fine"}});
    let server = ScriptedServer::new(vec![
        response_json(200, analysis.clone()),
        response_json(200, analysis),
    ])
    .await;
    let gateway = server.gateway();

    gateway.analyze_client("acme west").await.expect("spaced id");
    gateway.analyze_client("a+b").await.expect("plus id");

    let lines: Vec<String> = server
        .requests()
        .into_iter()
        .map(|request| request.request_line)
        .collect();
    assert!(lines[0].starts_with("GET /api/ai/analyze-client/acme%20west "));
    assert!(lines[1].starts_with("GET /api/ai/analyze-client/a%2Bb "));

    server.shutdown();
}

#[tokio::test]
async fn download_returns_raw_bytes_and_file_name() {
    let server = ScriptedServer::new(vec![ScriptedResponse::Respond {
        status: 200,
        content_type: "application/pdf",
        headers: vec![("content-disposition", "attachment; filename=\"offer-7.pdf\"")],
        body: b"%PDF-1.7 fake".to_vec(),
    }])
    .await;

    let download = server
        .authenticated_gateway("tok")
        .download("/offers/7/pdf", QueryParams::new().with("lang", "de"))
        .await
        .expect("download succeeds");

    assert_eq!(download.bytes, b"%PDF-1.7 fake".to_vec());
    assert_eq!(download.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(download.file_name.as_deref(), Some("offer-7.pdf"));

    let requests = server.requests();
    assert_eq!(requests[0].header("authorization"), Some("Bearer tok"));
    assert!(requests[0].request_line.contains("lang=de"));

    server.shutdown();
}

#[tokio::test]
async fn download_failure_is_a_download_error() {
    let server = ScriptedServer::new(vec![response_json(
        404,
        json!({"success": false, "error": {"message": "gone", "code": "NOT_FOUND"}}),
    )])
    .await;

    let error = server
        .gateway()
        .download("/offers/7/pdf", QueryParams::new())
        .await
        .expect_err("404 download");

    assert_eq!(error.code, ErrorCode::Download);
    assert_eq!(error.http_status, 404);

    server.shutdown();
}
