//! Helpers shared by unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::api::{ApiBackend, ApiError, ChatRequest, Endpoint, ModelInfo};
use crate::core::config::Settings;
use crate::core::session::ChatSession;

/// Backend that answers every call immediately with the same result.
pub struct StaticBackend {
    pub models: Result<Vec<ModelInfo>, ApiError>,
    pub reply: Result<String, ApiError>,
}

impl StaticBackend {
    pub fn new(models: &[&str], reply: &str) -> Self {
        Self {
            models: Ok(models.iter().map(|id| ModelInfo::new(*id)).collect()),
            reply: Ok(reply.to_string()),
        }
    }
}

#[async_trait]
impl ApiBackend for StaticBackend {
    async fn list_models(&self, _endpoint: &Endpoint) -> Result<Vec<ModelInfo>, ApiError> {
        self.models.clone()
    }

    async fn chat_completion(
        &self,
        _endpoint: &Endpoint,
        _request: &ChatRequest,
    ) -> Result<String, ApiError> {
        self.reply.clone()
    }
}

/// In-memory session with a default model set. Must be called inside a
/// Tokio runtime.
pub fn create_test_session(backend: StaticBackend) -> ChatSession {
    let settings = Settings {
        default_model: "test-model".to_string(),
        ..Settings::default()
    };
    ChatSession::new(settings, Arc::new(backend), Handle::current())
}

/// What the one-shot responder saw on the wire.
#[derive(Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// A local HTTP server that answers exactly one request with a canned
/// status and body.
pub struct HttpResponder {
    pub base_url: String,
    handle: JoinHandle<Result<CapturedRequest, String>>,
}

impl HttpResponder {
    /// Waits for the served request and returns it.
    pub async fn request(self) -> CapturedRequest {
        self.handle
            .await
            .expect("responder task should not panic")
            .expect("responder should capture a request")
    }
}

pub async fn spawn_http_responder(status: u16, body: &str) -> HttpResponder {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
        let captured = read_http_request(&mut stream).await?;
        let response = format!(
            "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            reason_phrase(status),
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .await
            .map_err(|err| err.to_string())?;
        stream.shutdown().await.map_err(|err| err.to_string())?;
        Ok(captured)
    });

    HttpResponder {
        base_url: format!("http://{addr}/"),
        handle,
    }
}

pub fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.ok_or("header end should exist")?;
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}
