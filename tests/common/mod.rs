/*!
 * Common test utilities for the wintrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wintrans::providers::mock::MockProvider;

/// Route library logs to the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Owned lines from string slices
pub fn lines(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

/// A short Vietnamese text with a recurring name
pub fn sample_novel() -> &'static str {
    "Chương một\n\
     Minh đi chợ.\n\
     \n\
     Minh gặp Lan ở Hà Nội.\n\
     Họ nói chuyện rất lâu.\n\
     Trời bắt đầu mưa.\n\
     Lan về nhà.\n"
}

/// The lines of the window embedded in a prompt
pub fn window_from_prompt(prompt: &str) -> Vec<String> {
    let Some((_, rest)) = prompt.split_once("## 待翻译内容\n```\n") else {
        return Vec::new();
    };
    let body = rest.split("\n```").next().unwrap_or_default();
    body.split('\n').map(str::to_string).collect()
}

/// Responder translating every window line to `译:<line>` and reporting "Minh" as a term
pub fn echo_responder(prompt: &str) -> String {
    let translated: Vec<String> = window_from_prompt(prompt)
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| format!("译:{}", line))
        .collect();
    let translated: Vec<&str> = translated.iter().map(String::as_str).collect();
    MockProvider::format_reply(&translated, &[("Minh", "阿明")])
}

/// Serve one canned HTTP response per connection, returning the request bodies
pub async fn spawn_http_server(responses: Vec<String>) -> Result<(String, JoinHandle<Vec<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}/v1", listener.local_addr()?);

    let handle = tokio::spawn(async move {
        let mut bodies = Vec::new();
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            bodies.push(read_request_body(&mut socket).await);
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        bodies
    });

    Ok((url, handle))
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let header_end = data.windows(4).position(|w| w == b"\r\n\r\n");
        if let Some(end) = header_end {
            let headers = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                return String::from_utf8_lossy(&data[end + 4..end + 4 + length]).to_string();
            }
        }

        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&data).to_string(),
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
}

/// A complete HTTP response with a JSON body
pub fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// A complete HTTP response streaming the given fragments as server-sent events
pub fn sse_response(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": fragment } }] });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n{}",
        body
    )
}
