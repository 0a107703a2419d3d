//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Request lines (`METHOD /path`) seen by a mock registry.
pub type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Start a mock registry on an ephemeral port.
///
/// `f` maps `(method, path)` to a status code and body. HEAD responses
/// carry the body length as Content-Length but no body.
pub async fn start_mock_registry<F>(f: F) -> (SocketAddr, SeenRequests)
where
    F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen_task = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen_task.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut read = 0;
                        while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => read += n,
                            }
                            if read == buf.len() {
                                return;
                            }
                        }

                        let head = String::from_utf8_lossy(&buf[..read]).to_string();
                        drain_body(&mut socket, &head).await;
                        let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
                        let method = parts.next().unwrap_or_default().to_string();
                        let path = parts.next().unwrap_or_default().to_string();
                        seen.lock().unwrap().push(format!("{} {}", method, path));

                        let (status, body) = f(&method, &path);
                        let status_text = match status {
                            200 => "200 OK",
                            202 => "202 Accepted",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let payload = if method == "HEAD" { "" } else { body.as_str() };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            payload
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

/// Read and discard the request body so closing the socket does not reset it.
async fn drain_body(socket: &mut tokio::net::TcpStream, head: &str) {
    let Some(header_end) = head.find("\r\n\r\n") else { return };
    let content_length = head[..header_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut remaining = content_length.saturating_sub(head.len() - header_end - 4);
    let mut chunk = [0u8; 1024];
    while remaining > 0 {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => remaining = remaining.saturating_sub(n),
        }
    }
}
