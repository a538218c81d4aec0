//! A minimal HTTP/1.1 responder bound to an ephemeral port, for tests that
//! need a real `reqwest` round trip against canned responses. No mock-HTTP
//! crate is in the dependency table, so this hand-rolls just enough of the
//! protocol to serve a fixed set of routes — the same call `authscope-
//! candidates` makes for sitemap parsing (no XML/sitemap crate either, so
//! entries there are pulled out with regex instead).
//!
//! Binds `127.0.0.1:0`, spawns a handler per accepted connection, and hands
//! the bound address back to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct FixtureResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl FixtureResponse {
    pub fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Self { status: 200, content_type, body: body.into() }
    }

    pub fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: String::new() }
    }
}

/// A running fixture server. Dropping this stops accepting new connections
/// (the accept loop is aborted); in-flight connections finish normally.
pub struct FixtureServer {
    pub base_url: String,
    accept_loop: JoinHandle<()>,
}

impl FixtureServer {
    /// Starts the server, serving `routes` (exact request-path match, e.g.
    /// `"/robots.txt"`) and 404 for anything else.
    pub async fn start(routes: HashMap<&'static str, FixtureResponse>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let routes = Arc::new(routes);

        let accept_loop = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { return };
                let routes = routes.clone();
                tokio::spawn(serve_one(stream, routes));
            }
        });

        Ok(Self { base_url: format!("http://{addr}"), accept_loop })
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve_one(mut stream: tokio::net::TcpStream, routes: Arc<HashMap<&'static str, FixtureResponse>>) {
    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    loop {
        let n = match stream.read(&mut buf[read..]).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        read += n;
        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buf[..read]);
    let Some(request_line) = request.lines().next() else { return };
    let path = request_line.split_whitespace().nth(1).unwrap_or("/");

    let response = routes.get(path).cloned().unwrap_or_else(FixtureResponse::not_found);
    let body = response.body.into_bytes();
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        status_text(response.status),
        response.content_type,
        body.len(),
    );

    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_routes_and_404s_others() {
        let mut routes = HashMap::new();
        routes.insert("/robots.txt", FixtureResponse::ok("text/plain", "User-agent: *\nDisallow: /admin\n"));
        let server = FixtureServer::start(routes).await.unwrap();

        let client = reqwest::Client::new();
        let resp = client.get(format!("{}/robots.txt", server.base_url)).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "text/plain");
        assert_eq!(resp.text().await.unwrap(), "User-agent: *\nDisallow: /admin\n");

        let missing = client.get(format!("{}/nope", server.base_url)).send().await.unwrap();
        assert_eq!(missing.status(), 404);
    }
}
