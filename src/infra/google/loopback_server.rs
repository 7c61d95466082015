// One-shot HTTP server on 127.0.0.1 for exercising the Google clients
// against canned responses.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct LoopbackServer {
    pub url: String,
    request: JoinHandle<String>,
}

impl LoopbackServer {
    /// Accepts a single connection and answers it with `status` and a JSON `body`.
    pub async fn respond_once(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let body = body.to_string();

        let request = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut received = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
                if request_complete(&received) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&received).into_owned()
        });

        Self { url, request }
    }

    /// The raw request the server received.
    pub async fn request(self) -> String {
        self.request.await.unwrap()
    }
}

fn request_complete(received: &[u8]) -> bool {
    let Some(header_end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&received[..header_end]).to_ascii_lowercase();
    let body_len = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    received.len() >= header_end + 4 + body_len
}
