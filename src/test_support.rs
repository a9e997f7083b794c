//! In-process HTTP server for executor and engine tests.
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::sleep;

const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK";
const MAX_HEAD_BYTES: usize = 64 * 1024;
const HANG_FOR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy)]
pub(crate) enum ServerBehavior {
    /// 200 with a two-byte body, immediately.
    Ok,
    /// Responds with the given status code and a two-byte body.
    Status(u16),
    /// Reads the request and never answers.
    Hang,
    /// Sends headers and half the body, then stalls before the rest.
    SlowBody(Duration),
}

pub(crate) struct TestServer {
    pub(crate) url: String,
    hits: Arc<AtomicU64>,
    body_bytes: Arc<AtomicU64>,
    accept_task: JoinHandle<()>,
}

impl TestServer {
    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Acquire)
    }

    pub(crate) fn body_bytes(&self) -> u64 {
        self.body_bytes.load(Ordering::Acquire)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

pub(crate) async fn spawn_test_server(behavior: ServerBehavior) -> Result<TestServer, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    let hits = Arc::new(AtomicU64::new(0));
    let body_bytes = Arc::new(AtomicU64::new(0));

    let accept_task = {
        let hits = Arc::clone(&hits);
        let body_bytes = Arc::clone(&body_bytes);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle_connection(
                    stream,
                    behavior,
                    Arc::clone(&hits),
                    Arc::clone(&body_bytes),
                ));
            }
        })
    };

    Ok(TestServer {
        url: format!("http://{}/", addr),
        hits,
        body_bytes,
        accept_task,
    })
}

/// Address that refuses connections: bound once, then released.
pub(crate) async fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

async fn handle_connection(
    mut stream: TcpStream,
    behavior: ServerBehavior,
    hits: Arc<AtomicU64>,
    body_bytes: Arc<AtomicU64>,
) {
    loop {
        let Some(received_body) = read_request(&mut stream).await else {
            return;
        };
        hits.fetch_add(1, Ordering::AcqRel);
        body_bytes.fetch_add(received_body, Ordering::AcqRel);

        let written = match behavior {
            ServerBehavior::Ok => stream.write_all(OK_RESPONSE).await,
            ServerBehavior::Status(code) => {
                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: 2\r\n\r\nNO",
                    code
                );
                stream.write_all(response.as_bytes()).await
            }
            ServerBehavior::Hang => {
                sleep(HANG_FOR).await;
                return;
            }
            ServerBehavior::SlowBody(stall) => {
                if stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nOK")
                    .await
                    .is_err()
                {
                    return;
                }
                sleep(stall).await;
                stream.write_all(b"OK").await
            }
        };
        if written.is_err() {
            return;
        }
    }
}

/// Reads one request head plus its `Content-Length` body. Returns the body
/// size, or `None` once the peer is gone.
async fn read_request(stream: &mut TcpStream) -> Option<u64> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = find_head_end(&head) {
            break pos;
        }
        if head.len() > MAX_HEAD_BYTES {
            return None;
        }
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        head.extend_from_slice(chunk.get(..read)?);
    };

    let content_length = content_length(head.get(..head_end)?);
    let already = u64::try_from(head.len().saturating_sub(head_end.saturating_add(4))).ok()?;
    let mut remaining = content_length.saturating_sub(already);
    while remaining > 0 {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        remaining = remaining.saturating_sub(u64::try_from(read).ok()?);
    }
    Some(content_length)
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(head: &[u8]) -> u64 {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
