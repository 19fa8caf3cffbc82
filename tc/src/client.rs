//! Line-protocol client for a taskd server
//!
//! One TCP connection carries every request; each request is answered by
//! exactly one response line.

use std::time::Duration;

use eyre::{Context, Result, bail};
use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use taskd::domain::{TaskKind, TaskState};
use taskd::protocol::{NOT_FOUND, Request};

/// Default timeout for connecting and for each round trip
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifier carried by a response line: the text before its first colon
pub fn task_id(response: &str) -> Option<&str> {
    let (id, _) = response.split_once(':')?;
    let id = id.trim();
    if id.is_empty() { None } else { Some(id) }
}

/// Whether a status line reports a task that will never change again
pub fn is_finished(response: &str) -> bool {
    response.contains(&TaskState::Done.to_string()) || response.contains(&format!(": {}", TaskState::Failed))
}

/// Connected client
#[derive(Debug)]
pub struct TaskClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Duration,
}

impl TaskClient {
    /// Connect to `host:port`
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        debug!("TaskClient::connect: {}", addr);
        let stream = tokio::time::timeout(DEFAULT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .context(format!("Timed out connecting to {}", addr))?
            .context(format!("Failed to connect to {}", addr))?;
        let (read_half, writer) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set a custom per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit a task; returns the server's response line
    pub async fn submit(&mut self, kind: TaskKind, data: &str) -> Result<String> {
        if data.contains('\n') {
            bail!("Task data must fit on one line");
        }
        let request = Request::Submit {
            kind,
            payload: data.to_string(),
        };
        self.round_trip(&request.to_line()).await
    }

    /// Ask for the state of a task; returns the server's response line
    pub async fn status(&mut self, id: &str) -> Result<String> {
        let request = Request::Status { id: id.into() };
        self.round_trip(&request.to_line()).await
    }

    /// Query `id` every `interval` until it finishes
    ///
    /// Every response is handed to `on_response` as it arrives; the final one
    /// is also returned.
    pub async fn poll_until_done<F>(&mut self, id: &str, interval: Duration, mut on_response: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        loop {
            let response = self.status(id).await?;
            on_response(&response);

            if is_finished(&response) {
                return Ok(response);
            }
            if response == NOT_FOUND || task_id(&response) != Some(id) {
                bail!("Server stopped tracking task {}: {}", id, response);
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn round_trip(&mut self, line: &str) -> Result<String> {
        debug!("TaskClient: sending {:?}", line);
        let exchange = async {
            self.writer
                .write_all(line.as_bytes())
                .await
                .context("Failed to send request")?;
            self.writer.flush().await.context("Failed to flush request")?;

            let mut response = String::new();
            let n = self
                .reader
                .read_line(&mut response)
                .await
                .context("Failed to read response")?;
            if n == 0 {
                bail!("Server closed the connection");
            }
            Ok::<_, eyre::Report>(response.trim_end_matches(['\r', '\n']).to_string())
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .context("Timed out waiting for response")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskd::config::Config;
    use taskd::executor::ExecutorConfig;
    use taskd::server::Server;

    async fn start_server(executor: ExecutorConfig) -> u16 {
        let mut config = Config::default();
        config.server.port = 0;
        config.executor = executor;
        let server = Server::start(&config).await.unwrap();
        let port = server.local_addr().unwrap().port();
        tokio::spawn(server.run(std::future::pending::<()>()));
        port
    }

    #[test]
    fn test_task_id_before_first_colon() {
        assert_eq!(task_id("3f9a61c2: task scheduled"), Some("3f9a61c2"));
        assert_eq!(task_id("3f9a61c2: done, result: a:b"), Some("3f9a61c2"));
        assert_eq!(task_id("No such task"), None);
        assert_eq!(task_id(": nothing"), None);
    }

    #[test]
    fn test_is_finished() {
        assert!(is_finished("3f9a61c2: done, result: dcba"));
        assert!(is_finished("3f9a61c2: failed, error: too big"));
        assert!(!is_finished("3f9a61c2: enqueued"));
        assert!(!is_finished("3f9a61c2: processing"));
        assert!(!is_finished("No such task"));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(TaskClient::connect("127.0.0.1", port).await.is_err());
    }

    #[tokio::test]
    async fn test_submit_and_status() {
        let port = start_server(ExecutorConfig::with_uniform_delay(Duration::from_millis(200))).await;
        let mut client = TaskClient::connect("127.0.0.1", port).await.unwrap();

        let response = client.submit(TaskKind::Reverse, "abcd").await.unwrap();
        assert!(response.ends_with(": task scheduled"), "got {}", response);
        let id = task_id(&response).unwrap().to_string();

        let status = client.status(&id).await.unwrap();
        assert!(!is_finished(&status), "got {}", status);

        assert_eq!(client.status("nope").await.unwrap(), NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_rejects_multiline_data() {
        let port = start_server(ExecutorConfig::with_uniform_delay(Duration::ZERO)).await;
        let mut client = TaskClient::connect("127.0.0.1", port).await.unwrap();
        assert!(client.submit(TaskKind::Reverse, "a\nb").await.is_err());
    }

    #[tokio::test]
    async fn test_poll_until_done_reports_every_response() {
        let port = start_server(ExecutorConfig::with_uniform_delay(Duration::from_millis(50))).await;
        let mut client = TaskClient::connect("127.0.0.1", port).await.unwrap();

        let response = client.submit(TaskKind::RunLengthExpand, "xyz").await.unwrap();
        let id = task_id(&response).unwrap().to_string();

        let mut seen = Vec::new();
        let last = client
            .poll_until_done(&id, Duration::from_millis(10), |line| seen.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(last, format!("{}: done, result: xyyzzz", id));
        assert_eq!(seen.last(), Some(&last));
        assert!(seen.iter().all(|line| line.starts_with(&id)));
    }

    #[tokio::test]
    async fn test_poll_until_done_stops_on_failure() {
        let mut executor = ExecutorConfig::with_uniform_delay(Duration::ZERO);
        executor.max_result_chars = 3;
        let port = start_server(executor).await;
        let mut client = TaskClient::connect("127.0.0.1", port).await.unwrap();

        let response = client.submit(TaskKind::RunLengthExpand, "abc").await.unwrap();
        let id = task_id(&response).unwrap().to_string();

        let last = client.poll_until_done(&id, Duration::from_millis(10), |_| {}).await.unwrap();
        assert!(last.starts_with(&format!("{}: failed", id)), "got {}", last);
    }

    #[tokio::test]
    async fn test_poll_unknown_id_is_error() {
        let port = start_server(ExecutorConfig::with_uniform_delay(Duration::ZERO)).await;
        let mut client = TaskClient::connect("127.0.0.1", port).await.unwrap();
        assert!(client.poll_until_done("deadbeef", Duration::from_millis(10), |_| {}).await.is_err());
    }
}
