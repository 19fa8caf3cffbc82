//! Per-connection request loop
//!
//! Reads one line, answers it, flushes, repeats. Responses leave in the same
//! order the requests arrived. EOF from the peer ends the loop normally.
//! A line longer than the limit is answered as soon as the limit is passed
//! and the rest of it is skipped without being buffered.

use std::net::SocketAddr;

use eyre::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::executor::Executor;
use crate::protocol::{ParseError, Request, Response, strip_terminator};
use crate::registry::{RegistryError, TaskRegistry};

/// Routes parsed requests to the registry and executor
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: TaskRegistry,
    executor: Executor,
}

impl Dispatcher {
    pub fn new(registry: TaskRegistry, executor: Executor) -> Self {
        Self { registry, executor }
    }

    /// Produce the response for one request
    pub async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::Submit { kind, payload } => {
                debug!(%kind, "dispatch: submit");
                let id = match self.registry.create(kind, payload).await {
                    Ok(id) => id,
                    Err(e) => return Response::ServerError(e.to_string()),
                };
                if let Err(e) = self.executor.submit(&id) {
                    warn!(%id, error = %e, "Executor refused task");
                    // Leave nothing behind that would sit in `enqueued` forever
                    if let Err(finish_err) = self.registry.finish(&id, Err(e.to_string())).await {
                        warn!(%id, error = %finish_err, "Cannot mark refused task as failed");
                    }
                    return Response::ServerError(e.to_string());
                }
                Response::Scheduled { id }
            }
            Request::Status { id } => {
                debug!(%id, "dispatch: status");
                match self.registry.get(&id).await {
                    Ok(task) => Response::for_task(&task),
                    Err(RegistryError::NotFound(_)) => Response::NotFound,
                    Err(e) => Response::ServerError(e.to_string()),
                }
            }
        }
    }
}

/// Outcome of reading one request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
    /// Peer closed the connection before sending anything
    Eof,
    /// A complete line (or the unterminated tail at EOF) is in the buffer
    Line,
    /// Content passed the limit; `terminated` is false while the rest of the
    /// line is still unread
    TooLong { terminated: bool },
}

/// Read one line into `line`, holding at most `max_line_bytes` of content
/// plus one buffered chunk
async fn read_request_line<R>(reader: &mut R, line: &mut Vec<u8>, max_line_bytes: usize) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(if line.is_empty() { LineRead::Eof } else { LineRead::Line });
        }

        match chunk.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                line.extend_from_slice(&chunk[..=pos]);
                reader.consume(pos + 1);
                if strip_terminator(line).len() > max_line_bytes {
                    return Ok(LineRead::TooLong { terminated: true });
                }
                return Ok(LineRead::Line);
            }
            None => {
                let n = chunk.len();
                line.extend_from_slice(chunk);
                reader.consume(n);
                // One byte of slack for a `\r` whose `\n` has not arrived yet
                if line.len() > max_line_bytes + 1 {
                    return Ok(LineRead::TooLong { terminated: false });
                }
            }
        }
    }
}

/// Drop input up to and including the next newline; false on EOF
async fn discard_line<R>(reader: &mut R) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(false);
        }
        match chunk.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(true);
            }
            None => {
                let n = chunk.len();
                reader.consume(n);
            }
        }
    }
}

/// Serve one client until it disconnects
pub async fn serve_connection<S>(stream: S, peer: SocketAddr, dispatcher: Dispatcher, max_line_bytes: usize) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!(%peer, "serve_connection: called");
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = read_request_line(&mut reader, &mut line, max_line_bytes)
            .await
            .context("Failed to read request")?;

        let response = match read {
            LineRead::Eof => {
                debug!(%peer, "serve_connection: peer closed the connection");
                break;
            }
            LineRead::Line => match Request::decode(&line, max_line_bytes) {
                Ok(request) => dispatcher.dispatch(request).await,
                Err(e) => {
                    debug!(%peer, error = %e, "serve_connection: malformed request");
                    Response::from(e)
                }
            },
            LineRead::TooLong { .. } => {
                warn!(%peer, max_line_bytes, "Request line too long");
                Response::from(ParseError::TooLong(max_line_bytes))
            }
        };

        writer
            .write_all(response.to_line().as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;

        if read == (LineRead::TooLong { terminated: false }) {
            let more = discard_line(&mut reader).await.context("Failed to skip long request")?;
            if !more {
                debug!(%peer, "serve_connection: peer closed during long request");
                break;
            }
        }
    }

    // Peer is already gone; a failed shutdown changes nothing
    let _ = writer.shutdown().await;
    Ok(())
}
