//! MCP stdio Transport
//!
//! Newline-delimited JSON-RPC 2.0 over a reader/writer pair (stdin/stdout in
//! production, in-memory pipes in tests).
//!
//! - one message per line, blank lines are skipped; a line that is not UTF-8
//!   or not JSON is answered with a parse error and reading continues
//! - each request runs on its own task; a single writer task owns the output
//! - `notifications/cancelled` aborts the named request and drops its response
//! - a request reusing the id of one still in flight is rejected
//! - EOF stops reading; in-flight requests finish before `serve` returns

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::protocol::{dispatch, Handler};
use crate::types::error::ErrorData;
use crate::types::jsonrpc::{JsonRpcErrorResponse, JsonRpcMessage, JsonRpcResponse, RequestId};

/// Depth of the outgoing line queue.
const OUTBOX_CAPACITY: usize = 64;

/// Transport-level failures. Protocol errors are answered, not returned.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("stdio I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("writer task failed: {0}")]
    Writer(String),
}

type InFlight = Arc<DashMap<RequestId, CancellationToken>>;

/// Serve MCP over the process's stdin/stdout until stdin closes.
pub async fn serve_stdio<H: Handler>(handler: Arc<H>) -> Result<(), TransportError> {
    serve(handler, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve MCP over an arbitrary reader/writer pair until the reader hits EOF.
pub async fn serve<H, R, W>(handler: Arc<H>, reader: R, writer: W) -> Result<(), TransportError>
where
    H: Handler,
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbox, rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);
    let writer_task = tokio::spawn(write_lines(writer, rx));

    let in_flight: InFlight = Arc::new(DashMap::new());
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut reader = BufReader::new(reader);
    // Survives select! cancellation: read_until appends and resumes.
    let mut buf: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => {
                let eof = read? == 0;
                if !buf.is_empty() {
                    handle_line(&handler, &buf, &outbox, &in_flight, &mut tasks).await;
                    buf.clear();
                }
                if eof {
                    break;
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "Request task failed");
                }
            }
        }
    }

    debug!(pending = tasks.len(), "Input closed, draining in-flight requests");
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Request task failed");
        }
    }

    drop(outbox);
    writer_task
        .await
        .map_err(|e| TransportError::Writer(e.to_string()))??;

    info!("MCP stdio transport closed");
    Ok(())
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::Receiver<String>) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}

async fn handle_line<H: Handler>(
    handler: &Arc<H>,
    raw_line: &[u8],
    outbox: &mpsc::Sender<String>,
    in_flight: &InFlight,
    tasks: &mut JoinSet<()>,
) {
    let line = match std::str::from_utf8(raw_line) {
        Ok(line) => line.trim(),
        Err(e) => {
            warn!(error = %e, "Input line is not UTF-8");
            let error = ErrorData::parse_error(format!("Invalid UTF-8: {}", e));
            send(outbox, &JsonRpcErrorResponse::new(None, error)).await;
            return;
        }
    };
    if line.is_empty() {
        return;
    }

    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Unparseable input line");
            let error = ErrorData::parse_error(format!("Invalid JSON: {}", e));
            send(outbox, &JsonRpcErrorResponse::new(None, error)).await;
            return;
        }
    };

    if raw.get("method").is_none() {
        if raw.get("result").is_some() || raw.get("error").is_some() {
            debug!(id = ?raw.get("id"), "Ignoring client response");
            return;
        }
        let error = ErrorData::invalid_request("Expected a JSON-RPC request or notification");
        send(outbox, &JsonRpcErrorResponse::new(extract_id(&raw), error)).await;
        return;
    }

    let message: JsonRpcMessage = match serde_json::from_value(raw.clone()) {
        Ok(m) => m,
        Err(e) => {
            let error = ErrorData::invalid_request(format!("Invalid JSON-RPC: {}", e));
            send(outbox, &JsonRpcErrorResponse::new(extract_id(&raw), error)).await;
            return;
        }
    };

    let Some(id) = message.id.clone() else {
        handle_notification(&message, in_flight);
        return;
    };

    debug!(method = %message.method, id = %id, "Processing MCP request");

    let token = CancellationToken::new();
    let duplicate = match in_flight.entry(id.clone()) {
        Entry::Occupied(_) => true,
        Entry::Vacant(slot) => {
            slot.insert(token.clone());
            false
        }
    };
    if duplicate {
        warn!(id = %id, "Request id already in flight");
        let error = ErrorData::invalid_request(format!("Request id {} is already in flight", id));
        send(outbox, &JsonRpcErrorResponse::new(Some(id), error)).await;
        return;
    }

    let handler = Arc::clone(handler);
    let outbox = outbox.clone();
    let in_flight = Arc::clone(in_flight);

    tasks.spawn(async move {
        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = dispatch(handler.as_ref(), &message) => Some(result),
        };

        in_flight.remove(&id);

        match outcome {
            Some(Ok(result)) => send(&outbox, &JsonRpcResponse::success(id, result)).await,
            Some(Err(error)) => send(&outbox, &JsonRpcErrorResponse::new(Some(id), error)).await,
            None => info!(id = %id, "Request cancelled by client"),
        }
    });
}

fn handle_notification(message: &JsonRpcMessage, in_flight: &InFlight) {
    match message.method.as_str() {
        "notifications/initialized" => info!("MCP handshake complete"),
        "notifications/cancelled" => {
            let id = message
                .params
                .as_ref()
                .and_then(|p| p.get("requestId"))
                .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());

            match id {
                Some(id) => match in_flight.get(&id) {
                    Some(token) => {
                        debug!(id = %id, "Cancelling in-flight request");
                        token.cancel();
                    }
                    None => debug!(id = %id, "Cancellation for unknown or finished request"),
                },
                None => warn!("notifications/cancelled without a usable requestId"),
            }
        }
        other => debug!(method = %other, "Ignoring notification"),
    }
}

fn extract_id(raw: &Value) -> Option<RequestId> {
    raw.get("id")
        .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok())
}

async fn send<T: Serialize>(outbox: &mpsc::Sender<String>, message: &T) {
    match serde_json::to_string(message) {
        Ok(line) => {
            if outbox.send(line).await.is_err() {
                warn!("Output closed, dropping message");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize outgoing message"),
    }
}
