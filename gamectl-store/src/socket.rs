//! Daemon-backed store client.
//!
//! One short-lived connection per request; one long-lived connection per
//! subscription. Requests and responses are JSON lines, see
//! [`crate::protocol`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;

use gamectl_core::{GameState, RecordId, WriteSet};

use crate::error::{io_err, StoreError};
use crate::protocol::{StoreEvent, StoreRequest, StoreResponse};
use crate::store::{ChangeFeed, GlobalsStore, FEED_BUFFER};

/// Client for the gamectl store daemon's unix socket.
#[derive(Debug, Clone)]
pub struct SocketStore {
    socket: PathBuf,
}

impl SocketStore {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket
    }

    async fn connect(&self) -> Result<UnixStream, StoreError> {
        if !self.socket.exists() {
            return Err(StoreError::DaemonNotRunning {
                socket: self.socket.clone(),
            });
        }
        UnixStream::connect(&self.socket).await.map_err(|err| {
            if matches!(
                err.kind(),
                ErrorKind::NotFound | ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset
            ) {
                StoreError::DaemonNotRunning {
                    socket: self.socket.clone(),
                }
            } else {
                io_err(&self.socket, err)
            }
        })
    }

    /// Send one request and read one response on a fresh connection.
    async fn request(&self, request: &StoreRequest) -> Result<StoreResponse, StoreError> {
        let stream = self.connect().await?;
        let (reader, mut writer) = stream.into_split();

        let payload = serde_json::to_string(request)?;
        writer
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| io_err(&self.socket, e))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| io_err(&self.socket, e))?;
        writer.flush().await.map_err(|e| io_err(&self.socket, e))?;

        let mut line = String::new();
        let read = BufReader::new(reader)
            .read_line(&mut line)
            .await
            .map_err(|e| io_err(&self.socket, e))?;
        if read == 0 {
            return Err(StoreError::Protocol(
                "store daemon closed connection before responding".to_string(),
            ));
        }
        Ok(serde_json::from_str(line.trim_end())?)
    }

    /// Daemon status payload (`gamectl daemon status`).
    pub async fn status(&self) -> Result<Value, StoreError> {
        let response = self.request(&StoreRequest::bare("status")).await?;
        if response.ok {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(StoreError::Protocol(unknown_error(response)))
        }
    }

    /// Status with a short retry window — used right after spawning the
    /// daemon, before its socket is up.
    pub async fn wait_for_status(&self) -> Result<Value, StoreError> {
        let mut last_not_running: Option<StoreError> = None;
        for attempt in 0..5 {
            match self.status().await {
                Ok(value) => return Ok(value),
                Err(err @ StoreError::DaemonNotRunning { .. }) => {
                    last_not_running = Some(err);
                    if attempt < 4 {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_not_running.unwrap_or_else(|| {
            StoreError::Protocol("status retry loop exited unexpectedly".to_string())
        }))
    }

    /// Ask the daemon to shut down.
    pub async fn stop(&self) -> Result<(), StoreError> {
        let response = self.request(&StoreRequest::bare("stop")).await?;
        if response.ok {
            Ok(())
        } else {
            Err(StoreError::Protocol(unknown_error(response)))
        }
    }
}

fn unknown_error(response: StoreResponse) -> String {
    response
        .error
        .unwrap_or_else(|| "unknown store daemon error".to_string())
}

fn record_from(data: Option<Value>) -> Result<GameState, StoreError> {
    let value = data.ok_or_else(|| {
        StoreError::Protocol("response carried no record payload".to_string())
    })?;
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl GlobalsStore for SocketStore {
    async fn fetch(&self) -> Result<GameState, StoreError> {
        let response = self
            .request(&StoreRequest::bare("fetch"))
            .await
            .map_err(fetch_side)?;
        if !response.ok {
            return Err(StoreError::Fetch(unknown_error(response)));
        }
        match response.data {
            Some(Value::Null) | None => Err(StoreError::NotFound),
            data => record_from(data),
        }
    }

    async fn insert_default(&self) -> Result<GameState, StoreError> {
        let response = self
            .request(&StoreRequest::bare("insert"))
            .await
            .map_err(write_side)?;
        if !response.ok {
            return Err(StoreError::Write(unknown_error(response)));
        }
        record_from(response.data)
    }

    async fn update(&self, id: RecordId, set: &WriteSet) -> Result<GameState, StoreError> {
        let response = self
            .request(&StoreRequest::update(id, *set))
            .await
            .map_err(write_side)?;
        if !response.ok {
            return Err(StoreError::Write(unknown_error(response)));
        }
        record_from(response.data)
    }

    async fn subscribe(&self) -> Result<ChangeFeed, StoreError> {
        let stream = self.connect().await?;
        let (reader, mut writer) = stream.into_split();

        let payload = serde_json::to_string(&StoreRequest::bare("subscribe"))?;
        writer
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| io_err(&self.socket, e))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| io_err(&self.socket, e))?;
        writer.flush().await.map_err(|e| io_err(&self.socket, e))?;

        let mut lines = BufReader::new(reader).lines();
        let ack = lines
            .next_line()
            .await
            .map_err(|e| io_err(&self.socket, e))?
            .ok_or_else(|| {
                StoreError::Protocol("store daemon closed connection on subscribe".to_string())
            })?;
        let ack: StoreResponse = serde_json::from_str(ack.trim_end())?;
        if !ack.ok {
            return Err(StoreError::Protocol(unknown_error(ack)));
        }

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        tokio::spawn(async move {
            // Writer half keeps the connection open for the stream's
            // lifetime; dropping it here would half-close the socket.
            let _writer = writer;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<StoreEvent>(line.trim_end()) {
                            Ok(event) if event.event == "update" => {
                                if tx.send(event.record).await.is_err() {
                                    break; // feed dropped
                                }
                            }
                            Ok(event) => {
                                tracing::debug!(event = %event.event, "ignoring unknown event");
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "bad subscription line");
                            }
                        }
                    }
                    Ok(None) => break, // daemon went away
                    Err(err) => {
                        tracing::warn!(error = %err, "subscription read error");
                        break;
                    }
                }
            }
        });
        Ok(ChangeFeed::new(rx))
    }
}

fn fetch_side(err: StoreError) -> StoreError {
    match err {
        err @ (StoreError::DaemonNotRunning { .. } | StoreError::Io { .. }) => err,
        StoreError::Json(e) => StoreError::Json(e),
        other => StoreError::Fetch(other.to_string()),
    }
}

fn write_side(err: StoreError) -> StoreError {
    match err {
        err @ (StoreError::DaemonNotRunning { .. } | StoreError::Io { .. }) => err,
        StoreError::Json(e) => StoreError::Json(e),
        other => StoreError::Write(other.to_string()),
    }
}
