use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

use gamectl_core::GameState;
use gamectl_store::{StoreEvent, StoreRequest, StoreResponse};

use crate::error::{io_err, DaemonError};
use crate::paths::{gamectl_root, record_path, run_dir, socket_path, DEBOUNCE_WINDOW, RECORD_FILE};
use crate::record::{self, RecordFile, SINGLETON_ID};

/// The in-memory row, shared between the socket server and the watcher.
pub type SharedRow = Arc<RwLock<Option<GameState>>>;

/// Fan-out capacity for update notifications. A subscriber that lags this
/// far behind is disconnected rather than queued.
const CHANGES_BUFFER: usize = 64;

/// What the client handler should do after a request is answered.
#[derive(Debug, PartialEq, Eq)]
enum ClientAction {
    Continue,
    StartStream,
    Close,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

/// Run the daemon runtime.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let row: SharedRow = Arc::new(RwLock::new(
        record::load_at(&home)?.map(|file| file.record),
    ));
    let (changes_tx, _) = broadcast::channel::<GameState>(CHANGES_BUFFER);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);
    let started_at_unix = unix_seconds_now();

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let row = row.clone();
        let changes_tx = changes_tx.clone();
        tokio::spawn(async move {
            let result = watcher_task(home, row, changes_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let row = row.clone();
        let changes_tx = changes_tx.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                row,
                changes_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (watcher_result, socket_result, signal_result) =
        tokio::join!(watcher_handle, socket_handle, signal_handle);

    handle_join("watcher", watcher_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

async fn apply_request(
    home: &Path,
    row: &SharedRow,
    changes_tx: &broadcast::Sender<GameState>,
    shutdown_tx: &broadcast::Sender<()>,
    started_at_unix: u64,
    request: &StoreRequest,
) -> (StoreResponse, ClientAction) {
    match request.cmd.as_str() {
        "fetch" => {
            let guard = row.read().await;
            let response = match *guard {
                Some(record) => match serde_json::to_value(record) {
                    Ok(value) => StoreResponse::ok(value),
                    Err(err) => StoreResponse::error(err.to_string()),
                },
                None => StoreResponse::empty(),
            };
            (response, ClientAction::Continue)
        }
        "insert" => {
            let mut guard = row.write().await;
            // First writer wins: a concurrent creator gets the live row.
            if let Some(existing) = *guard {
                return (row_response(existing), ClientAction::Continue);
            }
            let created = GameState::new(SINGLETON_ID);
            match persist(home, created).await {
                Ok(()) => {
                    *guard = Some(created);
                    tracing::info!(id = %created.id, "created game state record");
                    (row_response(created), ClientAction::Continue)
                }
                Err(err) => {
                    tracing::error!(error = %err, "insert persistence failed");
                    (StoreResponse::error(err.to_string()), ClientAction::Continue)
                }
            }
        }
        "update" => {
            let (Some(id), Some(set)) = (request.id, request.set) else {
                return (
                    StoreResponse::error("update requires 'id' and 'set'"),
                    ClientAction::Continue,
                );
            };
            let mut guard = row.write().await;
            match *guard {
                Some(current) if current.id == id => {
                    let updated = set.apply(&current);
                    // Disk before memory: a failed save leaves the row as
                    // the clients last saw it.
                    match persist(home, updated).await {
                        Ok(()) => {
                            *guard = Some(updated);
                            let _ = changes_tx.send(updated);
                            tracing::debug!(id = %updated.id, "applied update");
                            (row_response(updated), ClientAction::Continue)
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "update persistence failed");
                            (StoreResponse::error(err.to_string()), ClientAction::Continue)
                        }
                    }
                }
                _ => (
                    StoreResponse::error(format!("no record with id {id}")),
                    ClientAction::Continue,
                ),
            }
        }
        "subscribe" => (StoreResponse::ok(json!({ "subscribed": true })), ClientAction::StartStream),
        "status" => {
            let guard = row.read().await;
            let payload = json!({
                "running": true,
                "label": crate::paths::DAEMON_LABEL,
                "started_at_unix": started_at_unix,
                "record": (*guard).map(|r| json!({ "id": r.id })),
                "subscribers": changes_tx.receiver_count(),
                "socket": socket_path(home).display().to_string(),
                "record_file": record_path(home).display().to_string(),
            });
            (StoreResponse::ok(payload), ClientAction::Continue)
        }
        "stop" => {
            let _ = shutdown_tx.send(());
            (StoreResponse::ok(json!({ "stopping": true })), ClientAction::Close)
        }
        other => (
            StoreResponse::error(format!("unknown command '{other}'")),
            ClientAction::Continue,
        ),
    }
}

fn row_response(record: GameState) -> StoreResponse {
    match serde_json::to_value(record) {
        Ok(value) => StoreResponse::ok(value),
        Err(err) => StoreResponse::error(err.to_string()),
    }
}

async fn persist(home: &Path, record: GameState) -> Result<(), DaemonError> {
    let home = home.to_path_buf();
    let file = RecordFile::now(record);
    tokio::task::spawn_blocking(move || record::save_at(&home, &file))
        .await
        .map_err(|err| DaemonError::Protocol(format!("persist task join error: {err}")))?
}

// ---------------------------------------------------------------------------
// Socket server
// ---------------------------------------------------------------------------

async fn socket_server_task(
    home: PathBuf,
    row: SharedRow,
    changes_tx: broadcast::Sender<GameState>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "store daemon listening");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let home = home.clone();
                let row = row.clone();
                let changes_tx = changes_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        home,
                        row,
                        changes_tx,
                        shutdown_tx,
                        started_at_unix,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    home: PathBuf,
    row: SharedRow,
    changes_tx: broadcast::Sender<GameState>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: StoreRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &StoreResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let (response, action) = apply_request(
            &home,
            &row,
            &changes_tx,
            &shutdown_tx,
            started_at_unix,
            &request,
        )
        .await;
        write_response(&mut writer, &response).await?;

        match action {
            ClientAction::Continue => {}
            ClientAction::Close => break,
            ClientAction::StartStream => {
                // The connection now belongs to the subscription; no
                // further requests are read on it.
                let changes_rx = changes_tx.subscribe();
                let shutdown_rx = shutdown_tx.subscribe();
                stream_updates(&mut writer, changes_rx, shutdown_rx).await;
                break;
            }
        }
    }

    Ok(())
}

async fn stream_updates(
    writer: &mut OwnedWriteHalf,
    mut changes_rx: broadcast::Receiver<GameState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            change = changes_rx.recv() => {
                match change {
                    Ok(record) => {
                        if write_event(writer, &StoreEvent::update(record)).await.is_err() {
                            break; // subscriber went away
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber lagged, closing its stream");
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record file watcher
// ---------------------------------------------------------------------------

async fn watcher_task(
    home: PathBuf,
    row: SharedRow,
    changes_tx: broadcast::Sender<GameState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let root = gamectl_root(&home);
    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
    }

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut _watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    _watcher.watch(&root, RecursiveMode::NonRecursive)?;

    let mut debounce = HashMap::<PathBuf, Instant>::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }

                for path in event.paths {
                    if !is_record_file(&path) {
                        continue;
                    }
                    if !should_process_event(&mut debounce, &path, Instant::now()) {
                        continue;
                    }
                    if let Err(err) = reload_after_change(&home, &row, &changes_tx).await {
                        tracing::warn!(error = %err, "record file re-read failed");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Re-read the record file and broadcast the row image if it differs from
/// the in-memory copy. Out-of-band edits propagate to subscribers exactly
/// like socket-driven updates.
async fn reload_after_change(
    home: &Path,
    row: &SharedRow,
    changes_tx: &broadcast::Sender<GameState>,
) -> Result<(), DaemonError> {
    let home_for_load = home.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || record::load_at(&home_for_load))
        .await
        .map_err(|err| DaemonError::Protocol(format!("reload task join error: {err}")))??;

    let Some(file) = loaded else {
        // The row is never deleted by this system; a missing file is an
        // external mishap, keep serving the in-memory copy.
        return Ok(());
    };

    let mut guard = row.write().await;
    if *guard == Some(file.record) {
        return Ok(());
    }
    tracing::info!(id = %file.record.id, "record file changed out of band");
    *guard = Some(file.record);
    let _ = changes_tx.send(file.record);
    Ok(())
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn is_record_file(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()) == Some(RECORD_FILE)
}

fn should_process_event(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
) -> bool {
    should_process_event_with_threshold(debounce, path, now, DEBOUNCE_WINDOW)
}

fn should_process_event_with_threshold(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let root = gamectl_root(home);
    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
    }
    let run = run_dir(home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }
    Ok(())
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &StoreResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    write_line(writer, &payload).await
}

async fn write_event(writer: &mut OwnedWriteHalf, event: &StoreEvent) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(event)?;
    write_line(writer, &payload).await
}

async fn write_line(writer: &mut OwnedWriteHalf, payload: &str) -> Result<(), DaemonError> {
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use gamectl_core::{Flag, RecordId, WriteSet};
    use tempfile::TempDir;
    use tokio::time::advance;

    struct Fixture {
        home: TempDir,
        row: SharedRow,
        changes_tx: broadcast::Sender<GameState>,
        shutdown_tx: broadcast::Sender<()>,
    }

    impl Fixture {
        fn new() -> Self {
            let (changes_tx, _) = broadcast::channel(CHANGES_BUFFER);
            let (shutdown_tx, _) = broadcast::channel(4);
            Self {
                home: TempDir::new().expect("home"),
                row: Arc::new(RwLock::new(None)),
                changes_tx,
                shutdown_tx,
            }
        }

        async fn apply(&self, request: StoreRequest) -> (StoreResponse, ClientAction) {
            apply_request(
                self.home.path(),
                &self.row,
                &self.changes_tx,
                &self.shutdown_tx,
                1_000_000,
                &request,
            )
            .await
        }
    }

    #[tokio::test]
    async fn fetch_on_empty_store_returns_null_data() {
        let fx = Fixture::new();
        let (response, action) = fx.apply(StoreRequest::bare("fetch")).await;
        assert!(response.ok);
        assert_eq!(response.data, Some(serde_json::Value::Null));
        assert_eq!(action, ClientAction::Continue);
    }

    #[tokio::test]
    async fn insert_creates_and_persists_the_default_row() {
        let fx = Fixture::new();
        let (response, _) = fx.apply(StoreRequest::bare("insert")).await;
        assert!(response.ok, "insert failed: {:?}", response.error);

        let record: GameState =
            serde_json::from_value(response.data.expect("record")).expect("decode");
        assert_eq!(record.id, SINGLETON_ID);
        assert!(!record.game_has_started);

        let on_disk = record::load_at(fx.home.path())
            .expect("load")
            .expect("record file");
        assert_eq!(on_disk.record, record);
    }

    #[tokio::test]
    async fn second_insert_returns_the_live_row_unchanged() {
        let fx = Fixture::new();
        fx.apply(StoreRequest::bare("insert")).await;

        let mut set = WriteSet::default();
        set.set(Flag::GameStarted, true);
        fx.apply(StoreRequest::update(SINGLETON_ID, set)).await;

        let (response, _) = fx.apply(StoreRequest::bare("insert")).await;
        let record: GameState =
            serde_json::from_value(response.data.expect("record")).expect("decode");
        assert!(record.game_has_started, "existing row must win the race");
    }

    #[tokio::test]
    async fn update_broadcasts_the_post_update_image() {
        let fx = Fixture::new();
        fx.apply(StoreRequest::bare("insert")).await;
        let mut changes_rx = fx.changes_tx.subscribe();

        let mut set = WriteSet::default();
        set.set(Flag::GameStarted, true);
        let (response, _) = fx.apply(StoreRequest::update(SINGLETON_ID, set)).await;
        assert!(response.ok);

        let pushed = changes_rx.recv().await.expect("broadcast");
        assert!(pushed.game_has_started);

        let on_disk = record::load_at(fx.home.path())
            .expect("load")
            .expect("record file");
        assert_eq!(on_disk.record, pushed, "disk and broadcast must agree");
    }

    #[tokio::test]
    async fn update_with_wrong_id_is_rejected() {
        let fx = Fixture::new();
        fx.apply(StoreRequest::bare("insert")).await;

        let mut set = WriteSet::default();
        set.set(Flag::GameStarted, true);
        let (response, _) = fx.apply(StoreRequest::update(RecordId(42), set)).await;
        assert!(!response.ok);
        assert!(response.error.expect("error").contains("no record"));
    }

    #[tokio::test]
    async fn stop_triggers_shutdown_and_closes_the_client() {
        let fx = Fixture::new();
        let mut shutdown_rx = fx.shutdown_tx.subscribe();
        let (response, action) = fx.apply(StoreRequest::bare("stop")).await;
        assert!(response.ok);
        assert_eq!(action, ClientAction::Close);
        shutdown_rx.recv().await.expect("shutdown signal");
    }

    #[tokio::test]
    async fn unknown_command_is_an_error_response() {
        let fx = Fixture::new();
        let (response, action) = fx.apply(StoreRequest::bare("nope")).await;
        assert!(!response.ok);
        assert_eq!(action, ClientAction::Continue);
    }

    #[tokio::test]
    async fn out_of_band_file_edit_updates_memory_and_broadcasts() {
        let fx = Fixture::new();
        fx.apply(StoreRequest::bare("insert")).await;
        let mut changes_rx = fx.changes_tx.subscribe();

        // Simulate a manual edit of globals.yaml.
        let mut edited = GameState::new(SINGLETON_ID);
        edited.game_has_started = true;
        edited.checkpoint1_has_completed = true;
        record::save_at(fx.home.path(), &RecordFile::now(edited)).expect("save");

        reload_after_change(fx.home.path(), &fx.row, &fx.changes_tx)
            .await
            .expect("reload");

        let pushed = changes_rx.recv().await.expect("broadcast");
        assert_eq!(pushed, edited);
        assert_eq!(*fx.row.read().await, Some(edited));
    }

    #[tokio::test]
    async fn reload_without_difference_stays_silent() {
        let fx = Fixture::new();
        fx.apply(StoreRequest::bare("insert")).await;
        let mut changes_rx = fx.changes_tx.subscribe();

        // File already matches memory (insert persisted it).
        reload_after_change(fx.home.path(), &fx.row, &fx.changes_tx)
            .await
            .expect("reload");

        assert!(matches!(
            changes_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn debounce_coalesces_rapid_events() {
        let threshold = Duration::from_millis(100);
        let mut debounce = HashMap::<PathBuf, Instant>::new();
        let path = PathBuf::from("/tmp/globals.yaml");
        let mut reload_triggers = 0usize;

        for _ in 0..5 {
            if should_process_event_with_threshold(&mut debounce, &path, Instant::now(), threshold)
            {
                reload_triggers += 1;
            }
            advance(Duration::from_millis(10)).await;
        }

        advance(Duration::from_millis(150)).await;
        assert_eq!(
            reload_triggers, 1,
            "rapid saves should collapse to one re-read"
        );
    }

    #[tokio::test]
    async fn client_protocol_over_a_socket_pair() {
        let fx = Fixture::new();
        let (server, client) = UnixStream::pair().expect("socket pair");

        let handler = {
            let home = fx.home.path().to_path_buf();
            let row = fx.row.clone();
            let changes_tx = fx.changes_tx.clone();
            let shutdown_tx = fx.shutdown_tx.clone();
            tokio::spawn(async move {
                handle_socket_client(server, home, row, changes_tx, shutdown_tx, 1_000_000).await
            })
        };

        let (reader, mut writer) = client.into_split();
        let mut lines = BufReader::new(reader).lines();

        async fn send(writer: &mut tokio::net::unix::OwnedWriteHalf, request: StoreRequest) {
            let payload = serde_json::to_string(&request).expect("encode");
            writer.write_all(payload.as_bytes()).await.expect("write");
            writer.write_all(b"\n").await.expect("write");
            writer.flush().await.expect("flush");
        }

        send(&mut writer, StoreRequest::bare("insert")).await;
        let line = lines.next_line().await.expect("read").expect("line");
        let response: StoreResponse = serde_json::from_str(&line).expect("decode");
        assert!(response.ok);

        let mut set = WriteSet::default();
        set.set(Flag::GameStarted, true);
        send(&mut writer, StoreRequest::update(SINGLETON_ID, set)).await;
        let line = lines.next_line().await.expect("read").expect("line");
        let response: StoreResponse = serde_json::from_str(&line).expect("decode");
        assert!(response.ok);
        let record: GameState =
            serde_json::from_value(response.data.expect("record")).expect("record");
        assert!(record.game_has_started);

        drop(writer);
        drop(lines);
        handler.await.expect("join").expect("handler");
    }
}
