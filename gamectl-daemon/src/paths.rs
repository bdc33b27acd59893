use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DAEMON_LABEL: &str = "dev.gamectl.daemon";
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub const DAEMON_SOCKET: &str = "gamectl.sock";
pub const RECORD_FILE: &str = "globals.yaml";

pub fn gamectl_root(home: &Path) -> PathBuf {
    home.join(".gamectl")
}

pub fn run_dir(home: &Path) -> PathBuf {
    gamectl_root(home).join("run")
}

pub fn socket_path(home: &Path) -> PathBuf {
    run_dir(home).join(DAEMON_SOCKET)
}

pub fn record_path(home: &Path) -> PathBuf {
    gamectl_root(home).join(RECORD_FILE)
}
