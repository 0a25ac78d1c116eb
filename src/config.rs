use std::path::PathBuf;
use std::time::Duration;

/// Settings section requested from the client
pub const CONFIG_SECTION: &str = "lll";

/// Default maximum line length passed to the checker
pub const DEFAULT_MAX_LENGTH: u32 = 80;

/// Default cap on diagnostics reported per validation run
pub const DEFAULT_MAX_NUMBER_OF_PROBLEMS: usize = 1000;

/// Checker executable looked up on PATH
pub const DEFAULT_CHECKER: &str = "lll";

/// Upper bound on a single checker invocation
pub const DEFAULT_CHECKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Label attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "lll";

/// Returns the path to the data directory for lll-lsp.
/// Uses $XDG_DATA_HOME/lll-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/lll-lsp,
/// or ./lll-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// File name of the log file inside [`data_dir`].
pub const LOG_FILE_NAME: &str = "lll-lsp.log";

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("lll-lsp")
}
