use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Debug log file (~/.treenav/debug/treenav.log)
pub fn debug_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".treenav").join("debug").join("treenav.log"))
}

/// Debug logging helper (only active when TREENAV_DEBUG=1)
pub fn debug_log(msg: &str) {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    let enabled = ENABLED.get_or_init(|| {
        std::env::var("TREENAV_DEBUG").map(|v| v == "1").unwrap_or(false)
    });
    if !*enabled { return; }
    let Some(log_path) = debug_log_path() else { return };
    if let Some(debug_dir) = log_path.parent() {
        let _ = std::fs::create_dir_all(debug_dir);
    }
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] {}", timestamp, msg);
    }
}
