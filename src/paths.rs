/// Bundle-aware path resolution for macOS .app bundles.
///
/// Inside an `.app` bundle the working directory is whatever Finder chose
/// (usually `/`), so config and relative dataset paths are resolved from the
/// bundle layout instead. Under `cargo run` everything stays relative to the
/// working directory.

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "airfield3d";

/// Returns `true` when the running binary lives inside a macOS `.app` bundle
/// (i.e. the executable path contains `*.app/Contents/MacOS/`).
pub fn is_bundled() -> bool {
    bundle_contents_dir().is_some()
}

/// Returns the `Contents/` directory of the enclosing `.app` bundle, or
/// `None` when running outside a bundle.
fn bundle_contents_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let mut path = exe.as_path();
    loop {
        let parent = path.parent()?;
        if path.file_name().map(|n| n == "MacOS").unwrap_or(false)
            && parent.file_name().map(|n| n == "Contents").unwrap_or(false)
        {
            return Some(parent.to_path_buf());
        }
        path = parent;
    }
}

/// Base directory that relative dataset paths resolve against.
///
/// - **Bundled**: `Contents/MacOS/` (next to the bundled `assets/`)
/// - **Dev**: the current working directory
pub fn base_dir() -> PathBuf {
    if let Some(contents) = bundle_contents_dir() {
        contents.join("MacOS")
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Configuration directory.
///
/// - **Bundled**: the platform config dir, e.g. `~/Library/Application Support/airfield3d/`
/// - **Dev**: current working directory (`./config.toml`)
pub fn config_dir() -> PathBuf {
    if is_bundled() {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
    } else {
        std::env::current_dir().unwrap_or_default()
    }
}

/// Ensure a directory exists, creating it and all parents if necessary.
/// Returns the path unchanged for chaining.
pub fn ensure_dir(path: &Path) -> &Path {
    let _ = std::fs::create_dir_all(path);
    path
}
