//! Reusable configuration fixtures.
//!
//! - [`MOCK_NAMELIST`]: what a [`MockEngine`](crate::MockEngine) needs.
//! - [`hydro_namelist`]: a small hydrology domain.
//! - [`TempConfig`]: a descriptor written to disk, for path-based tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Minimal namelist accepted by the mock engine.
pub const MOCK_NAMELIST: &str = "&mock_config\n  label = 'fixture'\n  verbose = .false.\n/\n";

/// A hydrology namelist for an `nx` by `ny` land grid, one day at hourly steps.
pub fn hydro_namelist(nx: usize, ny: usize) -> String {
    format!(
        "&hydro_nlist\n  nx = {nx}\n  ny = {ny}\n  dx = 1000.0\n  routing_factor = 2\n  \
         start_time = 0.0\n  end_time = 86400.0\n  time_step = 3600.0\n  seed = 7\n/\n"
    )
}

/// A descriptor file in the system temp directory, removed on drop.
#[derive(Debug)]
pub struct TempConfig {
    dir: PathBuf,
    path: PathBuf,
}

impl TempConfig {
    /// Write `contents` to `<tmp>/<unique>/namelist.hydro`.
    pub fn new(contents: &str) -> Self {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "bmi-fixture-{}-{}",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).expect("create fixture dir");
        let path = dir.join("namelist.hydro");
        std::fs::write(&path, contents).expect("write fixture config");
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as a descriptor string.
    pub fn descriptor(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
