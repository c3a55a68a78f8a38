// src/session/directories.rs

use std::path::PathBuf;

/// Supplies the ordered set of directories to watch.
///
/// Consulted once per `start_watch` call, so an implementation backed by
/// something mutable picks up changes on the next start.
pub trait TestDirectories: Send + Sync {
    fn test_directories(&self) -> Vec<PathBuf>;
}

/// Fixed list of directories, e.g. from the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticTestDirectories {
    dirs: Vec<PathBuf>,
}

impl StaticTestDirectories {
    pub fn new(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }
}

impl TestDirectories for StaticTestDirectories {
    fn test_directories(&self) -> Vec<PathBuf> {
        self.dirs.clone()
    }
}
