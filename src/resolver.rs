use crate::env::Environment;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Looks up bare command names in the directories listed by `PATH`.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Split the `PATH` variable of `env` with the platform separator.
    ///
    /// An unset `PATH` yields a resolver that never finds anything. Empty
    /// entries are skipped.
    pub fn from_env(env: &Environment) -> Self {
        let dirs = env
            .get_var("PATH")
            .map(|paths| {
                std::env::split_paths(paths)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Every executable file named `name`, in `PATH` order.
    ///
    /// Names that are empty or contain a path separator are not looked up.
    pub fn search(&self, name: &str) -> Vec<PathBuf> {
        if name.is_empty() || has_separator(name) {
            return Vec::new();
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .filter(|candidate| is_executable(candidate))
            .collect()
    }

    /// First match of [`search`](Self::search).
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let found = self.search(name).into_iter().next();
        tracing::trace!(name, ?found, "PATH lookup");
        found
    }
}

pub(crate) fn has_separator(name: &str) -> bool {
    name.contains('/') || name.contains(MAIN_SEPARATOR)
}

/// A regular file (symlinks followed) with an execute bit set.
#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}
