//! Probes of the surrounding system: environment, filesystem, PATH and VCS

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// What the runner needs to know about the machine it runs on
pub trait System {
    fn var(&self, key: &str) -> Option<String>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Full path of `name` if it is an executable on PATH
    fn find_executable(&self, name: &str) -> Option<PathBuf>;
    /// Top-level directory of the VCS work tree containing `dir`
    fn vcs_toplevel(&self, dir: &Path) -> Option<PathBuf>;
}

/// The real operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSystem;

impl System for OsSystem {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        // Names with a separator are paths, not PATH lookups
        if name.contains('/') {
            let path = PathBuf::from(name);
            return path.is_file().then_some(path);
        }

        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn vcs_toplevel(&self, dir: &Path) -> Option<PathBuf> {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["rev-parse", "--show-toplevel"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first = stdout.lines().next()?.trim();
        if first.is_empty() {
            None
        } else {
            Some(PathBuf::from(first))
        }
    }
}

#[cfg(test)]
pub use fake::FakeSystem;
