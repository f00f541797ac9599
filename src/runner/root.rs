//! Project root detection

use std::path::{Path, PathBuf};

use super::system::System;

/// Finds the project root for a file: VCS top-level first, then the closest
/// directory holding a marker file, then the file's own directory.
pub struct RootResolver<'a, S: System + ?Sized> {
    system: &'a S,
    markers: &'a [String],
}

/// Directory containing `file`; `.` for a bare file name
pub fn containing_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl<'a, S: System + ?Sized> RootResolver<'a, S> {
    pub fn new(system: &'a S, markers: &'a [String]) -> Self {
        Self { system, markers }
    }

    /// Resolve the root for `file`. Never fails.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        let dir = containing_dir(file);

        if let Some(top) = self.system.vcs_toplevel(&dir) {
            if self.system.is_dir(&top) {
                tracing::debug!("root for {} from VCS: {}", file.display(), top.display());
                return top;
            }
        }

        if let Some(found) = self.find_marker_dir(&dir) {
            tracing::debug!("root for {} from marker: {}", file.display(), found.display());
            return found;
        }

        tracing::debug!("no root found for {}, using its directory", file.display());
        dir
    }

    /// Closest ancestor of `start` (inclusive) containing any marker
    fn find_marker_dir(&self, start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| {
                self.markers
                    .iter()
                    .any(|marker| self.system.is_file(&dir.join(marker)))
            })
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::runner::system::FakeSystem;
    use std::fs;
    use tempfile::TempDir;

    fn markers() -> Vec<String> {
        Settings::default().markers
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn vcs_root_wins_over_markers() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let file = root.join("a/b/c/main.cpp");
        touch(&file);
        touch(&root.join("a/b/CMakeLists.txt"));

        let sys = FakeSystem::new().with_vcs_root(&root);
        let markers = markers();
        assert_eq!(RootResolver::new(&sys, &markers).resolve(&file), root);
    }

    #[test]
    fn vcs_root_three_levels_up_without_markers() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("repo");
        let file = root.join("x/y/z/tool.py");
        touch(&file);

        let sys = FakeSystem::new().with_vcs_root(&root);
        let markers = markers();
        let resolved = RootResolver::new(&sys, &markers).resolve(&file);
        assert_eq!(resolved, root);
        assert_ne!(resolved, file.parent().unwrap());
    }

    #[test]
    fn vcs_answer_that_is_not_a_directory_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("src/main.c");
        touch(&file);
        touch(&tmp.path().join("Makefile"));

        // VCS reports a top-level that does not exist on disk
        let sys = FakeSystem::new().with_vcs_root(tmp.path().join("src"));
        fs::remove_file(&file).unwrap();
        fs::remove_dir(tmp.path().join("src")).unwrap();
        let file = tmp.path().join("src/main.c");

        let markers = markers();
        assert_eq!(RootResolver::new(&sys, &markers).resolve(&file), tmp.path());
    }

    #[test]
    fn closest_marker_directory_wins() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("outer/inner/src/lib.py");
        touch(&file);
        touch(&tmp.path().join("outer/Makefile"));
        touch(&tmp.path().join("outer/inner/pyproject.toml"));

        let sys = FakeSystem::new();
        let markers = markers();
        assert_eq!(
            RootResolver::new(&sys, &markers).resolve(&file),
            tmp.path().join("outer/inner")
        );
    }

    #[test]
    fn marker_in_files_own_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("proj/main.go");
        touch(&file);
        touch(&tmp.path().join("proj/go.mod"));

        let sys = FakeSystem::new();
        let markers = markers();
        assert_eq!(
            RootResolver::new(&sys, &markers).resolve(&file),
            tmp.path().join("proj")
        );
    }

    #[test]
    fn marker_directory_is_not_a_marker() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("p/q/main.c");
        touch(&file);
        fs::create_dir_all(tmp.path().join("p/Makefile")).unwrap();

        let sys = FakeSystem::new();
        let markers = vec!["Makefile".to_string()];
        assert_eq!(
            RootResolver::new(&sys, &markers).resolve(&file),
            tmp.path().join("p/q")
        );
    }

    #[test]
    fn falls_back_to_containing_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("scratch/hello.py");
        touch(&file);

        let sys = FakeSystem::new();
        // No markers configured, so nothing above tmp can match either
        let markers: Vec<String> = Vec::new();
        assert_eq!(
            RootResolver::new(&sys, &markers).resolve(&file),
            tmp.path().join("scratch")
        );
    }

    #[test]
    fn containing_dir_of_bare_name() {
        assert_eq!(containing_dir(Path::new("main.c")), PathBuf::from("."));
        assert_eq!(containing_dir(Path::new("/a/main.c")), PathBuf::from("/a"));
    }
}
