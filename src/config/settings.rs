use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::runner::FileType;

/// Screen edge the output split is opened at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitEdge {
    #[default]
    Bottom,
    Top,
}

impl SplitEdge {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bottom" | "below" => Some(SplitEdge::Bottom),
            "top" | "above" => Some(SplitEdge::Top),
            _ => None,
        }
    }
}

/// How to find and drive a compiler for one filetype
#[derive(Debug, Clone, Serialize)]
pub struct CompilerSettings {
    /// Environment variable naming an override executable
    pub env_override: String,
    /// Tried in order; the first one on PATH wins
    pub candidates: Vec<String>,
    /// Used unverified when no candidate is on PATH
    pub fallback: String,
    pub flags: Vec<String>,
    /// Environment variable with extra flags, appended after `flags`
    pub flags_env: Option<String>,
}

/// Runner settings that can be customized via Rhai config
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    // Process
    pub shell: String,
    pub binary_dir: PathBuf,

    // Output split
    pub split_height: u16,
    pub split_edge: SplitEdge,

    // Root detection
    pub markers: Vec<String>,

    // Recipes
    pub make_program: String,
    pub run_target: String,
    /// filetype tag -> interpreter program
    pub interpreters: BTreeMap<String, String>,
    pub c: CompilerSettings,
    pub cpp: CompilerSettings,

    // Custom keybinds: key sequence -> action name
    pub keybinds: BTreeMap<String, String>,
}

pub const MIN_SPLIT_HEIGHT: u16 = 3;
pub const MAX_SPLIT_HEIGHT: u16 = 60;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        let shell = std::env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "sh".to_string());

        let interpreters = [
            ("python", "python3"),
            ("sh", "bash"),
            ("lua", "lua"),
            ("javascript", "node"),
            ("ruby", "ruby"),
        ]
        .into_iter()
        .map(|(ft, prog)| (ft.to_string(), prog.to_string()))
        .collect();

        Self {
            shell,
            binary_dir: std::env::temp_dir(),

            split_height: 15,
            split_edge: SplitEdge::Bottom,

            markers: strings(&[
                "Makefile",
                "CMakeLists.txt",
                "pyproject.toml",
                "package.json",
                "go.mod",
                "Cargo.toml",
            ]),

            make_program: "make".to_string(),
            run_target: "run".to_string(),
            interpreters,
            c: CompilerSettings {
                env_override: "CC".to_string(),
                candidates: strings(&["gcc-14", "gcc-13", "gcc-12", "clang", "gcc"]),
                fallback: "cc".to_string(),
                flags: strings(&["-O2", "-Wall"]),
                flags_env: None,
            },
            cpp: CompilerSettings {
                env_override: "CXX".to_string(),
                candidates: strings(&["g++-14", "g++-13", "g++-12", "clang++", "g++"]),
                fallback: "c++".to_string(),
                flags: strings(&["-std=c++17", "-O2", "-Wall"]),
                flags_env: Some("CXXFLAGS".to_string()),
            },

            keybinds: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Interpreter for a filetype, if it is run as a script
    pub fn interpreter(&self, filetype: &FileType) -> Option<&str> {
        self.interpreters.get(filetype.tag()).map(String::as_str)
    }

    /// Compiler settings for a compiled filetype
    pub fn compiler(&self, filetype: &FileType) -> Option<&CompilerSettings> {
        match filetype {
            FileType::C => Some(&self.c),
            FileType::Cpp => Some(&self.cpp),
            _ => None,
        }
    }

    pub fn compiler_mut(&mut self, filetype: &FileType) -> Option<&mut CompilerSettings> {
        match filetype {
            FileType::C => Some(&mut self.c),
            FileType::Cpp => Some(&mut self.cpp),
            _ => None,
        }
    }

    pub fn set_split_height(&mut self, rows: i64) {
        self.split_height = rows.clamp(MIN_SPLIT_HEIGHT as i64, MAX_SPLIT_HEIGHT as i64) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markers_in_order() {
        let settings = Settings::default();
        assert_eq!(
            settings.markers,
            vec![
                "Makefile",
                "CMakeLists.txt",
                "pyproject.toml",
                "package.json",
                "go.mod",
                "Cargo.toml"
            ]
        );
    }

    #[test]
    fn python_runs_with_python3() {
        let settings = Settings::default();
        assert_eq!(settings.interpreter(&FileType::Python), Some("python3"));
        assert_eq!(settings.interpreter(&FileType::Cpp), None);
        assert_eq!(settings.interpreter(&FileType::Rust), None);
    }

    #[test]
    fn versioned_compilers_come_first() {
        let settings = Settings::default();
        let cpp = settings.compiler(&FileType::Cpp).unwrap();
        assert_eq!(cpp.candidates.first().map(String::as_str), Some("g++-14"));
        assert_eq!(cpp.candidates.last().map(String::as_str), Some("g++"));
        assert_eq!(cpp.fallback, "c++");
        assert!(settings.compiler(&FileType::Python).is_none());
    }

    #[test]
    fn only_cpp_reads_extra_flags() {
        let settings = Settings::default();
        assert_eq!(settings.cpp.flags_env.as_deref(), Some("CXXFLAGS"));
        assert!(settings.c.flags_env.is_none());
    }

    #[test]
    fn split_height_is_clamped() {
        let mut settings = Settings::default();
        settings.set_split_height(1);
        assert_eq!(settings.split_height, MIN_SPLIT_HEIGHT);
        settings.set_split_height(500);
        assert_eq!(settings.split_height, MAX_SPLIT_HEIGHT);
        settings.set_split_height(20);
        assert_eq!(settings.split_height, 20);
    }

    #[test]
    fn split_edge_parses() {
        assert_eq!(SplitEdge::parse("Top"), Some(SplitEdge::Top));
        assert_eq!(SplitEdge::parse("bottom"), Some(SplitEdge::Bottom));
        assert_eq!(SplitEdge::parse("left"), None);
    }
}
