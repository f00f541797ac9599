//! Filetype tags and extension guessing

use std::fmt;
use std::path::Path;

/// Filetypes the runner knows about
///
/// Anything else is carried as `Unknown` with the tag the host reported, so a
/// "no recipe" warning can name it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileType {
    C,
    Cpp,
    Python,
    Shell,
    Lua,
    JavaScript,
    Ruby,
    Rust,
    Go,
    Unknown(String),
}

impl FileType {
    /// Parse a host filetype tag ("c", "cpp", "python", ...)
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "c" => FileType::C,
            "cpp" | "c++" | "cxx" => FileType::Cpp,
            "python" | "py" => FileType::Python,
            "sh" | "bash" | "zsh" | "shell" => FileType::Shell,
            "lua" => FileType::Lua,
            "javascript" | "js" => FileType::JavaScript,
            "ruby" | "rb" => FileType::Ruby,
            "rust" | "rs" => FileType::Rust,
            "go" => FileType::Go,
            "" => FileType::Unknown("unknown".to_string()),
            other => FileType::Unknown(other.to_string()),
        }
    }

    /// Detect filetype from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "c" => FileType::C,
            "cpp" | "cc" | "cxx" | "c++" => FileType::Cpp,
            "py" | "pyw" => FileType::Python,
            "sh" | "bash" | "zsh" => FileType::Shell,
            "lua" => FileType::Lua,
            "js" | "mjs" | "cjs" => FileType::JavaScript,
            "rb" => FileType::Ruby,
            "rs" => FileType::Rust,
            "go" => FileType::Go,
            other => FileType::Unknown(other.to_string()),
        }
    }

    /// Detect filetype from a file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_else(|| FileType::Unknown("unknown".to_string()))
    }

    /// The canonical tag, as used in configuration and messages
    pub fn tag(&self) -> &str {
        match self {
            FileType::C => "c",
            FileType::Cpp => "cpp",
            FileType::Python => "python",
            FileType::Shell => "sh",
            FileType::Lua => "lua",
            FileType::JavaScript => "javascript",
            FileType::Ruby => "ruby",
            FileType::Rust => "rust",
            FileType::Go => "go",
            FileType::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
