//! Command-line arguments

use std::env;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::runner::shell::quote;
use crate::runner::{FileType, RunRequest};

/// Run the file you are editing: finds the project root, builds a command for
/// the file and streams its output.
#[derive(Parser, Debug)]
#[command(name = "quickrun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config script to load instead of the default init.rhai
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run a file and stream its output
    Run {
        #[command(flatten)]
        target: Target,

        /// Ask for arguments on stdin before running
        #[arg(long)]
        prompt: bool,

        /// Arguments passed to the program
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the command that would run, without running it
    Plan {
        #[command(flatten)]
        target: Target,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the project root of a file
    Root {
        file: PathBuf,
    },

    /// Interactive session for a file
    ///
    /// Keys: <space>r run, <space>R run with arguments, <space>c close the
    /// output, : command line, q quit.
    Session {
        #[command(flatten)]
        target: Target,
    },

    /// Print the effective settings as JSON
    Config,
}

/// The file to run and how to treat it
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub file: PathBuf,

    /// Filetype tag (c, cpp, python, sh, ...); guessed from the extension
    /// when omitted
    #[arg(long, value_name = "FT")]
    pub filetype: Option<String>,

    /// Use this directory as the project root instead of detecting it
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl Target {
    pub fn filetype(&self) -> FileType {
        match &self.filetype {
            Some(tag) => FileType::from_tag(tag),
            None => FileType::from_path(&self.file),
        }
    }

    /// Request with the file and root made absolute against the current
    /// directory
    pub fn request(&self, extra_args: String) -> RunRequest {
        match env::current_dir() {
            Ok(cwd) => self.request_in(&cwd, extra_args),
            Err(e) => {
                tracing::warn!("cannot read the current directory: {}", e);
                self.request_in(Path::new(""), extra_args)
            }
        }
    }

    fn request_in(&self, cwd: &Path, extra_args: String) -> RunRequest {
        RunRequest::new(cwd.join(&self.file), self.filetype())
            .with_args(extra_args)
            .with_root(self.root.as_ref().map(|root| cwd.join(root)))
    }
}

/// `path` resolved against the current directory
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|e| {
        tracing::warn!("cannot make {} absolute: {}", path.display(), e);
        path.to_path_buf()
    })
}

/// Turn already-split arguments back into one raw string that splits the
/// same way again
pub fn join_args(args: &[String]) -> String {
    args.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" ")
}
