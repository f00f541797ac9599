//! Turning a file + project root into a shell command

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Settings;

use super::compiler::{env_flags, resolve_compiler};
use super::filetype::FileType;
use super::shell::{quote, quoted_args};
use super::system::System;

/// A complete, runnable command and where to run it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    pub shell_command: String,
    pub working_directory: PathBuf,
}

/// Outcome of synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipe {
    Plan(RunPlan),
    /// Nothing knows how to run this filetype here
    NoRecipe(FileType),
}

/// Where the binary for a compiled file goes. Depends only on the file's
/// base name, so repeated runs overwrite the same file.
pub fn binary_path(binary_dir: &Path, file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a.out".to_string());
    binary_dir.join(format!("quickrun-{}", stem))
}

/// Build the command for `file`, first match wins:
/// Makefile at root, interpreter, compiler, otherwise no recipe.
pub fn synthesize<S: System + ?Sized>(
    settings: &Settings,
    system: &S,
    filetype: &FileType,
    root: &Path,
    file: &Path,
    extra_args: &str,
) -> Recipe {
    let args = quoted_args(extra_args);
    let plan = |shell_command: String| {
        Recipe::Plan(RunPlan {
            shell_command,
            working_directory: root.to_path_buf(),
        })
    };

    if system.is_file(&root.join("Makefile")) {
        let make = &settings.make_program;
        return plan(format!(
            "{make} {target}{args} || {make}{args}",
            target = settings.run_target,
        ));
    }

    if let Some(interpreter) = settings.interpreter(filetype) {
        return plan(format!(
            "{} {}{}",
            interpreter,
            quote(&file.to_string_lossy()),
            args
        ));
    }

    if let Some(compiler) = settings.compiler(filetype) {
        let cc = resolve_compiler(system, compiler);
        let binary = quote(&binary_path(&settings.binary_dir, file).to_string_lossy());

        let mut flags: String = compiler.flags.iter().map(|f| format!(" {}", f)).collect();
        for extra in env_flags(system, compiler) {
            flags.push(' ');
            flags.push_str(&quote(&extra));
        }

        return plan(format!(
            "{}{} {} -o {} && {}{}",
            quote(&cc),
            flags,
            quote(&file.to_string_lossy()),
            binary,
            binary,
            args
        ));
    }

    Recipe::NoRecipe(filetype.clone())
}
