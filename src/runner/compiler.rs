//! Compiler selection for compiled filetypes

use crate::config::CompilerSettings;

use super::system::System;

/// Pick a compiler executable name. Always returns something:
///
/// 1. the environment override, if it names an executable on PATH
/// 2. the first candidate on PATH
/// 3. the fallback, unverified
pub fn resolve_compiler<S: System + ?Sized>(system: &S, settings: &CompilerSettings) -> String {
    if let Some(name) = system.var(&settings.env_override) {
        if system.find_executable(&name).is_some() {
            tracing::debug!("compiler from ${}: {}", settings.env_override, name);
            return name;
        }
        tracing::debug!(
            "${}={} is not on PATH, ignoring",
            settings.env_override,
            name
        );
    }

    if let Some(found) = settings
        .candidates
        .iter()
        .find(|c| system.find_executable(c).is_some())
    {
        tracing::debug!("compiler from candidates: {}", found);
        return found.clone();
    }

    tracing::debug!("no compiler candidate on PATH, using {}", settings.fallback);
    settings.fallback.clone()
}

/// Extra flags from the settings' flags environment variable, split into words
pub fn env_flags<S: System + ?Sized>(system: &S, settings: &CompilerSettings) -> Vec<String> {
    settings
        .flags_env
        .as_deref()
        .and_then(|key| system.var(key))
        .map(|raw| super::shell::split_args(&raw))
        .unwrap_or_default()
}
