use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use rhai::{Array, Engine, Scope};

use super::Settings;
use super::settings::SplitEdge;
use crate::error::{Result, RunnerError};
use crate::runner::FileType;

/// The Rhai scripting engine for configuration
pub struct ConfigEngine {
    engine: Engine,
    settings: Arc<RwLock<Settings>>,
}

fn array_to_strings(list: Array) -> Vec<String> {
    list.into_iter()
        .filter_map(|d| d.into_string().ok())
        .collect()
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let settings = Arc::new(RwLock::new(settings));
        let engine = Self::create_engine(Arc::clone(&settings));

        Self { engine, settings }
    }

    fn create_engine(settings: Arc<RwLock<Settings>>) -> Engine {
        let mut engine = Engine::new();

        // Limit script execution for safety
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(100_000);

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_shell", move |name: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.shell = name.to_string();
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_split_height", move |rows: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.set_split_height(rows);
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_split_edge", move |edge: &str| {
                if let (Some(edge), Ok(mut settings)) = (SplitEdge::parse(edge), s.write()) {
                    settings.split_edge = edge;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_markers", move |list: Array| {
                if let Ok(mut settings) = s.write() {
                    settings.markers = array_to_strings(list);
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("add_marker", move |name: &str| {
                if let Ok(mut settings) = s.write() {
                    if !settings.markers.iter().any(|m| m == name) {
                        settings.markers.push(name.to_string());
                    }
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_make", move |program: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.make_program = program.to_string();
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_run_target", move |target: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.run_target = target.to_string();
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_interpreter", move |filetype: &str, program: &str| {
                if let Ok(mut settings) = s.write() {
                    let tag = FileType::from_tag(filetype).tag().to_string();
                    settings.interpreters.insert(tag, program.to_string());
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_compilers", move |filetype: &str, list: Array| {
                if let Ok(mut settings) = s.write() {
                    if let Some(compiler) = settings.compiler_mut(&FileType::from_tag(filetype)) {
                        compiler.candidates = array_to_strings(list);
                    }
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_compiler_fallback", move |filetype: &str, name: &str| {
                if let Ok(mut settings) = s.write() {
                    if let Some(compiler) = settings.compiler_mut(&FileType::from_tag(filetype)) {
                        compiler.fallback = name.to_string();
                    }
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_flags", move |filetype: &str, list: Array| {
                if let Ok(mut settings) = s.write() {
                    if let Some(compiler) = settings.compiler_mut(&FileType::from_tag(filetype)) {
                        compiler.flags = array_to_strings(list);
                    }
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_binary_dir", move |path: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.binary_dir = PathBuf::from(path);
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("bind", move |key: &str, action: &str| {
                if let Ok(mut settings) = s.write() {
                    settings
                        .keybinds
                        .insert(key.to_string(), action.to_string());
                }
            });
        }

        engine.on_print(|msg| {
            tracing::info!(target: "config", "{}", msg);
        });

        engine
    }

    /// Load and execute a config file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        self.eval(&content)
    }

    /// Evaluate a Rhai script string
    pub fn eval(&mut self, script: &str) -> Result<()> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|e| RunnerError::Config(format!("parse error: {}", e)))?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| RunnerError::Config(e.to_string()))?;

        Ok(())
    }

    /// Get the current settings (cloned)
    pub fn settings(&self) -> Settings {
        self.settings.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("quickrun"))
    }

    /// Get the default config file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("init.rhai"))
    }

    /// Load the default config file if it exists
    pub fn load_default(&mut self) -> Result<()> {
        if let Some(config_file) = Self::config_file() {
            if config_file.exists() {
                tracing::debug!("loading config from {}", config_file.display());
                return self.load_file(&config_file);
            }
        }
        Ok(()) // No config file is fine
    }
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}
