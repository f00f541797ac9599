//! Configuration: runner settings and the Rhai script that sets them
//!
//! ```rhai
//! set_split_height(12);
//! set_compilers("cpp", ["clang++-18", "clang++"]);
//! bind("<leader>m", "run");
//! ```

mod engine;
pub mod settings;

pub use engine::ConfigEngine;
pub use settings::{CompilerSettings, Settings, SplitEdge};
