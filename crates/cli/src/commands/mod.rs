pub mod compare;
pub mod config;
pub mod measure;
pub mod panics;
pub mod render;
pub mod util;

pub use util::load_config;

/// Report rendering selected with `--format`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}
