pub mod cli;
pub mod load_config;
pub mod origin;

pub use cli::{run, Cli, Commands};
