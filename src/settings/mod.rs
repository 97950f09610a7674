//! Layered settings: a TOML file, then `AMITY__`-prefixed environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
