pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use api::ApiClient;
pub use config::{storage::LocalStorage, Overrides, Settings};
pub use core::console::ViewRunner;
pub use render::OutputFormat;
pub use utils::error::{ConsoleError, Result};
