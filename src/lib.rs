pub mod cli;
pub mod config;
pub mod download;
pub mod events;
pub mod filter;
pub mod logging;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use pipeline::{Pipeline, Step};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui, UiApp};
