//! A minimal command shell: built-ins, external programs, and pipelines
//! handed to the system shell, with output captured as bounded text.

pub mod capture;
pub mod command;
pub mod command_call;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod logging;
pub mod output;

pub use command_call::{CommandCall, Route};
pub use config::{ServerConfig, ShellConfig};
pub use engine::{CommandOutput, ExecStatus, Shell};
pub use error::ShellError;
pub use output::OutputBuffer;
