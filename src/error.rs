use std::io;

use thiserror::Error;

/// Failures raised by the plumbing underneath the engine.
///
/// None of these ever reach a caller of [`crate::Shell::execute`] as an
/// `Err`: the engine renders them into the output text.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Command not found: {program}")]
    NotFound { program: String },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    Config { key: String, value: String },

    #[error("could not listen on {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

impl ShellError {
    /// Classifies a spawn failure, keeping "no such program" apart from the rest.
    pub fn spawn(program: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ShellError::NotFound {
                program: program.to_string(),
            }
        } else {
            ShellError::Spawn {
                program: program.to_string(),
                source,
            }
        }
    }
}
