use std::path::PathBuf;
use thiserror::Error;

/// Failures of a build that map onto a specific process exit code.
///
/// Everything else (I/O while delivering, bad config files, ...) travels as a
/// plain [`anyhow::Error`] and exits with `1`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No input files given")]
    NoInputs,

    #[error("Reading from stdin is not supported, pass one or more file paths")]
    StdinUnsupported,

    #[error("Cannot read file {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Failed to copy {} into the build directory", .path.display())]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document name {0} collides with a staged source file")]
    NameCollision(String),

    #[error("Compiler `{0}` was not found")]
    CompilerNotFound(String),

    #[error("{program} failed on pass {pass} with {}", describe_status(.code))]
    CompilerFailed {
        program: String,
        pass: usize,
        code: Option<i32>,
    },

    #[error("{program} did not finish pass {pass} within {secs}s and was killed")]
    CompilerTimedOut {
        program: String,
        pass: usize,
        secs: u64,
    },

    #[error("{program} completed but {} was not found in its output", .artifact.display())]
    MissingArtifact { program: String, artifact: PathBuf },

    #[error("Output directory {} does not exist", .0.display())]
    MissingOutputDir(PathBuf),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("return code {code}"),
        None => "no return code (terminated by a signal)".to_string(),
    }
}

impl BuildError {
    /// The process exit code this failure should produce.
    ///
    /// A failing compiler pass propagates the compiler's own status; every
    /// other failure is `1`.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildError::CompilerFailed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

/// Finds the [`BuildError`] in an error chain and returns its exit code.
pub fn exit_code_of(e: &anyhow::Error) -> u8 {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .map(BuildError::exit_code)
        .unwrap_or(1)
}
