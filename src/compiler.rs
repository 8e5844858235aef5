//! Running the typesetting compiler over the generated document.
//!
//! The compiler is run a fixed number of times: the first pass writes the
//! auxiliary files (table of contents, labels) that the second pass needs to
//! resolve forward references. Each pass must exit cleanly, and the final
//! PDF must actually exist afterwards; a zero exit status alone isn't trusted.

use crate::config::CompilerConfig;
use crate::error::BuildError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Number of compiler runs per build.
pub const PASSES: usize = 2;

/// Fixed flags: allow `minted` to run Pygments, stop on the first error
/// instead of prompting, and never wait for terminal input.
pub const FIXED_ARGS: &[&str] = &["-shell-escape", "-halt-on-error", "-interaction=batchmode"];

/// How a single compiler pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Success,
    /// Non-zero exit; `None` when the process was killed by a signal
    Failed(Option<i32>),
}

impl From<ExitStatus> for PassStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            PassStatus::Success
        } else {
            PassStatus::Failed(status.code())
        }
    }
}

/// Something that can typeset a document in the current directory.
pub trait Compile {
    /// Display name for messages
    fn name(&self) -> &str;

    /// Run one pass over `source`, a file name in the current directory.
    fn run_pass(&self, source: &str, pass: usize) -> Result<PassStatus>;
}

/// The external compiler process.
#[derive(Debug, Clone)]
pub struct Compiler {
    program: PathBuf,
    name: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    quiet: bool,
}

impl Compiler {
    /// Locate the configured program on `PATH` (or at the configured path).
    pub fn locate(config: &CompilerConfig, quiet: bool) -> Result<Compiler, BuildError> {
        let program = which::which(&config.program)
            .map_err(|_| BuildError::CompilerNotFound(config.program.clone()))?;
        log::debug!("Using compiler {}", program.display());

        Ok(Compiler {
            program,
            name: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            quiet,
        })
    }

    fn command(&self, source: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(FIXED_ARGS)
            .arg(source)
            .stdin(Stdio::null());

        // stdout may be carrying the PDF, so the compiler never gets it
        if self.quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        } else {
            cmd.stdout(std::io::stderr());
        }
        cmd
    }

    fn wait(&self, child: &mut Child, pass: usize) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child
                .wait()
                .with_context(|| format!("Failed to wait for {}", self.name));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("Failed to wait for {}", self.name))?
            {
                return Ok(status);
            }
            if started.elapsed() >= timeout {
                if let Err(e) = child.kill() {
                    log::warn!("Failed to kill {}: {e}", self.name);
                }
                if let Err(e) = child.wait() {
                    log::warn!("Failed to reap {}: {e}", self.name);
                }
                return Err(BuildError::CompilerTimedOut {
                    program: self.name.clone(),
                    pass,
                    secs: timeout.as_secs(),
                }
                .into());
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Compile for Compiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_pass(&self, source: &str, pass: usize) -> Result<PassStatus> {
        let mut child = self.command(source).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::Error::from(BuildError::CompilerNotFound(self.name.clone()))
            } else {
                anyhow::Error::from(e).context(format!("Failed to start {}", self.name))
            }
        })?;
        let status = self.wait(&mut child, pass)?;
        Ok(status.into())
    }
}

/// Run every pass over `source` and return the path of the produced PDF.
///
/// `on_pass` is called before each pass with its 1-based number. Stops at the
/// first failing pass.
pub fn compile<C, F>(compiler: &C, source: &str, mut on_pass: F) -> Result<PathBuf>
where
    C: Compile + ?Sized,
    F: FnMut(usize),
{
    for pass in 1..=PASSES {
        on_pass(pass);
        log::debug!("Running {} pass {pass}/{PASSES}", compiler.name());
        match compiler.run_pass(source, pass)? {
            PassStatus::Success => {}
            PassStatus::Failed(code) => {
                return Err(BuildError::CompilerFailed {
                    program: compiler.name().to_string(),
                    pass,
                    code,
                }
                .into());
            }
        }
    }

    let artifact = artifact_name(source);
    if !artifact.is_file() {
        return Err(BuildError::MissingArtifact {
            program: compiler.name().to_string(),
            artifact,
        }
        .into());
    }
    Ok(artifact)
}

/// The compiler's output for `source`: same stem, `.pdf` extension.
pub fn artifact_name(source: &str) -> PathBuf {
    Path::new(source).with_extension("pdf")
}
