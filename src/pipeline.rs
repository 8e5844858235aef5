use crate::compiler::{self, Compile, PASSES};
use crate::config::BuildConfig;
use crate::document::{write_document, Assemble, DOCUMENT_NAME};
use crate::output::Target;
use crate::sandbox;
use crate::staging::{check_inputs, stage_all};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// One build: stage the inputs, write the document, compile it and deliver
/// the PDF, all inside a sandbox that is removed afterwards.
pub struct Pipeline<'a, A: ?Sized, C: ?Sized> {
    assembler: &'a A,
    compiler: &'a C,
}

impl<'a, A, C> Pipeline<'a, A, C>
where
    A: Assemble + ?Sized,
    C: Compile + ?Sized,
{
    pub fn new(assembler: &'a A, compiler: &'a C) -> Self {
        Pipeline {
            assembler,
            compiler,
        }
    }

    /// Run the build. `stdout` receives the PDF when the destination is `-`.
    ///
    /// Returns where the PDF went.
    pub fn run<W: Write>(&self, config: &BuildConfig, stdout: W) -> Result<Target> {
        let first = config.first_input()?;

        let origin = std::env::current_dir()
            .with_context(|| "Failed to determine the current directory")?;
        check_inputs(&origin, &config.inputs)?;
        let target = config.output.resolve(&origin, first);
        target.check()?;
        log::debug!("Output to {target}");

        let progress = if config.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(PASSES as u64)
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .with_context(|| "Failed to parse progress style")?
                .progress_chars("#>-"),
        );

        let result = sandbox::scoped(|sandbox| {
            let staged = stage_all(sandbox.previous_dir(), &config.inputs, sandbox.path())?;

            let source = self
                .assembler
                .assemble(&config.document, &staged)
                .with_context(|| "Failed to assemble the document")?;
            write_document(sandbox.path(), &source, &staged)?;

            let artifact = compiler::compile(self.compiler, DOCUMENT_NAME, |pass| {
                progress.set_position((pass - 1) as u64);
                progress.set_message(format!("Running {} pass {pass}...", self.compiler.name()));
            })?;
            progress.set_position(PASSES as u64);

            target.deliver(&sandbox.path().join(artifact), stdout)
        });
        progress.finish_and_clear();

        result.map(|_| target)
    }
}
