use crate::config::{BuildConfig, BuildConfigBuilder, Configuration};
use crate::output::Destination;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Typeset source code listings to PDF using XeLaTeX and minted
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Source files to print, in order
    #[clap(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output PDF file, or `-` for standard output [default: first FILE with a .pdf extension]
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only report errors
    #[clap(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show debug output, including the generated LaTeX
    #[clap(short, long)]
    pub verbose: bool,

    /// Configuration file [default: mintscript.toml if present]
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Typesetting compiler to run
    #[clap(long, env = "MINTSCRIPT_COMPILER", value_name = "PROGRAM")]
    pub compiler: Option<String>,

    /// Title printed at the top of the document
    #[clap(short, long)]
    pub title: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[clap(long)]
    pub print_config: bool,
}

impl Cli {
    /// Load the configuration file and apply command line overrides to it.
    pub fn configuration(&self) -> Result<Configuration> {
        let mut config = Configuration::load(self.config.as_deref())?;
        if let Some(compiler) = &self.compiler {
            config.compiler.program = compiler.clone();
        }
        if let Some(title) = &self.title {
            config.document.title = Some(title.clone());
        }
        Ok(config)
    }

    /// Merge the command line with `configuration` into the settings for one
    /// build.
    pub fn build_config(&self, configuration: Configuration) -> Result<BuildConfig> {
        let Configuration { compiler, document } = configuration;
        BuildConfigBuilder::default()
            .inputs(self.files.clone())
            .output(Destination::from_arg(self.output.as_deref()))
            .quiet(self.quiet)
            .verbose(self.verbose)
            .compiler(compiler)
            .document(document)
            .build()
            .with_context(|| "Failed to build configuration")
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
