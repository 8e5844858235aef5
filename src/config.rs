use crate::error::BuildError;
use crate::output::Destination;
use anyhow::{Context, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file picked up from the current directory.
pub const CONFIG_FILE: &str = "mintscript.toml";

/// Settings that can be stored in `mintscript.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub document: DocumentConfig,
}

/// How to invoke the typesetting compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Program name (looked up on `PATH`) or path to the compiler
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra arguments, passed before the fixed flags
    #[serde(default)]
    pub args: Vec<String>,
    /// Kill a pass that runs longer than this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Options handed to the document assembler untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Title page text; without one the document starts at the contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_line_numbers")]
    pub line_numbers: bool,
    #[serde(default = "default_tab_size")]
    pub tab_size: u32,
}

fn default_program() -> String {
    "xelatex".to_string()
}
fn default_line_numbers() -> bool {
    true
}
fn default_tab_size() -> u32 {
    4
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            program: default_program(),
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            title: None,
            line_numbers: default_line_numbers(),
            tab_size: default_tab_size(),
        }
    }
}

impl Configuration {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, `mintscript.toml` in the
    /// current directory is used if present, and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Configuration> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Configuration::default());
                }
                path
            }
        };

        log::debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML in {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to convert configuration to TOML")
    }
}

/// Everything one build needs, after command line and config file are merged.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(setter(into))]
pub struct BuildConfig {
    #[builder(setter(each(name = "input", into)), default)]
    pub inputs: Vec<PathBuf>,
    #[builder(default)]
    pub output: Destination,
    #[builder(default)]
    pub quiet: bool,
    #[builder(default)]
    pub verbose: bool,
    #[builder(default)]
    pub compiler: CompilerConfig,
    #[builder(default)]
    pub document: DocumentConfig,
}

impl BuildConfig {
    /// The first input, once the input list is known to be usable: not empty,
    /// and not asking for standard input.
    pub fn first_input(&self) -> Result<&Path, BuildError> {
        if self.inputs.iter().any(|p| p.as_os_str() == "-") {
            return Err(BuildError::StdinUnsupported);
        }
        self.inputs
            .first()
            .map(PathBuf::as_path)
            .ok_or(BuildError::NoInputs)
    }
}
