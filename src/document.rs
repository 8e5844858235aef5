//! Generating and writing the LaTeX document that pulls in the staged sources.
//!
//! Highlighting is done by `minted` at compile time (it shells out to
//! Pygments), so the document only has to name each staged file and the lexer
//! to use for it.

use crate::config::DocumentConfig;
use crate::error::BuildError;
use crate::staging::StagedFile;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Fixed name of the generated document inside the build directory.
pub const DOCUMENT_NAME: &str = "mintscript.tex";

/// Turns staged files into a complete document.
///
/// Implementations must be deterministic and free of side effects; the
/// pipeline may call them at any point before compiling.
pub trait Assemble {
    fn assemble(&self, options: &DocumentConfig, files: &[StagedFile]) -> Result<String>;
}

/// The stock `minted` listing document.
#[derive(Debug, Default, Clone, Copy)]
pub struct MintedDocument;

impl Assemble for MintedDocument {
    fn assemble(&self, options: &DocumentConfig, files: &[StagedFile]) -> Result<String> {
        let mut doc = String::new();
        let mut minted_options = vec![
            "breaklines".to_string(),
            format!("tabsize={}", options.tab_size),
        ];
        if options.line_numbers {
            minted_options.push("linenos".to_string());
        }
        let minted_options = minted_options.join(",");

        writeln!(doc, "\\documentclass[10pt]{{article}}")?;
        writeln!(doc, "\\usepackage[margin=2cm]{{geometry}}")?;
        writeln!(doc, "\\usepackage{{fontspec}}")?;
        writeln!(doc, "\\usepackage{{minted}}")?;
        writeln!(doc, "\\usepackage{{hyperref}}")?;
        writeln!(doc, "\\setminted{{{minted_options}}}")?;
        if let Some(title) = &options.title {
            writeln!(doc, "\\title{{{}}}", escape(title))?;
            writeln!(doc, "\\date{{}}")?;
        }
        writeln!(doc, "\\begin{{document}}")?;
        if options.title.is_some() {
            writeln!(doc, "\\maketitle")?;
        }
        // the table of contents is why the compiler runs twice
        if files.len() > 1 {
            writeln!(doc, "\\tableofcontents")?;
            writeln!(doc, "\\clearpage")?;
        }

        for file in files {
            writeln!(doc)?;
            writeln!(
                doc,
                "\\section*{{{}}}",
                escape(&file.original.display().to_string())
            )?;
            writeln!(
                doc,
                "\\addcontentsline{{toc}}{{section}}{{{}}}",
                escape(&file.original.display().to_string())
            )?;
            writeln!(doc, "\\inputminted{{{}}}{{{}}}", lexer_for(file), file.name)?;
        }

        writeln!(doc, "\\end{{document}}")?;
        Ok(doc)
    }
}

/// Pygments lexer alias for a staged file: its lowercased extension, or
/// plain text when it has none.
pub fn lexer_for(file: &StagedFile) -> String {
    file.extension()
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "text".to_string())
}

/// Escape text for use in LaTeX running text.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Write the document into `dir` under [`DOCUMENT_NAME`].
///
/// Refuses to write if that name is taken by a staged file.
pub fn write_document(dir: &Path, source: &str, staged: &[StagedFile]) -> Result<PathBuf> {
    if staged.iter().any(|f| f.name == DOCUMENT_NAME) {
        return Err(BuildError::NameCollision(DOCUMENT_NAME.to_string()).into());
    }

    let path = dir.join(DOCUMENT_NAME);
    std::fs::write(&path, source)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("LaTeX code:\n{source}");
    Ok(path)
}
