use crate::error::BuildError;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where the user asked for the PDF to go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Destination {
    /// Next to the first input, with its extension replaced by `.pdf`
    #[default]
    Derived,
    /// Raw bytes on standard output
    Stdout,
    /// An explicit path, relative to the directory we were started in
    Path(PathBuf),
}

impl Destination {
    /// Interpret the value of `--output`: absent, `-`, or a path.
    pub fn from_arg(arg: Option<&Path>) -> Destination {
        match arg {
            None => Destination::Derived,
            Some(path) if path.as_os_str().is_empty() => Destination::Derived,
            Some(path) if path.as_os_str() == "-" => Destination::Stdout,
            Some(path) => Destination::Path(path.to_path_buf()),
        }
    }

    /// Turn the destination into a concrete target.
    ///
    /// `origin` is the directory the user ran us from; relative paths are
    /// resolved against it rather than the build directory.
    pub fn resolve(&self, origin: &Path, first_input: &Path) -> Target {
        match self {
            Destination::Stdout => Target::Stdout,
            Destination::Path(path) => Target::File(origin.join(path)),
            Destination::Derived => Target::File(origin.join(derived_path(first_input))),
        }
    }
}

/// `foo/bar.py` becomes `foo/bar.pdf`.
pub fn derived_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// A resolved output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
}

impl Target {
    /// Fail early if the file can't possibly be written, before spending time
    /// in the compiler.
    pub fn check(&self) -> Result<(), BuildError> {
        match self {
            Target::Stdout => Ok(()),
            Target::File(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                    Err(BuildError::MissingOutputDir(parent.to_path_buf()))
                }
                _ => Ok(()),
            },
        }
    }

    /// Copy the artifact to the target. `stdout` receives the bytes verbatim
    /// when the target is standard output.
    pub fn deliver<W: Write>(&self, artifact: &Path, mut stdout: W) -> Result<()> {
        match self {
            Target::Stdout => {
                let bytes = std::fs::read(artifact)
                    .with_context(|| format!("Failed to read {}", artifact.display()))?;
                stdout
                    .write_all(&bytes)
                    .and_then(|_| stdout.flush())
                    .with_context(|| "Failed to write PDF to standard output")?;
                log::debug!("Wrote {} bytes to standard output", bytes.len());
            }
            Target::File(path) => {
                std::fs::copy(artifact, path)
                    .with_context(|| format!("Failed to write output file {}", path.display()))?;
                log::info!("Output written to {}", path.display());
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Stdout => write!(f, "standard output"),
            Target::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_output_argument() {
        assert_eq!(Destination::from_arg(None), Destination::Derived);
        assert_eq!(
            Destination::from_arg(Some(Path::new("-"))),
            Destination::Stdout
        );
        assert_eq!(
            Destination::from_arg(Some(Path::new("out/listing.pdf"))),
            Destination::Path(PathBuf::from("out/listing.pdf"))
        );
    }

    #[test]
    fn can_derive_default_output() {
        assert_eq!(derived_path(Path::new("foo/bar.py")), PathBuf::from("foo/bar.pdf"));
        assert_eq!(derived_path(Path::new("Makefile")), PathBuf::from("Makefile.pdf"));
        assert_eq!(
            derived_path(Path::new("a/b.tar.gz")),
            PathBuf::from("a/b.tar.pdf")
        );
    }

    #[test]
    fn destinations_resolve_against_origin() {
        let origin = Path::new("/home/user/project");
        let first = Path::new("foo/bar.py");

        assert_eq!(
            Destination::Derived.resolve(origin, first),
            Target::File(PathBuf::from("/home/user/project/foo/bar.pdf"))
        );
        assert_eq!(
            Destination::Path(PathBuf::from("out.pdf")).resolve(origin, first),
            Target::File(PathBuf::from("/home/user/project/out.pdf"))
        );
        assert_eq!(
            Destination::Path(PathBuf::from("/tmp/abs.pdf")).resolve(origin, first),
            Target::File(PathBuf::from("/tmp/abs.pdf"))
        );
        assert_eq!(Destination::Stdout.resolve(origin, first), Target::Stdout);
    }

    #[test]
    fn check_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Target::File(dir.path().join("ok.pdf")).check().is_ok());
        assert!(Target::Stdout.check().is_ok());

        let err = Target::File(dir.path().join("nope/out.pdf"))
            .check()
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingOutputDir(p) if p == dir.path().join("nope")));
    }

    #[test]
    fn stdout_receives_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("mintscript.pdf");
        let bytes: Vec<u8> = b"%PDF-1.5\n\x00\x01\xfe\xff\r\n%%EOF\n".to_vec();
        std::fs::write(&artifact, &bytes).unwrap();

        let mut out = Vec::new();
        Target::Stdout.deliver(&artifact, &mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn file_target_copies_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("mintscript.pdf");
        std::fs::write(&artifact, b"%PDF").unwrap();
        let dest = dir.path().join("listing.pdf");

        let mut out = Vec::new();
        Target::File(dest.clone()).deliver(&artifact, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(std::fs::read(dest).unwrap(), b"%PDF");
    }
}
