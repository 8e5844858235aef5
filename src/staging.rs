use crate::error::BuildError;
use std::path::{Path, PathBuf};

/// An input file copied into the build directory under a normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// The path the user gave us, as given
    pub original: PathBuf,
    /// `source<index><ext>`, relative to the build directory
    pub name: String,
}

impl StagedFile {
    /// The original extension without its leading dot, if there was one.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }
}

/// Name of the staged copy of the `index`th input.
///
/// The original extension is kept so the document can pick a lexer from it;
/// everything else about the name is discarded, which keeps awkward paths
/// (spaces, unicode, TeX-special characters) out of the generated document.
pub fn staged_name(index: usize, path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("source{index}{ext}")
}

/// Fail with the first input, resolved against `origin`, that is not a
/// regular file.
pub fn check_inputs(origin: &Path, inputs: &[PathBuf]) -> Result<(), BuildError> {
    match inputs.iter().map(|i| origin.join(i)).find(|p| !p.is_file()) {
        Some(missing) => Err(BuildError::MissingInput(missing)),
        None => Ok(()),
    }
}

/// Copy every input into `dest`, in order.
///
/// Inputs are resolved against `origin`, the directory the user ran us from.
/// The first missing or unreadable input aborts the whole operation.
pub fn stage_all(
    origin: &Path,
    inputs: &[PathBuf],
    dest: &Path,
) -> Result<Vec<StagedFile>, BuildError> {
    let mut staged = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let source = origin.join(input);
        if !source.is_file() {
            return Err(BuildError::MissingInput(source));
        }

        let name = staged_name(i, input);
        std::fs::copy(&source, dest.join(&name)).map_err(|e| BuildError::UnreadableInput {
            path: source.clone(),
            source: e,
        })?;
        log::debug!("Copied {} to {}", source.display(), name);

        staged.push(StagedFile {
            original: input.clone(),
            name,
        });
    }

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_name_staged_files() {
        assert_eq!(staged_name(0, Path::new("src/main.rs")), "source0.rs");
        assert_eq!(staged_name(3, Path::new("foo/bar.tar.gz")), "source3.gz");
        assert_eq!(staged_name(1, Path::new("Makefile")), "source1");
        assert_eq!(staged_name(2, Path::new(".bashrc")), "source2");
        assert_eq!(staged_name(10, Path::new("my file.PY")), "source10.PY");
    }

    #[test]
    fn can_stage_files_in_order() {
        let origin = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::create_dir(origin.path().join("lib")).unwrap();
        std::fs::write(origin.path().join("main.py"), "print('hi')\n").unwrap();
        std::fs::write(origin.path().join("lib/util.c"), b"int x;\x00\xff").unwrap();
        std::fs::write(origin.path().join("README"), "readme").unwrap();

        let inputs = vec![
            PathBuf::from("main.py"),
            PathBuf::from("lib/util.c"),
            PathBuf::from("README"),
        ];
        let staged = stage_all(origin.path(), &inputs, dest.path()).unwrap();

        let names: Vec<&str> = staged.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["source0.py", "source1.c", "source2"]);
        assert_eq!(staged[1].original, PathBuf::from("lib/util.c"));
        assert_eq!(staged[1].extension(), Some("c"));
        assert_eq!(staged[2].extension(), None);

        for (input, staged) in inputs.iter().zip(&staged) {
            assert_eq!(
                std::fs::read(origin.path().join(input)).unwrap(),
                std::fs::read(dest.path().join(&staged.name)).unwrap()
            );
        }
        assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 3);
    }

    #[test]
    fn absolute_inputs_ignore_origin() {
        let origin = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let input = elsewhere.path().join("lib.rs");
        std::fs::write(&input, "fn main() {}").unwrap();

        let staged = stage_all(origin.path(), &[input], dest.path()).unwrap();
        assert_eq!(staged[0].name, "source0.rs");
        assert!(dest.path().join("source0.rs").is_file());
    }

    #[test]
    fn missing_input_aborts_staging() {
        let origin = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(origin.path().join("a.rs"), "").unwrap();

        let inputs = vec![PathBuf::from("a.rs"), PathBuf::from("missing.rs")];
        let err = stage_all(origin.path(), &inputs, dest.path()).unwrap_err();

        match err {
            BuildError::MissingInput(path) => {
                assert_eq!(path, origin.path().join("missing.rs"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn can_check_inputs() {
        let origin = tempfile::tempdir().unwrap();
        std::fs::write(origin.path().join("a.rs"), "").unwrap();

        assert!(check_inputs(origin.path(), &[PathBuf::from("a.rs")]).is_ok());

        let inputs = vec![
            PathBuf::from("a.rs"),
            PathBuf::from("gone/b.rs"),
            PathBuf::from("c.rs"),
        ];
        match check_inputs(origin.path(), &inputs).unwrap_err() {
            BuildError::MissingInput(path) => {
                assert_eq!(path, origin.path().join("gone/b.rs"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn directories_are_not_inputs() {
        let origin = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::create_dir(origin.path().join("src")).unwrap();

        let err = stage_all(origin.path(), &[PathBuf::from("src")], dest.path()).unwrap_err();
        assert!(matches!(err, BuildError::MissingInput(_)));
    }
}
