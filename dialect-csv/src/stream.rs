//! File handles shared by the reader and the writer.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{CsvError, CsvResult, OpenMode};

/// Seekable byte source. Rewinding is needed by `reset` and `count`.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

pub(crate) fn open_for_reading(path: &Path) -> CsvResult<File> {
    File::open(path).map_err(|source| CsvError::Open {
        path: path.to_path_buf(),
        mode: OpenMode::Reading,
        source,
    })
}

/// Creates or truncates `path`.
pub(crate) fn open_for_writing(path: &Path) -> CsvResult<File> {
    File::create(path).map_err(|source| CsvError::Open {
        path: path.to_path_buf(),
        mode: OpenMode::Writing,
        source,
    })
}

pub(crate) fn require_filename(filename: Option<&Path>) -> CsvResult<&Path> {
    filename
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or_else(|| CsvError::invalid_argument("the filename is not valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let err = open_for_reading(Path::new("/nonexistent/foobar.csv")).unwrap_err();
        assert!(matches!(err, CsvError::Open { mode: OpenMode::Reading, .. }));
    }

    #[test]
    fn test_open_for_writing_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, b"old content").unwrap();

        open_for_writing(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_require_filename() {
        assert!(require_filename(None).is_err());
        assert!(require_filename(Some(Path::new(""))).is_err());
        assert_eq!(require_filename(Some(Path::new("a.csv"))).unwrap(), Path::new("a.csv"));
    }
}
