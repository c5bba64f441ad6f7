use crate::container::Container;
use crate::error::{Error, Result};
use std::io;
use std::path::Path;

/// Container backends, selected by file extension.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Backend {
    /// HDF5 (`.h5`, `.hdf5`, `.he5`), requires the `hdf5` feature.
    Hdf5,
    /// JSON tree (`.json`).
    Json,
}

impl Backend {
    pub fn for_path(path: &Path) -> Option<Backend> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "h5" | "hdf5" | "he5" => Some(Backend::Hdf5),
            "json" => Some(Backend::Json),
            _ => None,
        }
    }
}

/// Opens a result file read-only and reads its whole tree. The file
/// handle does not outlive this call.
pub fn open(path: &Path) -> Result<Container> {
    if !path.is_file() {
        return Err(Error::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        });
    }
    let backend = Backend::for_path(path).ok_or_else(|| Error::Format {
        path: path.to_path_buf(),
        message: "unrecognized container format (expected .h5, .hdf5 or .json)".to_string(),
    })?;
    log::debug!("opening {} as {:?}", path.display(), backend);

    match backend {
        Backend::Json => crate::json::load(path),
        #[cfg(feature = "hdf5")]
        Backend::Hdf5 => crate::h5::load(path),
        #[cfg(not(feature = "hdf5"))]
        Backend::Hdf5 => Err(Error::Format {
            path: path.to_path_buf(),
            message: "HDF5 support requires the `hdf5` feature".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_backend_for_path() {
        assert_eq!(Backend::for_path(Path::new("s.h5")), Some(Backend::Hdf5));
        assert_eq!(Backend::for_path(Path::new("s.HDF5")), Some(Backend::Hdf5));
        assert_eq!(Backend::for_path(Path::new("a/s.json")), Some(Backend::Json));
        assert_eq!(Backend::for_path(Path::new("s.csv")), None);
        assert_eq!(Backend::for_path(Path::new("scenario")), None);
    }

    #[test]
    fn test_open_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        match open(&dir.path().join("absent.h5")) {
            Err(Error::Io { path, .. }) => assert!(path.ends_with("absent.h5")),
            other => panic!("expected an I/O error, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }

    #[test]
    fn test_open_unknown_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("scenario.txt");
        std::fs::write(&path, "{}")?;
        assert!(matches!(open(&path), Err(Error::Format { .. })));
        Ok(())
    }
}
