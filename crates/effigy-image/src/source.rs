use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::ImageError;

/// An input an image or collection can be read from.
///
/// All shapes normalize into the single byte payload the engine's read entry
/// point requires. Buffer-backed inputs are adopted without copying; readers
/// are drained to the end and need not be seekable.
pub enum ImageSource {
    /// An in-memory payload, adopted as-is.
    Bytes(Vec<u8>),
    /// A file path, read when the source is normalized.
    File(PathBuf),
    /// An arbitrary byte stream.
    Reader(Box<dyn Read>),
}

impl ImageSource {
    /// Wraps a byte stream. The stream is only consumed when the source is
    /// normalized.
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Normalizes the source into the byte payload the engine consumes.
    ///
    /// # Errors
    ///
    /// [`ImageError::Io`] when the file or stream cannot be read.
    pub fn into_bytes(self) -> Result<Vec<u8>, ImageError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::File(path) => Ok(std::fs::read(path)?),
            Self::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn bytes_are_adopted_without_modification() -> Result<(), ImageError> {
        let payload = vec![1u8, 2, 3];
        let source = ImageSource::from(payload.clone());
        assert_eq!(source.into_bytes()?, payload);
        Ok(())
    }

    #[test]
    fn reader_is_drained_to_the_end() -> Result<(), ImageError> {
        let source = ImageSource::from_reader(Cursor::new(vec![9u8; 64]));
        assert_eq!(source.into_bytes()?.len(), 64);
        Ok(())
    }

    #[test]
    fn missing_file_maps_to_an_io_error() {
        let source = ImageSource::from(Path::new("/definitely/not/here.efx"));
        assert!(matches!(
            source.into_bytes(),
            Err(ImageError::Io(_))
        ));
    }

    #[test]
    fn file_contents_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frame.efx");
        std::fs::write(&path, [7u8, 7, 7])?;

        let source = ImageSource::from(path);
        assert_eq!(source.into_bytes()?, vec![7, 7, 7]);
        Ok(())
    }
}
