mod compressed;
mod plain;

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Result};

pub use crate::loader::compressed::{GzFileLoader, ZstdFileLoader};
pub use crate::loader::plain::PlainFileLoader;

/// Source of the raw bytes of a text to sort.
pub trait TextSource {
    type Reader: Read;

    /// Opens a fresh reader over the text.
    fn open(&self) -> Result<Self::Reader>;

    /// Reads the whole text, keeping at most `limit` bytes when given.
    fn read_all(&self, limit: Option<usize>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match limit {
            Some(max_bytes) => self.open()?.take(max_bytes as u64).read_to_end(&mut buffer)?,
            None => self.open()?.read_to_end(&mut buffer)?,
        };
        Ok(buffer)
    }
}

/// File formats supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Plain,
    Gzip,
    Zstd,
}

impl InputFormat {
    /// Guesses the format from the file extension.
    pub fn infer<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("gz") => Self::Gzip,
            Some("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

impl FromStr for InputFormat {
    type Err = &'static str;

    fn from_str(fmt: &str) -> Result<Self, Self::Err> {
        match fmt {
            "plain" => Ok(Self::Plain),
            "gzip" => Ok(Self::Gzip),
            "zstd" => Ok(Self::Zstd),
            _ => Err("Invalid format"),
        }
    }
}

/// Reads `path` in the given format.
pub fn read_text<P: AsRef<Path>>(path: P, format: InputFormat, limit: Option<usize>) -> Result<Vec<u8>> {
    match format {
        InputFormat::Plain => PlainFileLoader::new(path).read_all(limit),
        InputFormat::Gzip => GzFileLoader::new(path).read_all(limit),
        InputFormat::Zstd => ZstdFileLoader::new(path).read_all(limit),
    }
}

/// Reinterprets little-endian byte pairs as 16-bit symbols.
pub fn wide_symbols(bytes: &[u8]) -> Result<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        bail!("wide input has an odd number of bytes ({})", bytes.len());
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::infer("corpus.txt"), InputFormat::Plain);
        assert_eq!(InputFormat::infer("corpus.txt.gz"), InputFormat::Gzip);
        assert_eq!(InputFormat::infer("corpus.zst"), InputFormat::Zstd);
        assert_eq!("zstd".parse(), Ok(InputFormat::Zstd));
    }

    #[test]
    fn wide_symbols_are_little_endian() {
        assert_eq!(wide_symbols(&[1, 0, 0, 1]).unwrap(), vec![1, 256]);
        assert!(wide_symbols(&[1, 0, 0]).is_err());
    }
}
