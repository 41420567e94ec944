use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use zstd::stream::read::Decoder;

use crate::loader::TextSource;

pub struct GzFileLoader {
    filepath: PathBuf,
}

impl GzFileLoader {
    pub fn new<P>(filepath: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            filepath: PathBuf::from(filepath.as_ref()),
        }
    }
}

impl TextSource for GzFileLoader {
    type Reader = GzDecoder<File>;

    fn open(&self) -> Result<GzDecoder<File>> {
        let file = File::open(&self.filepath)
            .with_context(|| format!("failed to open {}", self.filepath.display()))?;
        Ok(GzDecoder::new(file))
    }
}

pub struct ZstdFileLoader {
    filepath: PathBuf,
}

impl ZstdFileLoader {
    pub fn new<P>(filepath: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            filepath: PathBuf::from(filepath.as_ref()),
        }
    }
}

impl TextSource for ZstdFileLoader {
    type Reader = Decoder<'static, BufReader<File>>;

    fn open(&self) -> Result<Self::Reader> {
        let file = File::open(&self.filepath)
            .with_context(|| format!("failed to open {}", self.filepath.display()))?;
        Ok(Decoder::new(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn reads_back_compressed_files() {
        let dir = std::env::temp_dir().join(format!("msufsort-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let gz_path = dir.join("text.gz");
        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
        encoder.write_all(b"mississippi").unwrap();
        encoder.finish().unwrap();
        assert_eq!(GzFileLoader::new(&gz_path).read_all(None).unwrap(), b"mississippi");

        let zst_path = dir.join("text.zst");
        let compressed = zstd::encode_all(&b"banana"[..], 0).unwrap();
        std::fs::write(&zst_path, compressed).unwrap();
        assert_eq!(ZstdFileLoader::new(&zst_path).read_all(Some(3)).unwrap(), b"ban");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
