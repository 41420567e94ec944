use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::loader::TextSource;

pub struct PlainFileLoader {
    filepath: PathBuf,
}

impl PlainFileLoader {
    pub fn new<P>(filepath: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            filepath: PathBuf::from(filepath.as_ref()),
        }
    }
}

impl TextSource for PlainFileLoader {
    type Reader = BufReader<File>;

    fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.filepath)
            .with_context(|| format!("failed to open {}", self.filepath.display()))?;
        Ok(BufReader::new(file))
    }
}
