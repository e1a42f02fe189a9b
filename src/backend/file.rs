//! JSON file bundle store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<index>/<category>/<phase>/inverted.json
//!                                  /weights.json
//!                                  /similarity.json
//!                                  /configuration.json
//! ```
//!
//! Each part is written to a `.tmp` sibling and renamed into place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::Backend;
use crate::bundle::{Bundle, BundleKey};
use crate::error::{BurrowError, Result};

const INVERTED_FILE: &str = "inverted.json";
const WEIGHTS_FILE: &str = "weights.json";
const SIMILARITY_FILE: &str = "similarity.json";
const CONFIGURATION_FILE: &str = "configuration.json";

const PARTS: [&str; 4] = [
    INVERTED_FILE,
    WEIGHTS_FILE,
    SIMILARITY_FILE,
    CONFIGURATION_FILE,
];

/// Stores each bundle as four JSON files below a root directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `root`. The directory is created lazily.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, key: &BundleKey) -> PathBuf {
        self.root
            .join(&key.index)
            .join(&key.category)
            .join(key.phase.as_str())
    }

    fn write_part<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
        let tmp = dir.join(format!("{name}.tmp"));
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| BurrowError::backend(format!("failed to flush {name}: {e}")))?
            .sync_all()?;
        fs::rename(&tmp, dir.join(name))?;
        Ok(())
    }

    fn read_part<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
        let reader = BufReader::new(File::open(dir.join(name))?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Backend for FileBackend {
    fn dump(&self, key: &BundleKey, bundle: &Bundle) -> Result<()> {
        let dir = self.dir(key);
        fs::create_dir_all(&dir)?;
        Self::write_part(&dir, INVERTED_FILE, &bundle.inverted)?;
        Self::write_part(&dir, WEIGHTS_FILE, &bundle.weights)?;
        Self::write_part(&dir, SIMILARITY_FILE, &bundle.similarity)?;
        Self::write_part(&dir, CONFIGURATION_FILE, &bundle.configuration)?;
        Ok(())
    }

    fn load(&self, key: &BundleKey) -> Result<Bundle> {
        if !self.exists(key) {
            return Err(BurrowError::not_found(format!("bundle {key}")));
        }
        let dir = self.dir(key);
        Ok(Bundle {
            inverted: Self::read_part(&dir, INVERTED_FILE)?,
            weights: Self::read_part(&dir, WEIGHTS_FILE)?,
            similarity: Self::read_part(&dir, SIMILARITY_FILE)?,
            configuration: Self::read_part(&dir, CONFIGURATION_FILE)?,
        })
    }

    fn clear(&self, key: &BundleKey) -> Result<()> {
        let dir = self.dir(key);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    fn exists(&self, key: &BundleKey) -> bool {
        let dir = self.dir(key);
        PARTS.iter().all(|part| dir.join(part).is_file())
    }
}
