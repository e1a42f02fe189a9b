//! In-process bundle store.

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::backend::Backend;
use crate::bundle::{Bundle, BundleKey};
use crate::error::{BurrowError, Result};

/// Keeps dumped bundles in a process-local map.
///
/// Bundles are copied on dump and load, so callers never share state with
/// the store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    bundles: RwLock<AHashMap<BundleKey, Bundle>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bundles.
    pub fn len(&self) -> usize {
        self.bundles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn dump(&self, key: &BundleKey, bundle: &Bundle) -> Result<()> {
        self.bundles.write().insert(key.clone(), bundle.clone());
        Ok(())
    }

    fn load(&self, key: &BundleKey) -> Result<Bundle> {
        self.bundles
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| BurrowError::not_found(format!("bundle {key}")))
    }

    fn clear(&self, key: &BundleKey) -> Result<()> {
        self.bundles.write().remove(key);
        Ok(())
    }

    fn exists(&self, key: &BundleKey) -> bool {
        self.bundles.read().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Phase;
    use crate::data::DocId;

    #[test]
    fn test_dump_load_clear() {
        let backend = MemoryBackend::new();
        let key = BundleKey::new("books", "title", Phase::Exact);
        assert!(!backend.exists(&key));
        assert!(matches!(backend.load(&key), Err(BurrowError::NotFound(_))));

        let mut bundle = Bundle::new();
        bundle.add("hobbit", DocId::Int(1));
        bundle.weights.insert("hobbit".into(), 1.0);
        backend.dump(&key, &bundle).unwrap();

        assert!(backend.exists(&key));
        assert_eq!(backend.load(&key).unwrap(), bundle);
        assert_eq!(backend.len(), 1);

        backend.clear(&key).unwrap();
        assert!(!backend.exists(&key));
        backend.clear(&key).unwrap();
    }
}
