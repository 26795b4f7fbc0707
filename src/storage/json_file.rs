//! One JSON file per entity.
//!
//! ```text
//! <data_dir>/restaurants/chez-test.json
//! <data_dir>/orders/6f1c....json
//! ```
//!
//! Writes go to `<id>.json.tmp` first and are renamed over the target, so a crash mid-write
//! leaves either the old or the new version, never a torn file. Leftover temp files are
//! cleaned up on load.

use resource_actor::{ActorEntity, Store, StoreError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const MAX_KEY_LEN: usize = 128;

/// File-per-entity store rooted at one collection directory.
#[derive(Debug)]
pub struct JsonFileStore<T> {
    dir: PathBuf,
    _entity: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    /// Opens (creating it if needed) the collection directory `root/collection`.
    pub async fn open(root: impl AsRef<Path>, collection: &str) -> Result<Self, StoreError> {
        check_key(collection)?;
        let dir = root.as_ref().join(collection);
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            _entity: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Keys become file names, so only a conservative alphabet is accepted.
fn check_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl<T> Store<T> for JsonFileStore<T>
where
    T: ActorEntity + Serialize + DeserializeOwned,
{
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        let mut items = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".json.tmp") {
                warn!(file = %path.display(), "Removing interrupted write");
                fs::remove_file(&path).await?;
                continue;
            }
            if !name.ends_with(".json") {
                continue;
            }

            let bytes = fs::read(&path).await?;
            let item: T = serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Serialization(format!("{}: {e}", path.display()))
            })?;
            items.push(item);
        }
        debug!(dir = %self.dir.display(), count = items.len(), "Loaded collection");
        Ok(items)
    }

    async fn save(&self, item: &T) -> Result<(), StoreError> {
        let path = self.path_for(&item.id().to_string())?;
        let json = serde_json::to_vec_pretty(item)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, id: &T::Id) -> Result<(), StoreError> {
        let path = self.path_for(&id.to_string())?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderId, PlaceOrderRequest, Slug};
    use tempfile::TempDir;

    fn order() -> Order {
        Order::new(
            OrderId::random(),
            Slug::parse("chez-test").unwrap(),
            PlaceOrderRequest::default(),
        )
    }

    #[tokio::test]
    async fn saved_entities_load_back() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::<Order>::open(tmp.path(), "orders").await.unwrap();

        let mut first = order();
        store.save(&first).await.unwrap();
        store.save(&order()).await.unwrap();
        first.touch();
        store.save(&first).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        let reloaded = loaded.iter().find(|o| o.id == first.id).unwrap();
        assert_eq!(reloaded, &first);
        assert!(tmp
            .path()
            .join("orders")
            .join(format!("{}.json", first.id))
            .exists());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::<Order>::open(tmp.path(), "orders").await.unwrap();
        let o = order();
        store.save(&o).await.unwrap();

        store.remove(&o.id).await.unwrap();
        store.remove(&o.id).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_temp_files_are_cleaned_and_foreign_files_ignored() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::<Order>::open(tmp.path(), "orders").await.unwrap();
        std::fs::write(store.dir().join("half.json.tmp"), b"{\"id\":").unwrap();
        std::fs::write(store.dir().join("README"), b"hello").unwrap();

        assert!(store.load().await.unwrap().is_empty());
        assert!(!store.dir().join("half.json.tmp").exists());
        assert!(store.dir().join("README").exists());
    }

    #[tokio::test]
    async fn corrupt_files_fail_the_load() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::<Order>::open(tmp.path(), "orders").await.unwrap();
        std::fs::write(store.dir().join("broken.json"), b"not json").unwrap();

        assert!(matches!(
            store.load().await,
            Err(StoreError::Serialization(msg)) if msg.contains("broken.json")
        ));
    }

    #[test]
    fn keys_must_be_plain_file_names() {
        assert!(check_key("chez-test").is_ok());
        assert!(check_key("6f1c2d3e-0000-4000-8000-000000000000").is_ok());
        for bad in ["", "../etc", "a/b", ".hidden", "tab\tname"] {
            assert!(check_key(bad).is_err(), "{bad:?} accepted");
        }
    }
}
