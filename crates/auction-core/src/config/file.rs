// # Configuration File
//
// Durable JSON storage for a configuration tree.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of the last good file
// - Recovery: Falls back to the backup if the main file does not parse
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "root": {
//     "tag": "auctions",
//     "attributes": { "count": "2" },
//     "children": [
//       { "tag": "server", "attributes": { "NAME": "ebay" } }
//     ]
//   }
// }
// ```

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::ConfigNode;

/// Configuration file format version
const CONFIG_FILE_VERSION: &str = "1.0";

/// Serializable file envelope
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ConfigFileFormat {
    version: String,
    root: ConfigNode,
}

/// JSON-backed storage for a configuration tree
///
/// # Example
///
/// ```rust,no_run
/// use auction_core::config::{ConfigFile, ConfigNode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let file = ConfigFile::new("/var/lib/auctions/auctions.json").await?;
///
///     file.save(&ConfigNode::new("auctions")).await?;
///     let root = file.load().await?;
///     assert_eq!(root.map(|r| r.tag().to_string()), Some("auctions".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Bind to a configuration file path, creating parent directories
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Path of the main file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored tree
    ///
    /// # Returns
    ///
    /// - `Ok(Some(root))`: Tree loaded from the main file or its backup
    /// - `Ok(None)`: No file yet, or both files are unreadable as JSON
    /// - `Err(Error)`: I/O failure other than a missing file
    pub async fn load(&self) -> Result<Option<ConfigNode>, Error> {
        match Self::read_tree(&self.path).await {
            Ok(root) => Ok(root),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Configuration file {} appears corrupted: {}. Attempting recovery from backup.",
                    self.path.display(),
                    e
                );

                let backup_path = Self::backup_path(&self.path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty configuration.");
                    return Ok(None);
                }

                match Self::read_tree(&backup_path).await {
                    Ok(root) => {
                        tracing::info!("Recovered configuration from backup");
                        if let Err(restore_err) = fs::copy(&backup_path, &self.path).await {
                            tracing::error!(
                                "Failed to restore configuration file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(root)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty configuration.",
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Write the tree atomically, keeping the previous file as a backup
    pub async fn save(&self, root: &ConfigNode) -> Result<(), Error> {
        let envelope = ConfigFileFormat {
            version: CONFIG_FILE_VERSION.to_string(),
            root: root.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create configuration backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await?;

        tracing::trace!("Configuration written to {}", self.path.display());
        Ok(())
    }

    async fn read_tree(path: &Path) -> Result<Option<ConfigNode>, Error> {
        if !path.exists() {
            tracing::debug!("Configuration file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await?;
        let envelope: ConfigFileFormat = serde_json::from_str(&content)?;

        if envelope.version != CONFIG_FILE_VERSION {
            tracing::warn!(
                "Configuration file version mismatch: expected {}, got {}. Attempting to load anyway.",
                CONFIG_FILE_VERSION,
                envelope.version
            );
        }

        Ok(Some(envelope.root))
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}
