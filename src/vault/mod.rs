mod fs;
mod tags;
mod types;

pub use fs::FsVault;
pub use tags::parse_frontmatter_tags;
pub use types::VaultEntry;

use crate::error::SyncResult;

/// File access the sync needs from the note host, keyed by vault-relative
/// slash paths. Calls block; async callers go through `spawn_blocking`.
pub trait Vault: Send + Sync {
    fn exists(&self, rel: &str) -> SyncResult<bool>;
    fn read(&self, rel: &str) -> SyncResult<String>;
    fn write(&self, rel: &str, text: &str) -> SyncResult<()>;
    fn list(&self, folder: &str) -> SyncResult<Vec<VaultEntry>>;
    fn frontmatter_tags(&self, rel: &str) -> SyncResult<Vec<String>>;
}
