use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::{io_atomic, paths, utils};

use super::tags::parse_frontmatter_tags;
use super::types::VaultEntry;
use super::Vault;

/// [`Vault`] backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, rel: &str) -> SyncResult<PathBuf> {
        paths::join_under(&self.root, Path::new(&paths::normalize_vault_path(rel)))
    }
}

impl Vault for FsVault {
    fn exists(&self, rel: &str) -> SyncResult<bool> {
        Ok(self.abs(rel)?.is_file())
    }

    fn read(&self, rel: &str) -> SyncResult<String> {
        let abs = self.abs(rel)?;
        match std::fs::read_to_string(&abs) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(SyncError::NoteNotFound(rel.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, rel: &str, text: &str) -> SyncResult<()> {
        let abs = self.abs(rel)?;
        io_atomic::write_atomic(&abs, text.as_bytes())?;
        Ok(())
    }

    fn list(&self, folder: &str) -> SyncResult<Vec<VaultEntry>> {
        let rel_dir = paths::normalize_vault_path(folder);
        let abs_dir = self.abs(&rel_dir)?;
        if !abs_dir.is_dir() {
            return Err(SyncError::NoteNotFound(format!("folder {rel_dir}")));
        }

        let mut out = Vec::new();
        for entry in std::fs::read_dir(&abs_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if utils::should_hide(&name) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            let rel_path = paths::to_slash(&Path::new(&rel_dir).join(&name));
            if meta.is_dir() {
                out.push(VaultEntry::Folder { name, rel_path });
            } else if meta.is_file() {
                let is_markdown = utils::is_markdown_path(Path::new(&name));
                out.push(VaultEntry::File {
                    name,
                    rel_path,
                    is_markdown,
                });
            }
        }
        out.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(out)
    }

    fn frontmatter_tags(&self, rel: &str) -> SyncResult<Vec<String>> {
        let markdown = self.read(rel)?;
        Ok(parse_frontmatter_tags(&markdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempVault {
        root: PathBuf,
    }

    impl TempVault {
        fn new() -> Self {
            let root = std::env::temp_dir().join(format!("pp-vault-test-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&root).expect("temp vault should be created");
            Self { root }
        }
    }

    impl Drop for TempVault {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn lists_children_as_tagged_entries() {
        let temp = TempVault::new();
        let vault = FsVault::new(&temp.root);
        vault.write("Projects/Alpha/Alpha.md", "---\ntags: [work/alpha]\n---\n").expect("write");
        vault.write("Projects/readme.txt", "x").expect("write");
        std::fs::create_dir_all(temp.root.join("Projects/.hidden")).expect("hidden dir");

        let entries = vault.list("Projects").expect("list");
        assert_eq!(
            entries,
            vec![
                VaultEntry::Folder {
                    name: "Alpha".to_string(),
                    rel_path: "Projects/Alpha".to_string(),
                },
                VaultEntry::File {
                    name: "readme.txt".to_string(),
                    rel_path: "Projects/readme.txt".to_string(),
                    is_markdown: false,
                },
            ]
        );
        assert_eq!(entries[1].basename(), "readme");
        assert_eq!(
            vault.frontmatter_tags("Projects/Alpha/Alpha.md").expect("tags"),
            vec!["work/alpha"]
        );
    }

    #[test]
    fn missing_note_is_reported_softly() {
        let temp = TempVault::new();
        let vault = FsVault::new(&temp.root);
        assert!(!vault.exists("Daily/2024-01-01.md").expect("exists"));
        let err = vault.read("Daily/2024-01-01.md").expect_err("missing");
        assert!(err.is_soft());
        assert!(vault.read("../outside.md").is_err());
    }
}
