use serde::Serialize;

/// A child of a vault folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaultEntry {
    File {
        name: String,
        rel_path: String,
        is_markdown: bool,
    },
    Folder {
        name: String,
        rel_path: String,
    },
}

impl VaultEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Folder { name, .. } => name,
        }
    }

    pub fn rel_path(&self) -> &str {
        match self {
            Self::File { rel_path, .. } | Self::Folder { rel_path, .. } => rel_path,
        }
    }

    /// File name without its extension. Folders return their name.
    pub fn basename(&self) -> &str {
        match self {
            Self::File { name, .. } => name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name),
            Self::Folder { name, .. } => name,
        }
    }
}
