use std::path::{Path, PathBuf};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

// Keeps generated names well under the usual 255-byte file name limit.
const MAX_STEM_CHARS: usize = 100;
const MAX_EXT_CHARS: usize = 16;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_-]").expect("static regex is valid")
});

/// Thumbnail files on the local filesystem, addressed by bare file name.
#[derive(Clone, Debug)]
pub struct ThumbnailStore {
    dir: PathBuf,
}

impl ThumbnailStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Writes `bytes` under a fresh, collision-free name derived from
    /// `original_name` and returns that name.
    pub async fn save(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await.with_context(|| {
            format!("failed to create {}", self.dir.display())
        })?;

        let file_name = unique_file_name(original_name);
        let path = self.path(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(file_name)
    }

    pub async fn rename(&self, from: &str, to: &str) -> anyhow::Result<()> {
        let (from, to) = (self.path(from), self.path(to));

        tokio::fs::rename(&from, &to).await.with_context(|| {
            format!("failed to move {} to {}", from.display(), to.display())
        })
    }

    pub async fn remove(&self, file_name: &str) -> anyhow::Result<()> {
        let path = self.path(file_name);

        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("failed to remove {}", path.display()))
    }
}

// "{stem}{uuid}.{ext}": stem up to the first dot, extension after the last.
fn unique_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let split = |name: &str| -> (String, Option<String>) {
        match (name.split_once('.'), name.rsplit_once('.')) {
            (Some((stem, _)), Some((_, ext))) => {
                (stem.to_string(), Some(ext.to_string()))
            }
            _ => (name.to_string(), None),
        }
    };

    let (stem, ext) = split(base);
    let stem = sanitize(&stem, MAX_STEM_CHARS);
    let id = Uuid::new_v4();

    match ext {
        Some(ext) if !ext.is_empty() => {
            let ext = sanitize(&ext, MAX_EXT_CHARS);
            format!("{stem}{id}.{ext}")
        }
        _ => format!("{stem}{id}"),
    }
}

fn sanitize(part: &str, max_chars: usize) -> String {
    let part: String = part.chars().take(max_chars).collect();

    UNSAFE_CHARS.replace_all(&part, "_").into_owned()
}
