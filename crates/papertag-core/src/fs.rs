use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{PapertagError, Result};

pub const VOCABULARY_FILE: &str = "tag_hierarchy.json";
pub const GROUPS_FILE: &str = "tag_groups.json";
pub const CATALOG_FILE: &str = "catalog.json";
pub const CONFIG_FILE: &str = "papertag.toml";
pub const REQUEST_LOG_FILE: &str = "logs/requests.jsonl";

#[derive(Debug, Clone)]
pub struct DocumentFs {
    root: PathBuf,
}

impl DocumentFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.root.join("logs"))?;
        Ok(())
    }

    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let candidate = Path::new(relative);
        let escapes = candidate.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if relative.trim().is_empty() || escapes {
            return Err(PapertagError::Validation(format!(
                "document path must stay inside the root: {relative}"
            )));
        }
        Ok(self.root.join(candidate))
    }

    pub fn read_optional(&self, relative: &str) -> Result<Option<String>> {
        let path = self.resolve(relative)?;
        if !path.exists() {
            return Ok(None);
        }
        if path.is_dir() {
            return Err(PapertagError::Validation(format!(
                "cannot read directory: {}",
                path.display()
            )));
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    pub fn read_document<T>(&self, relative: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.read_optional(relative)? else {
            return Ok(None);
        };
        let path = self.resolve(relative)?;
        let parsed = serde_json::from_str::<T>(&raw)
            .map_err(|err| PapertagError::malformed(&path, err))?;
        debug!(path = %path.display(), "loaded document");
        Ok(Some(parsed))
    }

    pub fn write_document<T>(&self, relative: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        self.write_atomic(relative, &content)
    }

    pub fn write_atomic(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        let parent = path.parent().ok_or_else(|| {
            PapertagError::Validation(format!("target has no parent: {}", path.display()))
        })?;
        fs::create_dir_all(parent)?;

        let file_name = path
            .file_name()
            .and_then(|x| x.to_str())
            .ok_or_else(|| {
                PapertagError::Validation(format!("invalid target filename: {}", path.display()))
            })?;
        let tmp_name = format!(".{file_name}.papertag.tmp.{}", uuid::Uuid::new_v4().simple());
        let tmp_path = parent.join(tmp_name);

        {
            let mut tmp = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&tmp_path)?;
            tmp.write_all(content.as_bytes())?;
            tmp.sync_all()?;
        }

        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PapertagError::from(err));
        }

        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
        debug!(path = %path.display(), bytes = content.len(), "wrote document");
        Ok(())
    }

    pub fn append(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Blocks until this process holds the exclusive lock guarding `relative`.
    /// Released when the returned guard is dropped.
    pub fn lock_exclusive(&self, relative: &str) -> Result<DocumentLock> {
        let path = self.resolve(relative)?;
        let parent = path.parent().ok_or_else(|| {
            PapertagError::Validation(format!("target has no parent: {}", path.display()))
        })?;
        fs::create_dir_all(parent)?;
        let file_name = path
            .file_name()
            .and_then(|x| x.to_str())
            .unwrap_or("document");
        let lock_path = parent.join(format!(".{file_name}.lock"));
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive().map_err(|err| {
            PapertagError::Internal(format!(
                "failed to acquire document lock {}: {err}",
                lock_path.display()
            ))
        })?;
        Ok(DocumentLock {
            file,
            path: lock_path,
        })
    }
}

#[derive(Debug)]
pub struct DocumentLock {
    file: fs::File,
    path: PathBuf,
}

impl DocumentLock {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
