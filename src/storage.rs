use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::ErrorKind;

/// Owner of the upload root. All destination paths are resolved through it.
#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Resolves a client-declared relative path to a destination under the
    /// root and creates its parent directories. The destination itself may
    /// already exist; uploads overwrite in place.
    pub async fn prepare_destination(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let target = self.resolve_path_checked(relative, true).await?;
        if target == self.root {
            return Err(StorageError::InvalidPath);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(target)
    }

    pub async fn resolve_path_checked(
        &self,
        relative: &str,
        allow_missing_leaf: bool,
    ) -> Result<PathBuf, StorageError> {
        let target = self.resolve(relative)?;
        self.ensure_no_symlink_components(&target, allow_missing_leaf)
            .await?;
        Ok(target)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let mut normalized = PathBuf::new();
        let trimmed = relative.trim_start_matches(['/', '\\']);

        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(segment) => normalized.push(segment),
                Component::CurDir => continue,
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath);
                }
            }
        }

        Ok(self.root.join(normalized))
    }

    async fn ensure_no_symlink_components(
        &self,
        target: &Path,
        allow_missing_leaf: bool,
    ) -> Result<(), StorageError> {
        let relative = target
            .strip_prefix(&self.root)
            .map_err(|_| StorageError::InvalidPath)?;
        let mut current = PathBuf::from(&self.root);
        let mut components = relative.components().peekable();

        while let Some(component) = components.next() {
            current.push(component.as_os_str());
            match fs::symlink_metadata(&current).await {
                Ok(metadata) => {
                    if metadata.file_type().is_symlink() {
                        return Err(StorageError::InvalidPath);
                    }
                    if components.peek().is_some() && !metadata.is_dir() {
                        return Err(StorageError::InvalidPath);
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound && allow_missing_leaf => {
                    return Ok(());
                }
                Err(err) => return Err(StorageError::Io(err)),
            }
        }

        Ok(())
    }

    /// Depth-first walk of the upload root. Emits one entry per regular file
    /// with its root-relative path; directories are not emitted. A missing
    /// root yields an empty list.
    pub async fn walk_files(&self) -> Result<Vec<StoredFile>, StorageError> {
        let mut files = Vec::new();
        match fs::metadata(&self.root).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(files),
            Err(err) => return Err(StorageError::Io(err)),
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(entry.path());
                    continue;
                }
                if !metadata.is_file() {
                    continue;
                }
                let name = entry
                    .path()
                    .strip_prefix(&self.root)
                    .map_err(|_| StorageError::InvalidPath)?
                    .to_string_lossy()
                    .replace(std::path::MAIN_SEPARATOR, "/");
                let modified = format_timestamp(metadata.modified()?);

                files.push(StoredFile {
                    name,
                    size: metadata.len(),
                    modified,
                });
            }
        }

        Ok(files)
    }
}

fn format_timestamp(timestamp: SystemTime) -> String {
    let datetime: DateTime<Utc> = timestamp.into();
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug)]
pub enum StorageError {
    InvalidPath,
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

#[derive(Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub modified: String,
}
