//! Writes an approved plan's files under an output directory.
//!
//! File names come from model output, so every name is checked before
//! anything is written: relative, non-empty, and free of `..`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Errors from exporting a plan.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("unsafe file name: {0}")]
    UnsafePath(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Check that `name` stays inside whatever directory it is joined onto.
pub fn safe_relative_path(name: &str) -> Result<PathBuf, WriteError> {
    let path = Path::new(name);
    if name.trim().is_empty() {
        return Err(WriteError::UnsafePath(name.to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(WriteError::UnsafePath(name.to_string()));
            }
        }
    }
    Ok(path.to_path_buf())
}

/// Write every file under `base_dir`, creating directories as needed.
///
/// All names are validated first; an unsafe name aborts before any write.
/// Returns the written paths in name order.
pub async fn write_files(
    base_dir: &Path,
    files: &BTreeMap<String, String>,
) -> Result<Vec<PathBuf>, WriteError> {
    let targets = files
        .iter()
        .map(|(name, content)| Ok((base_dir.join(safe_relative_path(name)?), content)))
        .collect::<Result<Vec<_>, WriteError>>()?;

    let mut written = Vec::with_capacity(targets.len());
    for (path, content) in targets {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| WriteError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| WriteError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), "file created");
        written.push(path);
    }
    Ok(written)
}
