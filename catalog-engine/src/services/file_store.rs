//! 上传文件区
//!
//! 文档里存的是公开路径 (`/uploads/...`)，磁盘上是 `root` 下的相对路径。
//! 所有删除都是幂等的：文件不存在不算错误。

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::{AppError, AppResult};

/// 公开路径前缀
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// 文件存储：公开路径 <-> 磁盘路径 的映射与基本操作
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 公开路径映射到磁盘路径，拒绝越界
    pub fn disk_path(&self, public_path: &str) -> AppResult<PathBuf> {
        let rel = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or_else(|| {
                AppError::validation(format!("invalid upload path: {public_path}"))
            })?;
        if rel.is_empty() || rel.split('/').any(|seg| seg == "..") {
            return Err(AppError::validation(format!(
                "invalid upload path: {public_path}"
            )));
        }
        Ok(self.root.join(rel))
    }

    pub async fn exists(&self, public_path: &str) -> bool {
        match self.disk_path(public_path) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn write(&self, public_path: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.disk_path(public_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!("create dir for {public_path}: {e}"))
            })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("write {public_path}: {e}")))
    }

    pub async fn read(&self, public_path: &str) -> AppResult<Vec<u8>> {
        let path = self.disk_path(public_path)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("read {public_path}: {e}")))
    }

    /// 删除文件，不存在时静默成功。返回是否真的删了
    pub async fn delete_if_exists(&self, public_path: &str) -> bool {
        let Ok(path) = self.disk_path(public_path) else {
            warn!("Refusing to delete invalid upload path: {}", public_path);
            return false;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(_) => {
                debug!("Deleted upload file: {}", public_path);
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to delete {}: {}", public_path, e);
                false
            }
        }
    }
}
