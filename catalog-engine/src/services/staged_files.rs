//! 文件暂存事务
//!
//! 数据库事务提交前，待删文件先复制出 `.bak` 备份；
//! 提交后删正本和备份，回滚时删新增文件并从备份还原。
//! 两个方向都幂等，缺失的源文件直接跳过。

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::{AppError, AppResult};
use crate::services::FileStore;

struct FileBackup {
    public_path: String,
    original: PathBuf,
    backup: PathBuf,
}

/// 一次图片变更的文件侧事务
pub struct StagedFileTransaction {
    store: FileStore,
    backups: Vec<FileBackup>,
    additions: Vec<String>,
    settled: bool,
}

impl StagedFileTransaction {
    /// 备份所有待删文件并登记新增文件
    ///
    /// 备份中途失败时已建的备份会被清掉，整体返回错误
    pub async fn stage(
        store: &FileStore,
        removals: &[String],
        additions: &[String],
    ) -> AppResult<Self> {
        let mut backups: Vec<FileBackup> = Vec::with_capacity(removals.len());

        for public_path in removals {
            let original = store.disk_path(public_path)?;
            if !tokio::fs::try_exists(&original).await.unwrap_or(false) {
                debug!("Skipping backup of missing file: {}", public_path);
                continue;
            }
            let backup = PathBuf::from(format!("{}.bak", original.display()));
            if let Err(e) = tokio::fs::copy(&original, &backup).await {
                for b in &backups {
                    if let Err(e) = tokio::fs::remove_file(&b.backup).await {
                        warn!("Failed to clean up backup {}: {}", b.backup.display(), e);
                    }
                }
                return Err(AppError::Internal(anyhow::anyhow!(
                    "backup {public_path}: {e}"
                )));
            }
            backups.push(FileBackup {
                public_path: public_path.clone(),
                original,
                backup,
            });
        }

        Ok(Self {
            store: store.clone(),
            backups,
            additions: additions.to_vec(),
            settled: false,
        })
    }

    /// 数据库已提交：删除被替换的正本和备份，新增文件保留
    pub async fn commit(mut self) {
        self.settled = true;
        for b in &self.backups {
            if let Err(e) = tokio::fs::remove_file(&b.original).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to delete {}: {}", b.public_path, e);
                }
            }
            if let Err(e) = tokio::fs::remove_file(&b.backup).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to delete backup {}: {}", b.backup.display(), e);
                }
            }
        }
    }

    /// 数据库失败：删除新增文件，从备份还原正本
    pub async fn abort(mut self) {
        self.settled = true;
        for path in &self.additions {
            self.store.delete_if_exists(path).await;
        }
        for b in &self.backups {
            if let Err(e) = tokio::fs::copy(&b.backup, &b.original).await {
                warn!("Failed to restore {}: {}", b.public_path, e);
            }
            if let Err(e) = tokio::fs::remove_file(&b.backup).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to delete backup {}: {}", b.backup.display(), e);
                }
            }
        }
    }
}

impl Drop for StagedFileTransaction {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                "Staged file transaction dropped without commit or abort ({} backups, {} additions)",
                self.backups.len(),
                self.additions.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_file(path: &str, content: &[u8]) -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        store.write(path, content).await.expect("seed file");
        (dir, store)
    }

    #[tokio::test]
    async fn test_commit_deletes_original_and_backup() {
        let (_dir, store) = store_with_file("/uploads/a.png", b"old").await;

        let tx = StagedFileTransaction::stage(&store, &["/uploads/a.png".to_string()], &[])
            .await
            .expect("stage");
        tx.commit().await;

        assert!(!store.exists("/uploads/a.png").await);
        let bak = store.disk_path("/uploads/a.png").expect("path");
        assert!(!tokio::fs::try_exists(format!("{}.bak", bak.display()))
            .await
            .unwrap_or(true));
    }

    #[tokio::test]
    async fn test_abort_restores_original_and_removes_addition() {
        let (_dir, store) = store_with_file("/uploads/a.png", b"old").await;
        store.write("/uploads/new.png", b"new").await.expect("write");

        let tx = StagedFileTransaction::stage(
            &store,
            &["/uploads/a.png".to_string()],
            &["/uploads/new.png".to_string()],
        )
        .await
        .expect("stage");
        tx.abort().await;

        assert_eq!(store.read("/uploads/a.png").await.expect("restored"), b"old");
        assert!(!store.exists("/uploads/new.png").await);
    }

    #[tokio::test]
    async fn test_stage_skips_missing_removals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        let tx = StagedFileTransaction::stage(&store, &["/uploads/gone.png".to_string()], &[])
            .await
            .expect("missing removal is not an error");
        tx.commit().await;
    }

    #[tokio::test]
    async fn test_abort_is_safe_after_partial_overwrite() {
        // 正本被替换后回滚仍能拿回原内容
        let (_dir, store) = store_with_file("/uploads/a.png", b"old").await;
        let tx = StagedFileTransaction::stage(&store, &["/uploads/a.png".to_string()], &[])
            .await
            .expect("stage");
        store.write("/uploads/a.png", b"mangled").await.expect("overwrite");
        tx.abort().await;
        assert_eq!(store.read("/uploads/a.png").await.expect("read"), b"old");
    }
}
