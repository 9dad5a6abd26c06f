//! 설정 파일 저장소 — 읽기/백업/쓰기
//!
//! 캐시는 없습니다. 모든 `read()`는 디스크의 현재 상태를 반환하며,
//! 모든 `write()`는 먼저 기존 내용을 백업 파일로 복사한 뒤 본문을
//! 덮어씁니다. 백업은 가장 최근 것 하나만 유지됩니다.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::EditorError;

/// nginx.conf의 읽기/백업/쓰기를 담당합니다.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl ConfigStore {
    /// 설정 파일 경로로 저장소를 만듭니다.
    ///
    /// 백업 경로는 `<path>.backup` 형제 파일로 고정됩니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup = path.as_os_str().to_owned();
        backup.push(".backup");
        Self {
            path,
            backup_path: PathBuf::from(backup),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// 현재 디스크 내용을 읽습니다.
    ///
    /// # Errors
    /// - 파일이 없으면 `EditorError::ConfigNotFound`
    /// - 그 외 I/O 실패는 `EditorError::Io`
    pub async fn read(&self) -> Result<String, EditorError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EditorError::ConfigNotFound {
                    path: self.path.display().to_string(),
                }
            } else {
                EditorError::Io(e)
            }
        })
    }

    /// 백업 후 새 내용을 씁니다.
    ///
    /// 순서: 현재 내용 읽기 → 백업 파일에 쓰기 → 본문 쓰기.
    /// 백업 단계가 본문 변경보다 먼저이므로, 쓰기 실패 시에도
    /// 직전 상태는 백업에 남습니다.
    pub async fn write(&self, content: &str) -> Result<(), EditorError> {
        let current = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EditorError::Write {
                path: self.path.display().to_string(),
                reason: format!("reading current content for backup failed: {e}"),
            }
        })?;

        tokio::fs::write(&self.backup_path, &current)
            .await
            .map_err(|e| EditorError::Write {
                path: self.backup_path.display().to_string(),
                reason: format!("backup failed: {e}"),
            })?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| EditorError::Write {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            path = %self.path.display(),
            backup = %self.backup_path.display(),
            bytes = content.len(),
            "config written"
        );
        Ok(())
    }
}
