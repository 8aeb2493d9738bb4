//! JSON Voice Catalog - 文件系统音色目录实现
//!
//! 实现 VoiceCatalogPort trait
//!
//! 目录布局（每个用户一组文件）:
//! - `<stem>.<ext>`        上传的参考音频
//! - `<stem>_model.json`   元数据记录
//!
//! 两个文件都先写临时文件再 rename；两次写入之间崩溃会留下没有记录的孤立音频

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{CatalogError, CatalogScan, SkippedEntry, VoiceCatalogPort};
use crate::domain::voice::{SampleFormat, Username, VoiceRecord};

/// 元数据文件后缀
const METADATA_SUFFIX: &str = "_model.json";

/// 基于 JSON 文件的音色目录
pub struct JsonVoiceCatalog {
    /// 存储根目录
    base_dir: PathBuf,
}

impl JsonVoiceCatalog {
    /// 创建目录（不存在时自动创建）
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| CatalogError::IoError(format!("{}: {}", base_dir.display(), e)))?;

        Ok(Self { base_dir })
    }

    fn sample_path(&self, stem: &str, format: SampleFormat) -> PathBuf {
        self.base_dir.join(format!("{}.{}", stem, format.extension()))
    }

    fn metadata_path(&self, stem: &str) -> PathBuf {
        self.base_dir.join(format!("{}{}", stem, METADATA_SUFFIX))
    }

    fn is_metadata_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.ends_with(METADATA_SUFFIX) && !n.starts_with('.'))
    }

    /// 读取并解析元数据，不检查样本文件
    async fn parse_record(path: &Path) -> Result<VoiceRecord, CatalogError> {
        let data = fs::read(path)
            .await
            .map_err(|e| CatalogError::IoError(format!("{}: {}", path.display(), e)))?;

        let record: VoiceRecord =
            serde_json::from_slice(&data).map_err(|e| CatalogError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        record.validate().map_err(|e| CatalogError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(record)
    }

    async fn exists(path: &Path) -> Result<bool, CatalogError> {
        fs::try_exists(path)
            .await
            .map_err(|e| CatalogError::IoError(format!("{}: {}", path.display(), e)))
    }

    /// 解析元数据并确认样本文件仍然存在
    async fn load_record(path: &Path) -> Result<VoiceRecord, CatalogError> {
        let record = Self::parse_record(path).await?;

        if Self::exists(&record.sample_path).await? {
            Ok(record)
        } else {
            Err(CatalogError::MissingSample {
                username: record.username.clone(),
                path: record.sample_path.display().to_string(),
            })
        }
    }

    /// 先写同目录下的临时文件，再 rename 覆盖目标
    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CatalogError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CatalogError::IoError(format!("invalid path: {}", path.display())))?;
        let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp_path, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CatalogError::IoError(format!("{}: {}", path.display(), e)));
        }

        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CatalogError::IoError(format!("{}: {}", path.display(), e)));
        }

        Ok(())
    }
}

#[async_trait]
impl VoiceCatalogPort for JsonVoiceCatalog {
    async fn save(
        &self,
        username: &Username,
        sample: &[u8],
        format: SampleFormat,
    ) -> Result<VoiceRecord, CatalogError> {
        if sample.is_empty() {
            return Err(CatalogError::EmptySample);
        }

        let stem = username.file_stem();
        let metadata_path = self.metadata_path(&stem);
        let previous = if Self::exists(&metadata_path).await? {
            Self::parse_record(&metadata_path).await.ok()
        } else {
            None
        };

        let sample_path = self.sample_path(&stem, format);
        Self::write_atomic(&sample_path, sample).await?;

        let record = VoiceRecord::new(username, sample_path.clone());
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| CatalogError::IoError(format!("serialize record: {}", e)))?;
        Self::write_atomic(&metadata_path, &json).await?;

        // 重新训练且扩展名变化时，删除旧样本
        if let Some(previous) = previous {
            if previous.sample_path != sample_path && previous.sample_path.starts_with(&self.base_dir)
            {
                if let Err(e) = fs::remove_file(&previous.sample_path).await {
                    tracing::warn!(
                        path = %previous.sample_path.display(),
                        error = %e,
                        "Failed to remove replaced voice sample"
                    );
                }
            }
        }

        tracing::debug!(
            username = %username,
            sample = %sample_path.display(),
            size = sample.len(),
            "Saved voice record"
        );

        Ok(record)
    }

    async fn scan(&self) -> Result<CatalogScan, CatalogError> {
        let mut scan = CatalogScan::default();

        if !Self::exists(&self.base_dir).await? {
            return Ok(scan);
        }

        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| CatalogError::IoError(format!("{}: {}", self.base_dir.display(), e)))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CatalogError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if !Self::is_metadata_file(&path) {
                continue;
            }

            match Self::load_record(&path).await {
                Ok(record) => scan.records.push(record),
                Err(e) => scan.skipped.push(SkippedEntry {
                    path,
                    reason: e.to_string(),
                }),
            }
        }

        scan.records
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(scan)
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<VoiceRecord>, CatalogError> {
        let path = self.metadata_path(&username.file_stem());
        if !Self::exists(&path).await? {
            return Ok(None);
        }
        Self::load_record(&path).await.map(Some)
    }

    async fn read_sample(&self, record: &VoiceRecord) -> Result<Vec<u8>, CatalogError> {
        fs::read(&record.sample_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::MissingSample {
                    username: record.username.clone(),
                    path: record.sample_path.display().to_string(),
                }
            } else {
                CatalogError::IoError(format!("{}: {}", record.sample_path.display(), e))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::domain::voice::VoiceId;

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    /// 直接写入一条带固定时间戳的记录
    fn write_record(dir: &Path, username: &str, created_at: chrono::DateTime<Utc>) {
        let stem = name(username).file_stem();
        let sample_path = dir.join(format!("{}.wav", stem));
        std::fs::write(&sample_path, username.as_bytes()).unwrap();
        let record = VoiceRecord {
            id: VoiceId::new(),
            username: username.to_string(),
            sample_path,
            created_at,
        };
        std::fs::write(
            dir.join(format!("{}_model.json", stem)),
            serde_json::to_vec(&record).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_save_then_list_returns_sample() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();

        let record = catalog
            .save(&name("Anurag"), b"sample A", SampleFormat::Wav)
            .await
            .unwrap();
        assert_eq!(record.sample_path, temp_dir.path().join("Anurag.wav"));
        assert!(temp_dir.path().join("Anurag_model.json").exists());

        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].username, "Anurag");
        assert_eq!(all[0].sample_path, record.sample_path);
        assert_eq!(catalog.read_sample(&all[0]).await.unwrap(), b"sample A");
    }

    #[tokio::test]
    async fn test_resave_overwrites() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();

        for i in 0..3 {
            catalog
                .save(&name("Anurag"), format!("take {}", i).as_bytes(), SampleFormat::Wav)
                .await
                .unwrap();
            assert_eq!(catalog.list_all().await.unwrap().len(), 1);
        }

        let all = catalog.list_all().await.unwrap();
        assert_eq!(catalog.read_sample(&all[0]).await.unwrap(), b"take 2");
    }

    #[tokio::test]
    async fn test_resave_with_new_format_removes_old_sample() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();

        catalog
            .save(&name("Sakshi"), b"wav bytes", SampleFormat::Wav)
            .await
            .unwrap();
        catalog
            .save(&name("Sakshi"), b"mp3 bytes", SampleFormat::Mp3)
            .await
            .unwrap();

        assert!(!temp_dir.path().join("Sakshi.wav").exists());
        assert!(temp_dir.path().join("Sakshi.mp3").exists());
        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(catalog.read_sample(&all[0]).await.unwrap(), b"mp3 bytes");
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let temp_dir = tempdir().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        write_record(temp_dir.path(), "middle", base + Duration::days(1));
        write_record(temp_dir.path(), "oldest", base);
        write_record(temp_dir.path(), "newest", base + Duration::days(2));

        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();
        let names: Vec<String> = catalog
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(names, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn test_corrupt_records_are_skipped() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();
        catalog
            .save(&name("Anurag"), b"sample", SampleFormat::Wav)
            .await
            .unwrap();

        // 非 JSON
        std::fs::write(temp_dir.path().join("garbage_model.json"), b"\x80\x04pickle").unwrap();
        // 缺少字段
        std::fs::write(
            temp_dir.path().join("partial_model.json"),
            br#"{"username": "partial"}"#,
        )
        .unwrap();
        // 样本文件已不存在
        write_record(temp_dir.path(), "ghost", Utc::now());
        std::fs::remove_file(temp_dir.path().join("ghost.wav")).unwrap();

        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].username, "Anurag");

        let scan = catalog.scan().await.unwrap();
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.skipped.len(), 3);
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();
        catalog
            .save(&name("Sakshi K"), b"sample", SampleFormat::Flac)
            .await
            .unwrap();

        let found = catalog.find_by_username(&name("Sakshi K")).await.unwrap();
        assert_eq!(found.unwrap().username, "Sakshi K");
        assert!(catalog
            .find_by_username(&name("Nobody"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_username_reports_missing_sample() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();
        let record = catalog
            .save(&name("Anurag"), b"sample", SampleFormat::Wav)
            .await
            .unwrap();
        std::fs::remove_file(&record.sample_path).unwrap();

        let result = catalog.find_by_username(&name("Anurag")).await;
        assert!(matches!(result, Err(CatalogError::MissingSample { .. })));
    }

    #[tokio::test]
    async fn test_long_multibyte_username_fits_file_name_limit() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();
        let username = "语".repeat(70);

        let record = catalog
            .save(&name(&username), b"sample", SampleFormat::Wav)
            .await
            .unwrap();
        assert_eq!(record.username, username);

        let found = catalog.find_by_username(&name(&username)).await.unwrap();
        assert_eq!(found.unwrap().username, username);
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_path_unsafe_username_stays_inside_dir() {
        let temp_dir = tempdir().unwrap();
        let base = temp_dir.path().join("models");
        let catalog = JsonVoiceCatalog::new(&base).await.unwrap();

        let record = catalog
            .save(&name("../escape"), b"sample", SampleFormat::Wav)
            .await
            .unwrap();
        assert_eq!(record.sample_path.parent().unwrap(), base.as_path());
        assert_eq!(record.username, "../escape");
        assert!(!temp_dir.path().join("escape.wav").exists());
    }

    #[tokio::test]
    async fn test_empty_sample_rejected() {
        let temp_dir = tempdir().unwrap();
        let catalog = JsonVoiceCatalog::new(temp_dir.path()).await.unwrap();
        let result = catalog.save(&name("Anurag"), b"", SampleFormat::Wav).await;
        assert!(matches!(result, Err(CatalogError::EmptySample)));
    }

    #[tokio::test]
    async fn test_unwritable_storage_is_io_error() {
        let temp_dir = tempdir().unwrap();
        let base = temp_dir.path().join("models");
        let catalog = JsonVoiceCatalog::new(&base).await.unwrap();

        // 用普通文件替换目录
        std::fs::remove_dir(&base).unwrap();
        std::fs::write(&base, b"not a directory").unwrap();

        let result = catalog.save(&name("Anurag"), b"sample", SampleFormat::Wav).await;
        assert!(matches!(result, Err(CatalogError::IoError(_))));
    }
}
