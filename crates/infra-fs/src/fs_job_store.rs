// Filesystem JobStore Implementation
//
// Layout under the data directory:
//   <id>.config.json   job record (circuit + run configuration)
//   <id>.running       marker written when the worker starts the job
//   <id>.result.json   terminal result, created exactly once

use crate::atomic_write::{write_atomic, write_new_atomic};
use async_trait::async_trait;
use qjob_core::domain::{is_valid_job_id, JobId, JobRecord, ResultRecord};
use qjob_core::error::{AppError, Result};
use qjob_core::port::{JobStore, UnfinishedJob};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const CONFIG_SUFFIX: &str = ".config.json";
const RESULT_SUFFIX: &str = ".result.json";
const RUNNING_SUFFIX: &str = ".running";

#[derive(Debug, Serialize, Deserialize)]
struct RunningMarker {
    started_at: i64,
}

/// Disk-backed job store. Every call goes to the filesystem; nothing is cached.
pub struct FsJobStore {
    data_dir: PathBuf,
}

impl FsJobStore {
    /// Open a store rooted at `data_dir`, creating the directory if absent
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "cannot create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;
        debug!(data_dir = %data_dir.display(), "Job store opened");
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, id: &str, suffix: &str) -> Result<PathBuf> {
        if !is_valid_job_id(id) {
            return Err(AppError::Validation(format!("invalid job id '{}'", id)));
        }
        Ok(self.data_dir.join(format!("{}{}", id, suffix)))
    }

    /// Read and parse a JSON file, `None` if it does not exist
    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn exists(path: &Path) -> Result<bool> {
        Ok(fs::try_exists(path).await?)
    }
}

#[async_trait]
impl JobStore for FsJobStore {
    async fn put_input(&self, record: &JobRecord) -> Result<()> {
        let path = self.path(&record.id, CONFIG_SUFFIX)?;
        let json = serde_json::to_vec_pretty(record)?;
        write_atomic(&path, &json).await?;
        Ok(())
    }

    async fn load_input(&self, id: &JobId) -> Result<Option<JobRecord>> {
        if !is_valid_job_id(id) {
            return Ok(None);
        }
        Self::read_json(&self.path(id, CONFIG_SUFFIX)?).await
    }

    async fn mark_running(&self, id: &JobId, started_at: i64) -> Result<()> {
        let path = self.path(id, RUNNING_SUFFIX)?;
        let json = serde_json::to_vec(&RunningMarker { started_at })?;
        write_atomic(&path, &json).await?;
        Ok(())
    }

    async fn put_result(&self, id: &JobId, result: &ResultRecord) -> Result<()> {
        let path = self.path(id, RESULT_SUFFIX)?;
        let json = serde_json::to_vec_pretty(result)?;
        match write_new_atomic(&path, &json).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(AppError::Conflict(
                format!("job {} already has a result", id),
            )),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn load_result(&self, id: &JobId) -> Result<Option<ResultRecord>> {
        if !is_valid_job_id(id) {
            return Ok(None);
        }
        Self::read_json(&self.path(id, RESULT_SUFFIX)?).await
    }

    async fn list_unfinished(&self) -> Result<Vec<UnfinishedJob>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(id) = name.strip_suffix(CONFIG_SUFFIX) else {
                continue;
            };
            if !is_valid_job_id(id) {
                continue;
            }
            if Self::exists(&self.path(id, RESULT_SUFFIX)?).await? {
                continue;
            }

            let record: JobRecord = match Self::read_json(&entry.path()).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(file = %name, error = %e, "Skipping unreadable job file");
                    continue;
                }
            };
            let was_running = Self::exists(&self.path(id, RUNNING_SUFFIX)?).await?;
            jobs.push(UnfinishedJob {
                record,
                was_running,
            });
        }

        jobs.sort_by_key(|job| job.record.submission_order());
        Ok(jobs)
    }
}
