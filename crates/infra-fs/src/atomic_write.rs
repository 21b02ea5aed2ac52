// Atomic file writes: temp file in the same directory, then link/rename

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

async fn write_temp(target: &Path, contents: &[u8]) -> io::Result<PathBuf> {
    let tmp = temp_path(target);
    let mut file = fs::File::create(&tmp).await?;
    let written: io::Result<()> = async {
        file.write_all(contents).await?;
        file.sync_all().await
    }
    .await;
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(tmp)
}

/// Replace `target` with `contents`. Readers see the old file or the new one.
pub async fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = write_temp(target, contents).await?;
    if let Err(e) = fs::rename(&tmp, target).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Create `target` with `contents`, failing with `AlreadyExists` if it is
/// already there. Readers never see a partial file.
pub async fn write_new_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = write_temp(target, contents).await?;
    // hard_link refuses to replace an existing name
    let linked = fs::hard_link(&tmp, target).await;
    let _ = fs::remove_file(&tmp).await;
    linked
}
