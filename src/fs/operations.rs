use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

/// Reads the whole file under a shared lock. A missing file is reported as [None] instead of an
/// error.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    file.lock_shared()?;
    let mut contents = String::new();
    let result = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    result?;

    Ok(Some(contents))
}

/// Replaces the contents of a file with `update(current)` while holding an exclusive lock. The
/// file is created when missing, in which case `update` receives an empty string.
///
/// New contents go to a sibling temp file that is renamed over the original, so an interrupted
/// rewrite leaves either the old or the new contents in place.
pub async fn rewrite_locked(
    path: &Path,
    update: impl FnOnce(&str) -> String,
) -> Result<(), io::Error> {
    let mut file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = rewrite_with_file(&mut file, path, update).await;
    file.unlock_async().await?;
    result
}

/// `usage.csv` becomes `usage.csv.tmp` in the same directory, so the rename stays on one
/// filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn rewrite_with_file(
    file: &mut File,
    path: &Path,
    update: impl FnOnce(&str) -> String,
) -> Result<(), io::Error> {
    let mut current = String::new();
    file.read_to_string(&mut current).await?;

    let next = update(&current);
    let temp = temp_path(path);
    debug!("Rewriting {path:?} with {} bytes through {temp:?}", next.len());

    let mut temp_file = File::create(&temp).await?;
    temp_file.write_all(next.as_bytes()).await?;
    temp_file.sync_all().await?;
    drop(temp_file);

    tokio::fs::rename(&temp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{read_locked, rewrite_locked, temp_path};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("missing.csv")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_rewrite_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("new.csv");

        rewrite_locked(&path, |current| {
            assert!(current.is_empty());
            "hello\n".to_string()
        })
        .await?;

        assert_eq!(read_locked(&path).await?.as_deref(), Some("hello\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rewrite_shrinks_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("shrink.csv");
        std::fs::write(&path, "a much longer line than the replacement\nsecond\n")?;

        rewrite_locked(&path, |current| {
            assert!(current.starts_with("a much longer"));
            "short\n".to_string()
        })
        .await?;

        assert_eq!(std::fs::read_to_string(&path)?, "short\n");
        assert!(!temp_path(&path).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_leftover_temp_file_is_ignored() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("usage.csv");
        std::fs::write(&path, "old\n")?;
        std::fs::write(temp_path(&path), "half written garb")?;

        rewrite_locked(&path, |current| {
            assert_eq!(current, "old\n");
            "new\n".to_string()
        })
        .await?;

        assert_eq!(std::fs::read_to_string(&path)?, "new\n");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dropped_rewrite_never_empties_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("usage.csv");
        let old = "Date,Total Time\n2024-01-01,0:05:00\n";
        let new = "Date,Total Time\n2024-01-01,0:06:00\n";

        for attempt in 0..20u64 {
            std::fs::write(&path, old)?;
            // Cut the rewrite off at a different point every time.
            let _ = tokio::time::timeout(
                Duration::from_micros(attempt * 50),
                rewrite_locked(&path, |_| new.to_string()),
            )
            .await;
            // Let any blocking io that was already in flight settle.
            tokio::time::sleep(Duration::from_millis(20)).await;

            let contents = std::fs::read_to_string(&path)?;
            assert!(contents == old || contents == new, "got {contents:?}");
        }
        Ok(())
    }
}
