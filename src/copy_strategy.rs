use std::fs;
#[cfg(not(windows))]
use std::fs::File;
#[cfg(windows)]
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::platform::PlatformFamily;

/// What a strategy did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Unchanged,
}

/// How a single matched file is brought over to its destination.
pub trait CopyStrategy {
    fn kind(&self) -> StrategyKind;

    /// `to`'s parent directory already exists when this is called.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<CopyOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Overwrite,
    Sync,
}

impl StrategyKind {
    pub fn for_family(family: PlatformFamily) -> Self {
        match family {
            PlatformFamily::Windows => StrategyKind::Overwrite,
            PlatformFamily::Posix => StrategyKind::Sync,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Overwrite => "overwrite",
            StrategyKind::Sync => "sync",
        }
    }

    pub fn into_strategy(self) -> Box<dyn CopyStrategy> {
        match self {
            StrategyKind::Overwrite => Box::new(OverwriteCopy),
            StrategyKind::Sync => Box::new(SyncCopy),
        }
    }
}

/// Always copies, replacing whatever is at the destination, read-only files
/// included.
#[derive(Debug, Default)]
pub struct OverwriteCopy;

impl CopyStrategy for OverwriteCopy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Overwrite
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<CopyOutcome> {
        clear_readonly(to)?;
        fs::copy(from, to)?;
        Ok(CopyOutcome::Copied)
    }
}

/// Copies only when the destination is missing or differs in size or
/// modification time, then stamps the source's mtime onto the copy so the
/// next run sees it as current.
#[derive(Debug, Default)]
pub struct SyncCopy;

impl CopyStrategy for SyncCopy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sync
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<CopyOutcome> {
        let source_meta = fs::metadata(from)?;
        let source_mtime = source_meta.modified()?;

        if let Ok(dest_meta) = fs::metadata(to) {
            let same_size = dest_meta.len() == source_meta.len();
            let same_mtime = dest_meta.modified().ok() == Some(source_mtime);
            if dest_meta.is_file() && same_size && same_mtime {
                return Ok(CopyOutcome::Unchanged);
            }
        }

        clear_readonly(to)?;
        fs::copy(from, to)?;
        set_mtime(to, source_mtime)?;

        Ok(CopyOutcome::Copied)
    }
}

fn clear_readonly(path: &Path) -> io::Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let mut permissions = meta.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(windows)]
fn set_mtime(path: &Path, mtime: SystemTime) -> io::Result<()> {
    use std::os::windows::fs::OpenOptionsExt;

    // FILE_WRITE_ATTRIBUTES is granted on read-only files, GENERIC_WRITE is not
    const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;

    let file = OpenOptions::new()
        .access_mode(FILE_WRITE_ATTRIBUTES)
        .open(path)?;
    file.set_modified(mtime)
}

#[cfg(not(windows))]
fn set_mtime(path: &Path, mtime: SystemTime) -> io::Result<()> {
    File::open(path)?.set_modified(mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn age(path: &Path, secs: u64) {
        let mtime = SystemTime::now() - Duration::from_secs(secs);
        set_mtime(path, mtime).unwrap();
    }

    #[test]
    fn test_strategy_for_family() {
        assert_eq!(StrategyKind::for_family(PlatformFamily::Windows), StrategyKind::Overwrite);
        assert_eq!(StrategyKind::for_family(PlatformFamily::Posix), StrategyKind::Sync);
        assert_eq!(StrategyKind::Sync.into_strategy().kind(), StrategyKind::Sync);
    }

    #[test]
    fn test_sync_copy_skips_current_files() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("Core.h");
        let to = temp.path().join("Core.copy.h");
        fs::write(&from, "#pragma once\n").unwrap();
        age(&from, 3600);

        assert_eq!(SyncCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Copied);
        assert_eq!(
            fs::metadata(&to).unwrap().modified().unwrap(),
            fs::metadata(&from).unwrap().modified().unwrap()
        );
        assert_eq!(SyncCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Unchanged);
    }

    #[test]
    fn test_sync_copy_updates_changed_files() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("Core.h");
        let to = temp.path().join("Core.copy.h");
        fs::write(&from, "v1").unwrap();
        age(&from, 3600);
        SyncCopy.copy_file(&from, &to).unwrap();

        fs::write(&from, "version 2").unwrap();
        assert_eq!(SyncCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Copied);
        assert_eq!(fs::read_to_string(&to).unwrap(), "version 2");
    }

    #[test]
    fn test_overwrite_copy_always_copies() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("guide.txt");
        let to = temp.path().join("guide.copy.txt");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "old").unwrap();

        let mut permissions = fs::metadata(&to).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&to, permissions).unwrap();

        assert_eq!(OverwriteCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Copied);
        assert_eq!(OverwriteCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Copied);
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");
    }

    #[cfg(windows)]
    #[test]
    fn test_sync_copy_handles_readonly_sources() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("Platform.h");
        let to = temp.path().join("Platform.copy.h");
        fs::write(&from, "#pragma once\n").unwrap();
        age(&from, 3600);

        let mut permissions = fs::metadata(&from).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&from, permissions).unwrap();

        assert_eq!(SyncCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Copied);
        assert!(fs::metadata(&to).unwrap().permissions().readonly());
        assert_eq!(SyncCopy.copy_file(&from, &to).unwrap(), CopyOutcome::Unchanged);
    }
}
