use std::fs::Metadata;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The stat-field selector from `spec.md` §6, shared by `-newer`, `-mtime`/
/// `-atime`/`-ctime`, and `-fls`'s timestamp column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatField {
    Atime,
    Btime,
    Ctime,
    Mtime,
}

/// Extract `field` from `meta` at nanosecond precision
/// (`spec.md` §4.2/§8: `-newer`'s strict-greater-than comparison must hold
/// at nanosecond precision). `Ctime`/`Mtime`/`Atime` go through
/// `MetadataExt`'s raw (seconds, nanoseconds) pairs rather than
/// `Metadata::modified()`/`accessed()` so the conversion is exact and so
/// `ctime` (status-change time, which `std::fs::Metadata` otherwise has no
/// accessor for at all) is available uniformly alongside the other three.
pub fn stat_field_time(meta: &Metadata, field: StatField) -> io::Result<SystemTime> {
    let (secs, nanos) = match field {
        StatField::Atime => (meta.atime(), meta.atime_nsec()),
        StatField::Mtime => (meta.mtime(), meta.mtime_nsec()),
        StatField::Ctime => (meta.ctime(), meta.ctime_nsec()),
        StatField::Btime => return meta.created(),
    };
    Ok(epoch_time(secs, nanos))
}

fn epoch_time(secs: i64, nanos: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nanos as u32)
    } else {
        UNIX_EPOCH - Duration::new((-secs) as u64, 0) + Duration::new(0, nanos as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mtime_of_a_freshly_written_file_is_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        let mtime = stat_field_time(&meta, StatField::Mtime).unwrap();
        assert!(mtime.elapsed().unwrap() < Duration::from_secs(60));
    }
}
