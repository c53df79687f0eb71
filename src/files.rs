// File helpers for the command line front end.

use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

pub const COMPRESSED_EXT: &str = "huff";
const TEMP_SUFFIX: &str = ".tmp"; // For atomic writes
const TEMP_ATTEMPTS: usize = 16;
const DECOMPRESSED_PREFIX: &str = "decompressed_";

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Read entire file into a Vec<u8>
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Writes `data` to a fresh sibling temp file, then moves it onto `path`.
///
/// Without `force` the temp file is hard-linked into place, which fails with
/// `AlreadyExists` instead of replacing a file created in the meantime. With
/// `force` it is renamed over `path`. The temp file never outlives the call.
pub fn write_atomic(path: &Path, data: &[u8], force: bool) -> io::Result<()> {
    let temp_path = create_temp(path, data)?;
    if force {
        let renamed = fs::rename(&temp_path, path);
        if renamed.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        return renamed;
    }
    let linked = fs::hard_link(&temp_path, path);
    let _ = fs::remove_file(&temp_path);
    linked.map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => already_exists(path),
        _ => e,
    })
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists (use --force to overwrite)", path.display()),
    )
}

/// Creates a new, uniquely named `.<name>.<pid>.<n>.tmp` next to `path`
/// holding `data`. Existing files are never opened.
fn create_temp(path: &Path, data: &[u8]) -> io::Result<PathBuf> {
    let name = path.file_name().unwrap_or_default();
    for _ in 0..TEMP_ATTEMPTS {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut temp_name = OsString::from(".");
        temp_name.push(name);
        temp_name.push(format!(".{}.{n}{TEMP_SUFFIX}", std::process::id()));
        let temp_path = path.with_file_name(temp_name);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };
        if let Err(e) = file.write_all(data).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        return Ok(temp_path);
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free temp file name next to {}", path.display()),
    ))
}

/// `notes.txt` -> `notes.txt.huff`
pub fn compressed_path(input: &Path) -> PathBuf {
    with_suffix(input, &format!(".{COMPRESSED_EXT}"))
}

/// `notes.txt.huff` -> `notes.txt`; anything else -> `decompressed_<name>`.
pub fn decompressed_path(input: &Path) -> PathBuf {
    let is_compressed = input
        .extension()
        .is_some_and(|ext| ext == COMPRESSED_EXT);
    if is_compressed {
        if let Some(stem) = input.file_stem() {
            return input.with_file_name(stem);
        }
    }
    let mut name = OsString::from(DECOMPRESSED_PREFIX);
    name.push(input.file_name().unwrap_or_default());
    input.with_file_name(name)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Format bytes into human-readable string (e.g. 1024 -> "1.00 KB")
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zipit-files-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn output_names_follow_extension() {
        assert_eq!(
            compressed_path(Path::new("dir/notes.txt")),
            PathBuf::from("dir/notes.txt.huff")
        );
        assert_eq!(
            decompressed_path(Path::new("dir/notes.txt.huff")),
            PathBuf::from("dir/notes.txt")
        );
        assert_eq!(
            decompressed_path(Path::new("dir/notes.bin")),
            PathBuf::from("dir/decompressed_notes.bin")
        );
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.50 MB");
    }

    #[test]
    fn atomic_write_refuses_to_clobber() {
        let path = scratch("clobber.bin");
        let _ = fs::remove_file(&path);

        write_atomic(&path, b"first", false).unwrap();
        let err = write_atomic(&path, b"second", false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(read_file(&path).unwrap(), b"first");

        write_atomic(&path, b"second", true).unwrap();
        assert_eq!(read_file(&path).unwrap(), b"second");
        fs::remove_file(&path).unwrap();
    }

    fn leftover_temps(dir: &Path, name: &str) -> Vec<PathBuf> {
        let prefix = format!(".{name}.");
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(TEMP_SUFFIX))
            })
            .collect()
    }

    #[test]
    fn atomic_write_leaves_unrelated_tmp_sibling_alone() {
        let path = scratch("sibling.bin");
        let sibling = with_suffix(&path, TEMP_SUFFIX);
        let _ = fs::remove_file(&path);
        fs::write(&sibling, b"someone else's file").unwrap();

        write_atomic(&path, b"payload", false).unwrap();
        write_atomic(&path, b"payload 2", true).unwrap();

        assert_eq!(read_file(&path).unwrap(), b"payload 2");
        assert_eq!(read_file(&sibling).unwrap(), b"someone else's file");
        let dir = path.parent().unwrap();
        assert!(leftover_temps(dir, "sibling.bin").is_empty());
        fs::remove_file(&path).unwrap();
        fs::remove_file(&sibling).unwrap();
    }

    #[test]
    fn failed_atomic_write_leaves_no_temp_file() {
        let path = scratch("refused.bin");
        fs::write(&path, b"keep").unwrap();

        let err = write_atomic(&path, b"new", false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let missing_dir = scratch("no-such-dir").join("out.bin");
        assert!(write_atomic(&missing_dir, b"new", true).is_err());

        assert_eq!(read_file(&path).unwrap(), b"keep");
        assert!(leftover_temps(path.parent().unwrap(), "refused.bin").is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn temp_names_are_unique_and_hidden() {
        let path = scratch("unique.bin");
        let first = create_temp(&path, b"a").unwrap();
        let second = create_temp(&path, b"b").unwrap();
        assert_ne!(first, second);
        for temp in [&first, &second] {
            let name = temp.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with(".unique.bin."), "{name}");
            assert!(name.ends_with(TEMP_SUFFIX), "{name}");
        }
        assert_eq!(read_file(&first).unwrap(), b"a");
        assert_eq!(read_file(&second).unwrap(), b"b");
        fs::remove_file(first).unwrap();
        fs::remove_file(second).unwrap();
    }
}
