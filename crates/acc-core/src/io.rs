use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// An interrupted write never leaves a truncated component file behind.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = staged(path, data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Like [`atomic_write`], but fails with `AlreadyExists` instead of replacing
/// a file that is already at `path`.
pub fn atomic_write_new(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = staged(path, data)?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `data` to a tempfile next to `path`. The tempfile takes the mode of
/// the file it replaces, or `0o666` less the umask when there is none.
fn staged(path: &Path, data: &[u8]) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Clear the write bits on a file.
pub fn set_readonly(path: &Path) -> io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(path, perms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn atomic_write_new_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        atomic_write_new(&path, b"first").unwrap();
        let err = atomic_write_new(&path, b"second").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn atomic_write_preserves_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crlf.md");
        let data = b"line one\r\nline two\r\n\xff\x00";
        atomic_write(&path, data).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn new_files_get_the_umask_default_mode() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("plain.md");
        std::fs::write(&reference, "x").unwrap();

        let written = dir.path().join("a.md");
        atomic_write_new(&written, b"x").unwrap();
        let replaced = dir.path().join("b.md");
        atomic_write(&replaced, b"x").unwrap();

        assert_eq!(mode(&written), mode(&reference));
        assert_eq!(mode(&replaced), mode(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        atomic_write(&path, b"new").unwrap();
        assert_eq!(mode(&path), 0o640);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn set_readonly_marks_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ro.md");
        std::fs::write(&path, "x").unwrap();
        set_readonly(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().permissions().readonly());
    }
}
