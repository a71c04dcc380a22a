use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

fn fsync_dir(path: &Path) -> io::Result<()> {
    let dir = File::open(path)?;
    dir.sync_all()
}

fn sibling_tmp_path(dest: &Path) -> io::Result<PathBuf> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;

    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no filename"))?;

    let tmp_name = format!(
        ".{}.sync.{}",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    );
    Ok(parent.join(tmp_name))
}

/// Writes `bytes` to `dest` through a sibling temp file and a rename, so a
/// note or settings file is never observed half-written.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let tmp = sibling_tmp_path(dest)?;

    let written = (|| -> io::Result<()> {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()
    })();
    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }

    std::fs::rename(&tmp, dest)?;
    // Directory fsync is not supported everywhere (e.g. Windows).
    let _ = fsync_dir(parent);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_atomic;

    #[test]
    fn replaces_existing_file_without_leaving_temp_files() {
        let dir = std::env::temp_dir().join(format!("pp-atomic-{}", uuid::Uuid::new_v4()));
        let dest = dir.join("nested").join("note.md");

        write_atomic(&dest, b"first").expect("first write");
        write_atomic(&dest, b"second").expect("second write");

        assert_eq!(std::fs::read_to_string(&dest).expect("read back"), "second");
        let leftovers = std::fs::read_dir(dest.parent().expect("parent"))
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
