use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::Path,
};

use anyhow::{Context, Error};

/// Creates a file and all parent directories if they don't exist
pub fn create_file<S>(path: S) -> Result<File, Error>
where
    S: AsRef<Path>,
{
    if let Some(parent) = path.as_ref().parent() {
        create_dirs(parent)?;
    }

    std::fs::File::create(path.as_ref()).context(format!(
        "Could not create file: {}",
        path.as_ref().display()
    ))
}

/// Creates all directories in a path if they don't exist
pub fn create_dirs<S>(path: S) -> Result<(), Error>
where
    S: AsRef<Path>,
{
    std::fs::create_dir_all(path.as_ref()).context(format!(
        "Could not create path: {}",
        path.as_ref().display()
    ))
}

/// Replaces the contents of a file, creating it and its parents as needed.
/// The contents are written to a sibling temporary file first and renamed
/// into place, so readers never observe a partially written file.
pub fn replace_file<S>(path: S, contents: &[u8]) -> Result<(), Error>
where
    S: AsRef<Path>,
{
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dirs(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .context(format!("Failed to create temporary file in {}", parent.display()))?;
    temp.write_all(contents)
        .context(format!("Could not write to file: {}", temp.path().display()))?;
    temp.as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;
    temp.persist(path)
        .context(format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Removes a file. Returns whether there was a file to remove.
pub fn remove_file_if_exists<S>(path: S) -> Result<bool, Error>
where
    S: AsRef<Path>,
{
    match std::fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).context(format!(
            "Failed to remove file: {}",
            path.as_ref().display()
        )),
    }
}

/// Writes a value to an existing kernel attribute file (sysfs style). The
/// file is never created or truncated.
pub fn write_attribute<S>(path: S, value: &str) -> Result<(), Error>
where
    S: AsRef<Path>,
{
    let mut file = OpenOptions::new()
        .write(true)
        .open(path.as_ref())
        .context(format!(
            "Could not open attribute: {}",
            path.as_ref().display()
        ))?;

    file.write_all(value.as_bytes()).context(format!(
        "Could not write to attribute: {}",
        path.as_ref().display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        create_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_replace_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.result");

        replace_file(&path, b"first run with a much longer body").unwrap();
        replace_file(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        // Only the target remains, no temporary siblings.
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.result");
        assert!(!remove_file_if_exists(&path).unwrap());

        std::fs::write(&path, "old").unwrap();
        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!path.exists());

        // A directory cannot be removed as a file.
        remove_file_if_exists(dir.path()).unwrap_err();
    }

    #[test]
    fn test_write_attribute() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("remove");
        write_attribute(&path, "1").unwrap_err();
        assert!(!path.exists(), "Attribute must not be created");

        std::fs::write(&path, "").unwrap();
        write_attribute(&path, "1").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1");
    }
}
