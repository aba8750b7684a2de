// src/logging/rolling.rs
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Size-capped log file that rotates `app.log` → `app.log.1` → … →
/// `app.log.{count-1}`, discarding the oldest.
///
/// Clones share the same file, so this can be handed to `fmt::layer()` as a
/// `MakeWriter` closure.
#[derive(Clone, Debug)]
pub struct RollingFileWriter {
    inner: Arc<Mutex<RollingFile>>,
}

#[derive(Debug)]
struct RollingFile {
    path: PathBuf,
    limit_bytes: u64,
    count: u32,
    file: File,
    written: u64,
}

impl RollingFileWriter {
    /// Opens (appending to) `path`, creating parent directories as needed.
    pub fn open(path: &Path, limit_bytes: u64, count: u32) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(RollingFile {
                path: path.to_path_buf(),
                limit_bytes,
                count: count.max(1),
                file,
                written,
            })),
        })
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.file.flush()
    }
}

impl RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if self.written > 0 && self.written + len > self.limit_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += len;
        Ok(buf.len())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.count > 1 {
            remove_if_exists(&self.rotated_path(self.count - 1))?;
            for index in (1..self.count - 1).rev() {
                rename_if_exists(&self.rotated_path(index), &self.rotated_path(index + 1))?;
            }
            rename_if_exists(&self.path, &self.rotated_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn rotated_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
