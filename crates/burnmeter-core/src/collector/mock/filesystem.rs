//! In-memory mock filesystem for testing samplers without real `/proc` or
//! `/sys/fs/cgroup`.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// In-memory filesystem for testing.
///
/// Besides static files, a path can hold a sequence of contents: every read
/// consumes the front entry until only the last one remains, which is then
/// returned forever. This is how tests model a cumulative counter that moves
/// between the "before" and "after" samples.
#[derive(Debug, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Per-read content sequences, consulted before `files`.
    sequences: Mutex<HashMap<PathBuf, VecDeque<String>>>,
    /// Set of directories.
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds a file whose content changes on each read.
    pub fn add_file_sequence<I, S>(&mut self, path: impl AsRef<Path>, contents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        let queue: VecDeque<String> = contents.into_iter().map(Into::into).collect();
        self.sequences
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, queue);
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds `/proc/[pid]/cgroup` with the given membership lines.
    pub fn add_process_cgroup(&mut self, proc_path: &str, pid: u32, content: &str) {
        let path = PathBuf::from(proc_path).join(pid.to_string()).join("cgroup");
        self.add_file(path, content);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    fn next_in_sequence(&self, path: &Path) -> Option<String> {
        let mut sequences = self.sequences.lock().unwrap_or_else(|e| e.into_inner());
        let queue = sequences.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if let Some(content) = self.next_in_sequence(path) {
            return Ok(content);
        }
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self
                .sequences
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .contains_key(path)
    }
}
