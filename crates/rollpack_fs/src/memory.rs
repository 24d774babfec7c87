use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{normalized, FileSystem, SharedFileSystem};

/// An in-memory file tree. Directories are implied by the files they contain.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
  files: RwLock<FxHashMap<PathBuf, Vec<u8>>>,
  dirs: RwLock<FxHashSet<PathBuf>>,
}

impl MemoryFileSystem {
  pub fn new(files: &[(&str, &str)]) -> Self {
    let fs = Self::default();
    files.iter().for_each(|(path, content)| {
      fs.add_file(Path::new(path), content.as_bytes().to_vec());
    });
    fs
  }

  pub fn into_shared(self) -> SharedFileSystem {
    Arc::new(self)
  }

  pub fn add_file(&self, path: &Path, content: impl Into<Vec<u8>>) {
    let path = normalized(path);
    self.register_ancestors(&path);
    self.files.write().insert(path, content.into());
  }

  pub fn remove_file(&self, path: &Path) -> Option<Vec<u8>> {
    self.files.write().remove(&normalized(path))
  }

  pub fn file_paths(&self) -> Vec<PathBuf> {
    let mut paths = self.files.read().keys().cloned().collect::<Vec<_>>();
    paths.sort();
    paths
  }

  fn register_ancestors(&self, path: &Path) {
    let mut dirs = self.dirs.write();
    path.ancestors().skip(1).for_each(|dir| {
      dirs.insert(dir.to_path_buf());
    });
  }
}

impl FileSystem for MemoryFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    self
      .files
      .read()
      .get(&normalized(path))
      .cloned()
      .ok_or_else(|| {
        io::Error::new(
          io::ErrorKind::NotFound,
          format!("No such file: {}", path.display()),
        )
      })
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    self.add_file(path, content.to_vec());
    Ok(())
  }

  fn is_file(&self, path: &Path) -> bool {
    self.files.read().contains_key(&normalized(path))
  }

  fn is_dir(&self, path: &Path) -> bool {
    self.dirs.read().contains(&normalized(path))
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    let path = normalized(path);
    let mut dirs = self.dirs.write();
    path.ancestors().for_each(|dir| {
      dirs.insert(dir.to_path_buf());
    });
    Ok(())
  }
}
