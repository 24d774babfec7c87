//! The file system seen by the bundler.
//!
//! Everything that touches disk goes through [FileSystem], so a build can run
//! against [OsFileSystem] or an in-memory tree in tests.

use std::{
  fmt::Debug,
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

mod memory;
pub use memory::MemoryFileSystem;

pub trait FileSystem: Debug + Send + Sync {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

  fn is_file(&self, path: &Path) -> bool;

  fn is_dir(&self, path: &Path) -> bool;

  fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let bytes = self.read(path)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
  }
}

pub type SharedFileSystem = Arc<dyn FileSystem>;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
  pub fn new_shared() -> SharedFileSystem {
    Arc::new(Self)
  }
}

impl FileSystem for OsFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    std::fs::write(path, content)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
  }
}

pub(crate) fn normalized(path: &Path) -> PathBuf {
  use sugar_path::SugarPath;
  path.normalize()
}
