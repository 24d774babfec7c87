use std::{
  ffi::OsStr,
  path::{Component, Path, PathBuf},
  time::Duration,
};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Events arriving this soon after a change are folded into one rebuild.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Recursive watcher over the project directories. Changes inside ignored
/// paths, `.git` and editor temporary files do not trigger a rebuild.
pub(crate) struct ChangeWatcher {
  watcher: RecommendedWatcher,
  rx: UnboundedReceiver<notify::Result<Event>>,
  ignored_paths: Vec<PathBuf>,
}

impl ChangeWatcher {
  pub(crate) fn new() -> notify::Result<Self> {
    let (tx, rx) = unbounded_channel();
    let watcher = RecommendedWatcher::new(
      move |res| {
        let _ = tx.send(res);
      },
      Config::default(),
    )?;
    Ok(Self {
      watcher,
      rx,
      ignored_paths: vec![],
    })
  }

  pub(crate) fn watch(&mut self, path: &Path) -> notify::Result<()> {
    tracing::debug!("Watching {}", path.display());
    self.watcher.watch(path, RecursiveMode::Recursive)
  }

  pub(crate) fn ignore(&mut self, path: PathBuf) {
    if !self.ignored_paths.contains(&path) {
      self.ignored_paths.push(path);
    }
  }

  fn is_relevant(&self, event: &Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
      && event
        .paths
        .iter()
        .any(|path| !is_ignored(&self.ignored_paths, path))
  }

  /// The paths of the next batch of changes. `None` once the watcher is gone.
  pub(crate) async fn next_change(&mut self) -> Option<Vec<PathBuf>> {
    loop {
      match self.rx.recv().await? {
        Ok(event) if self.is_relevant(&event) => {
          let mut paths = event.paths;
          tokio::time::sleep(DEBOUNCE).await;
          while let Ok(res) = self.rx.try_recv() {
            if let Ok(event) = res {
              if self.is_relevant(&event) {
                paths.extend(event.paths);
              }
            }
          }
          paths.sort();
          paths.dedup();
          return Some(paths);
        }
        Ok(_) => {}
        Err(err) => tracing::warn!("Watch error: {err}"),
      }
    }
  }
}

fn is_ignored(ignored_paths: &[PathBuf], path: &Path) -> bool {
  if path
    .file_name()
    .and_then(|name| name.to_str())
    .map_or(false, is_temporary_file)
  {
    return true;
  }
  if path
    .components()
    .any(|c| c == Component::Normal(OsStr::new(".git")))
  {
    return true;
  }
  ignored_paths.iter().any(|ignored| path.starts_with(ignored))
}

fn is_temporary_file(file_name: &str) -> bool {
  // Vim swap files and backups
  if file_name.ends_with('~')
    || file_name.ends_with(".swp")
    || file_name.ends_with(".swo")
    || file_name.ends_with(".swx")
  {
    return true;
  }
  // Emacs auto-save
  if file_name.starts_with('#') && file_name.ends_with('#') {
    return true;
  }
  // JetBrains safe write
  if file_name.ends_with("___jb_tmp___") || file_name.ends_with("___jb_old___") {
    return true;
  }
  file_name.starts_with(".~")
    || file_name.ends_with(".tmp")
    || file_name.ends_with(".bak")
}
