//! Configuration file watcher for hot reload.
//!
//! The watch is registered on the directory holding the config file, not
//! the file itself: editors that write a temp file and rename it over the
//! original would strand a watch on the old inode. Events are filtered
//! back down to the config file by name before a reload is attempted.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ApiConfig;

/// Fallback poll cadence for platforms without native change events.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Pushes a freshly loaded `ApiConfig` whenever the watched file changes
/// and still parses and validates.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ApiConfig>,
}

impl ConfigWatcher {
    /// Pair a watcher for `path` with the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ApiConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Register with the OS notifier and start reloading on changes.
    ///
    /// The returned handle must stay alive for events to keep flowing;
    /// dropping it unregisters the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name: OsString = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        let watch_root = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let path = self.path.clone();
        let tx = self.update_tx;
        let mut watcher = RecommendedWatcher::new(
            move |outcome: notify::Result<Event>| {
                let event = match outcome {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!("Watch error: {:?}", e);
                        return;
                    }
                };
                if !is_config_change(&event, &file_name) {
                    return;
                }
                tracing::info!("Config file change detected, reloading...");
                match load_config(&path) {
                    Ok(new_config) => {
                        let _ = tx.send(new_config);
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to reload config: {}. Keeping current configuration.",
                            e
                        );
                    }
                }
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;

        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, root = ?watch_root, "Config watcher started");
        Ok(watcher)
    }
}

/// Whether a directory event is a write to the config file itself.
/// Rename-over arrives as a modify, so it reloads; reads, removals and
/// sibling files (editor temp files, the SQLite db) do not.
fn is_config_change(event: &Event, file_name: &OsStr) -> bool {
    if file_name.is_empty() {
        return false;
    }
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use notify::event::{
        AccessKind, CreateKind, DataChange, Event, EventKind, ModifyKind, RemoveKind, RenameMode,
    };

    use super::is_config_change;

    fn config_name() -> OsString {
        OsString::from("waitlist.toml")
    }

    #[test]
    fn test_write_to_the_config_file_is_a_change() {
        let written = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/etc/waitlist/waitlist.toml"));
        assert!(is_config_change(&written, &config_name()));

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/waitlist/waitlist.toml"));
        assert!(is_config_change(&created, &config_name()));
    }

    #[test]
    fn test_rename_over_the_config_file_is_a_change() {
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(PathBuf::from("/etc/waitlist/waitlist.toml"));
        assert!(is_config_change(&renamed, &config_name()));
    }

    #[test]
    fn test_sibling_files_in_the_directory_are_ignored() {
        let temp_file = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/etc/waitlist/.waitlist.toml.swp"));
        assert!(!is_config_change(&temp_file, &config_name()));

        let database = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/etc/waitlist/waitlist.db"));
        assert!(!is_config_change(&database, &config_name()));
    }

    #[test]
    fn test_reads_and_removals_are_ignored() {
        let read = Event::new(EventKind::Access(AccessKind::Read))
            .add_path(PathBuf::from("/etc/waitlist/waitlist.toml"));
        assert!(!is_config_change(&read, &config_name()));

        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/etc/waitlist/waitlist.toml"));
        assert!(!is_config_change(&removed, &config_name()));
    }
}
