//! Recurring automatic backups
//!
//! A background thread wakes every interval and snapshots the live set if it
//! changed since the newest snapshot. A shared flag keeps a slow backup from
//! overlapping the next tick or a manual [`AutoBackupScheduler::run_now`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::JobsafeResult;
use crate::models::{BackupMetadata, BackupType};

use super::manager::BackupManager;

/// Description given to scheduled snapshots
pub const AUTO_BACKUP_DESCRIPTION: &str = "Automatic backup";

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Created(BackupMetadata),
    /// Live set identical to the newest snapshot
    Unchanged,
    /// Another backup was still running
    Skipped,
}

/// Runs one guarded tick
fn tick(manager: &BackupManager, in_progress: &AtomicBool) -> JobsafeResult<TickOutcome> {
    if in_progress
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        debug!("auto-backup tick skipped, previous backup still running");
        return Ok(TickOutcome::Skipped);
    }

    let result = backup_if_changed(manager);
    in_progress.store(false, Ordering::Release);
    result
}

fn backup_if_changed(manager: &BackupManager) -> JobsafeResult<TickOutcome> {
    let live = manager.load_applications()?;

    let unchanged = match manager.latest_backup()? {
        None => live.is_empty(),
        Some(latest) => match manager.load_snapshot(&latest.id) {
            Ok(snapshot) => snapshot.applications == live,
            Err(e) => {
                warn!(id = %latest.id, error = %e, "newest backup unreadable, taking a fresh one");
                false
            }
        },
    };
    if unchanged {
        return Ok(TickOutcome::Unchanged);
    }

    let metadata = manager.create_backup(
        &live,
        AUTO_BACKUP_DESCRIPTION,
        BackupType::Automatic,
        Vec::new(),
    )?;
    Ok(TickOutcome::Created(metadata))
}

/// Background thread taking automatic backups
pub struct AutoBackupScheduler {
    manager: Arc<BackupManager>,
    in_progress: Arc<AtomicBool>,
    created: Arc<AtomicU64>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl AutoBackupScheduler {
    /// Start ticking every `interval`
    ///
    /// With `max_ticks` the thread exits on its own after that many ticks.
    pub fn start(manager: Arc<BackupManager>, interval: Duration, max_ticks: Option<u64>) -> Self {
        let in_progress = Arc::new(AtomicBool::new(false));
        let created = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = {
            let manager = Arc::clone(&manager);
            let in_progress = Arc::clone(&in_progress);
            let created = Arc::clone(&created);
            thread::spawn(move || {
                let mut ticks = 0u64;
                loop {
                    if max_ticks.is_some_and(|max| ticks >= max) {
                        break;
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    ticks += 1;

                    match tick(&manager, &in_progress) {
                        Ok(TickOutcome::Created(meta)) => {
                            created.fetch_add(1, Ordering::Relaxed);
                            info!(id = %meta.id, "automatic backup created");
                        }
                        Ok(outcome) => debug!(?outcome, "automatic backup not needed"),
                        Err(e) => warn!(error = %e, "automatic backup failed"),
                    }
                }
            })
        };

        info!(interval_secs = interval.as_secs_f64(), "auto-backup scheduler started");

        Self {
            manager,
            in_progress,
            created,
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Tick immediately on the calling thread, sharing the overlap guard
    pub fn run_now(&self) -> JobsafeResult<TickOutcome> {
        let outcome = tick(&self.manager, &self.in_progress)?;
        if matches!(outcome, TickOutcome::Created(_)) {
            self.created.fetch_add(1, Ordering::Relaxed);
        }
        Ok(outcome)
    }

    /// Backups created so far by this scheduler
    pub fn backups_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Block until a tick-limited scheduler finishes
    ///
    /// Returns the number of backups it created.
    pub fn wait(mut self) -> u64 {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("auto-backup thread panicked");
            }
        }
        self.backups_created()
    }

    /// Stop ticking and join the thread
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("auto-backup thread panicked");
            }
            info!("auto-backup scheduler stopped");
        }
    }
}

impl Drop for AutoBackupScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
