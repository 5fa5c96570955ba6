use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// How the current process is relaunched and terminated
pub trait ProcessControl: Send + Sync {
    /// Start a new instance of the current executable with the same arguments
    fn spawn_replacement(&self) -> std::io::Result<()>;

    /// Terminate the current process with a success status
    fn exit(&self);
}

/// Relaunches `current_exe` and calls `std::process::exit(0)`
pub struct CurrentProcess;

impl ProcessControl for CurrentProcess {
    fn spawn_replacement(&self) -> std::io::Result<()> {
        let exe = std::env::current_exe()?;
        let args: Vec<_> = std::env::args_os().skip(1).collect();
        let child = Command::new(&exe).args(&args).spawn()?;
        info!(pid = child.id(), "Started {}", exe.display());
        Ok(())
    }

    fn exit(&self) {
        std::process::exit(0);
    }
}

/// Leaves the process running; used when the host restarts on its own
pub struct NoRestart;

impl ProcessControl for NoRestart {
    fn spawn_replacement(&self) -> std::io::Result<()> {
        info!("Restart disabled, updates will be applied on next start");
        Ok(())
    }

    fn exit(&self) {}
}

/// Coalesces every restart request of one check cycle into a single relaunch.
///
/// A cycle lasts as long as the coordinator; `Updater::start` builds a new one.
pub struct RestartCoordinator {
    process: Arc<dyn ProcessControl>,
    pending: AtomicBool,
    restarted: AtomicBool,
}

impl RestartCoordinator {
    pub fn new(process: Arc<dyn ProcessControl>) -> Self {
        Self {
            process,
            pending: AtomicBool::new(false),
            restarted: AtomicBool::new(false),
        }
    }

    /// Record that an update was queued during this cycle
    pub fn mark_pending(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn has_restarted(&self) -> bool {
        self.restarted.load(Ordering::SeqCst)
    }

    /// Relaunch and exit, at most once. Returns `false` if already done.
    ///
    /// A failed relaunch is logged and the process exits anyway; the queued
    /// updates are then applied on the next manual start.
    pub fn restart_process_and_exit(&self) -> bool {
        if self
            .restarted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        info!("Updates pending. Restarting to apply updates...");
        if let Err(e) = self.process.spawn_replacement() {
            error!("Failed to restart: {}", e);
        }
        self.process.exit();
        true
    }
}
