pub mod cache;
pub mod checker;
pub mod github;
pub mod installer;
pub mod restart;
pub mod transport;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::events::{RegistrationEvents, Subscription};
use crate::models::{ModuleDescriptor, PendingUpdate};

pub use cache::PendingUpdateStore;
pub use checker::{CheckOutcome, UpdateChecker};
pub use github::ReleaseClient;
pub use installer::{ApplyReport, UpdateApplier};
pub use restart::{CurrentProcess, NoRestart, ProcessControl, RestartCoordinator};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use version::is_newer;

/// Shared state handed to every updater component
#[derive(Clone)]
pub struct UpdaterContext {
    pub config: UpdaterConfig,
    pub store: Arc<PendingUpdateStore>,
    pub transport: Arc<dyn Transport>,
}

impl UpdaterContext {
    pub fn new(config: UpdaterConfig, transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(PendingUpdateStore::new(config.cache_file.clone()));
        Self {
            config,
            store,
            transport,
        }
    }

    /// Context backed by the real HTTP client
    pub fn from_config(config: UpdaterConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn release_client(&self) -> ReleaseClient {
        ReleaseClient::new(self.transport.clone(), &self.config.api_base_url)
    }
}

struct Inner {
    checker: UpdateChecker,
    restart: RestartCoordinator,
    cycle: Mutex<()>,
    /// Mods replaced by this start's apply pass
    installed: Vec<String>,
}

impl Inner {
    fn on_module_registered(&self, module: &ModuleDescriptor) -> Option<PendingUpdate> {
        // One registration is fully handled, restart included, before the next
        let _cycle = self.cycle.lock();

        // The host may still announce the version it loaded before the swap
        if self.installed.iter().any(|name| *name == module.name) {
            info!(module = %module.name, "Updated at startup, skipping check");
            return None;
        }

        let update = self.checker.check_module(module);
        if update.is_some() {
            self.restart.mark_pending();
        }
        if self.restart.has_pending() {
            self.restart.restart_process_and_exit();
        }
        update
    }
}

/// Applies cached updates at startup and checks every mod the host registers
pub struct Updater {
    inner: Arc<Inner>,
    events: Arc<RegistrationEvents>,
    subscription: Option<Subscription>,
    startup_report: ApplyReport,
}

impl Updater {
    /// Drain the pending-update cache, then subscribe to registrations
    pub fn start(
        ctx: UpdaterContext,
        process: Arc<dyn ProcessControl>,
        events: Arc<RegistrationEvents>,
    ) -> Self {
        let startup_report = UpdateApplier::new(&ctx).apply_all();
        if !startup_report.is_empty() {
            info!(
                applied = startup_report.applied.len(),
                failed = startup_report.failed.len(),
                skipped = startup_report.skipped.len(),
                "Processed cached updates"
            );
        }

        let inner = Arc::new(Inner {
            checker: UpdateChecker::new(&ctx),
            restart: RestartCoordinator::new(process),
            cycle: Mutex::new(()),
            installed: startup_report
                .applied
                .iter()
                .map(|u| u.mod_name.clone())
                .collect(),
        });

        let listener = inner.clone();
        let subscription = events.subscribe(Arc::new(move |module: &ModuleDescriptor| {
            listener.on_module_registered(module);
        }));

        Self {
            inner,
            events,
            subscription: Some(subscription),
            startup_report,
        }
    }

    /// Handle a registration directly instead of through the event hub
    pub fn handle_registration(&self, module: &ModuleDescriptor) -> Option<PendingUpdate> {
        self.inner.on_module_registered(module)
    }

    pub fn startup_report(&self) -> &ApplyReport {
        &self.startup_report
    }

    pub fn restart_requested(&self) -> bool {
        self.inner.restart.has_restarted()
    }

    /// Stop listening for registrations
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.events.unsubscribe(subscription);
        }
    }
}

impl Drop for Updater {
    fn drop(&mut self) {
        self.stop();
    }
}
