pub mod config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod models;
pub mod update;

pub use config::UpdaterConfig;
pub use error::UpdateError;
pub use events::{RegistrationEvents, Subscription};
pub use models::{AssetInfo, ModuleDescriptor, PendingUpdate, ReleaseInfo};
pub use update::{Updater, UpdaterContext};
