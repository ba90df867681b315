//! Settings-reconciliation engine for the Kodi media-center plugin.
//!
//! Keeps the plugin's persistent settings store synchronized with the
//! external configuration surfaces Kodi actually reads - the bootloader
//! config, guisettings.xml and the ALSA routing file - and triggers the
//! minimal restart or reboot prompt needed for changes to take effect.

pub mod alsa;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod patch;
pub mod reconcile;
pub mod service;
pub mod store;

pub use catalog::{Catalog, RestartKind, SettingValue};
pub use config::EngineConfig;
pub use error::{PatchError, ProcessError, ReconcileError, StoreError};
pub use notify::{LogSink, NotificationSink, ToastKind};
pub use reconcile::{ReconcileResult, Reconciler, SettingsBatch};
pub use service::{ServiceControl, SystemdControl};
pub use store::SettingsStore;
