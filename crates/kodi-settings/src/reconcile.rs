//! Change-detection reconciler.
//!
//! Diffs a desired-state batch against the settings store, persists and
//! applies only the keys that actually changed, and triggers the minimal
//! disruptive action. The single most important property: a no-op batch
//! touches no file and restarts nothing.

use crate::alsa;
use crate::catalog::{Catalog, RestartKind, SettingDef, SettingValue, TargetFile};
use crate::config::EngineConfig;
use crate::error::ReconcileError;
use crate::notify::{NotificationSink, ToastKind};
use crate::patch::{self, PatchInstruction};
use crate::service::ServiceControl;
use crate::store::SettingsStore;
use std::collections::HashMap;
use tracing::info;

/// Desired-state submission from the host UI: a subset of store keys
/// mapped to their new values, scoped to one semantic group.
pub type SettingsBatch = HashMap<String, SettingValue>;

/// Outcome of a reconcile or resync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileResult {
    pub changed: bool,
    pub restart: RestartKind,
}

impl ReconcileResult {
    pub fn restart_required(&self) -> bool {
        self.restart != RestartKind::None
    }

    fn unchanged() -> Self {
        Self {
            changed: false,
            restart: RestartKind::None,
        }
    }
}

/// The engine's orchestrating component. Holds its collaborators by
/// explicit injection; no ambient process-wide state.
pub struct Reconciler<C, N> {
    store: SettingsStore,
    catalog: Catalog,
    cfg: EngineConfig,
    control: C,
    sink: N,
}

impl<C: ServiceControl, N: NotificationSink> Reconciler<C, N> {
    pub fn new(
        store: SettingsStore,
        catalog: Catalog,
        cfg: EngineConfig,
        control: C,
        sink: N,
    ) -> Self {
        Self {
            store,
            catalog,
            cfg,
            control,
            sink,
        }
    }

    /// Reconcile a desired-state batch against the store and the target
    /// files. First error wins and is surfaced as exactly one user-facing
    /// failure notification.
    pub async fn reconcile(&self, batch: &SettingsBatch) -> Result<ReconcileResult, ReconcileError> {
        match self.try_reconcile(batch).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.sink.toast(
                    ToastKind::Error,
                    "Configuration update failed",
                    &e.to_string(),
                );
                Err(e)
            }
        }
    }

    /// Re-apply the current store state to every target file.
    ///
    /// Recovery path after a partially failed reconcile: the store already
    /// reflects the intended end state, so a plain retry of the same batch
    /// would see every key as unchanged. Resync bypasses change detection
    /// and converges the files instead.
    pub async fn resync(&self) -> Result<ReconcileResult, ReconcileError> {
        match self.try_resync().await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.sink
                    .toast(ToastKind::Error, "Resync failed", &e.to_string());
                Err(e)
            }
        }
    }

    async fn try_reconcile(&self, batch: &SettingsBatch) -> Result<ReconcileResult, ReconcileError> {
        // Reject invalid batches before any mutation.
        for key in batch.keys() {
            if !self.catalog.contains(key) {
                return Err(ReconcileError::UnknownKey(key.clone()));
            }
        }

        // Diff in catalog declaration order, never map iteration order,
        // so file output is byte-reproducible.
        let mut changes: Vec<(SettingDef, SettingValue)> = Vec::new();
        for def in self.catalog.defs() {
            let Some(new_value) = batch.get(def.key) else {
                continue;
            };
            let old_value = self.store.get(def.key)?;
            if old_value != *new_value {
                changes.push((*def, new_value.clone()));
            }
        }

        if changes.is_empty() {
            info!("no changes detected, nothing to apply");
            self.sink.toast(
                ToastKind::Success,
                "No change",
                "No changes detected, will not save.",
            );
            return Ok(ReconcileResult::unchanged());
        }

        // Persist intent first: once the store holds the new values the
        // user's intent is captured even if a later file write fails, and
        // resync() is the documented recovery path.
        for (def, value) in &changes {
            self.store.set(def.key, value.clone())?;
        }

        let restart = self.apply_and_restart(&changes).await?;
        Ok(ReconcileResult {
            changed: true,
            restart,
        })
    }

    async fn try_resync(&self) -> Result<ReconcileResult, ReconcileError> {
        info!("resyncing target files from the settings store");
        let snapshot = self.store.snapshot();

        let mut changes: Vec<(SettingDef, SettingValue)> = Vec::new();
        for def in self.catalog.defs() {
            if let Some(value) = snapshot.get(def.key) {
                changes.push((*def, value.clone()));
            }
        }

        if changes.is_empty() {
            return Ok(ReconcileResult::unchanged());
        }

        let restart = self.apply_and_restart(&changes).await?;
        Ok(ReconcileResult {
            changed: true,
            restart,
        })
    }

    /// Patch every changed key into its target file, then perform the
    /// required disruptive action. Already-applied patches are not rolled
    /// back on failure; each is independently idempotent.
    async fn apply_and_restart(
        &self,
        changes: &[(SettingDef, SettingValue)],
    ) -> Result<RestartKind, ReconcileError> {
        let mut restart = RestartKind::None;
        let mut touched_gui = false;

        for (def, value) in changes {
            match def.target {
                TargetFile::BootConfig | TargetFile::GuiSettings => {
                    let instr = PatchInstruction {
                        pattern: def.pattern.to_string(),
                        rendered_value: value.render(def.keep_boolean_text),
                        style: def.style,
                    };
                    let path = match def.target {
                        TargetFile::BootConfig => &self.cfg.boot_config,
                        _ => &self.cfg.gui_settings,
                    };
                    patch::apply_patch(path, &instr)?;
                    touched_gui |= def.target == TargetFile::GuiSettings;
                }
                TargetFile::AsoundConf => {
                    // usedac routes playback to the external DAC on card 1,
                    // otherwise the on-board card 0.
                    let card_index = match value {
                        SettingValue::Bool(true) => 1,
                        _ => 0,
                    };
                    alsa::update_routing(&self.cfg, &self.control, card_index).await?;
                }
                TargetFile::ServiceUnit => {
                    // No file of its own; realized by the restart below.
                }
            }
            restart = restart.max(def.target.restart_kind());
        }

        if touched_gui {
            // The XML is patched with elevated privilege but read by the
            // unprivileged service user; ownership restore is part of the
            // same logical operation.
            let gui_path = self.cfg.gui_settings.display().to_string();
            self.control
                .run_once(&self.cfg.chown_bin, &[&self.cfg.runtime_owner, &gui_path], true)
                .await?;
        }

        match restart {
            RestartKind::Reboot => {
                // Boot config is consumed at boot only; never restart the
                // service for it.
                self.sink.modal(
                    "Restart required",
                    "Changes have been made to the boot configuration, a reboot is required for them to take effect.",
                );
            }
            RestartKind::Service => {
                self.control.restart().await?;
                self.sink.toast(
                    ToastKind::Success,
                    "Restarted Kodi",
                    "Restarted Kodi for the changes to take effect.",
                );
            }
            RestartKind::None => {
                self.sink.toast(
                    ToastKind::Success,
                    "Configuration update",
                    "Settings applied, no restart required.",
                );
            }
        }

        Ok(restart)
    }
}
