//! ALSA routing block management.
//!
//! The routing file is shared with other subsystems; the engine owns only
//! the block between its `#KODI` / `#ENDOFKODI` markers. An update renders
//! a fresh block from the template, splices it in place of any existing
//! block, restores file ownership and triggers a live reload. The whole
//! sequence is exposed as one operation.

use crate::config::EngineConfig;
use crate::error::{PatchError, ReconcileError};
use crate::service::ServiceControl;
use std::fs;
use std::io;
use tracing::info;

/// Marker naming the engine's block inside the routing file.
pub const BLOCK_MARKER: &str = "KODI";

const ROUTING_TEMPLATE: &str = include_str!("../templates/asound.kodi");

/// Render the routing block for a given soundcard index.
pub fn render_block(card_index: u32) -> String {
    let index = card_index.to_string();
    ROUTING_TEMPLATE
        .replace("${PCM_CARD_INDEX}", &index)
        .replace("${CTL_CARD_INDEX}", &index)
}

/// Remove any existing marker-delimited block and append `block`.
/// The result always carries exactly one block.
pub fn splice_block(content: &str, marker: &str, block: &str) -> String {
    let begin = format!("#{}", marker);
    let end = format!("#ENDOF{}", marker);

    let mut kept: Vec<&str> = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if inside {
            if trimmed == end {
                inside = false;
            }
            continue;
        }
        if trimmed == begin {
            inside = true;
            continue;
        }
        kept.push(line);
    }

    // Drop blank lines left behind where the old block sat.
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(block);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Rewrite the routing block for `card_index`, restore ownership and
/// reload the ALSA state. A missing routing file is treated as empty.
pub async fn update_routing<C: ServiceControl>(
    cfg: &EngineConfig,
    control: &C,
    card_index: u32,
) -> Result<(), ReconcileError> {
    let path = &cfg.asound_conf;
    let current = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(PatchError::Read {
                path: path.clone(),
                source,
            }
            .into())
        }
    };

    let next = splice_block(&current, BLOCK_MARKER, &render_block(card_index));
    if next != current {
        fs::write(path, &next).map_err(|source| PatchError::Write {
            path: path.clone(),
            source,
        })?;
        info!("rewrote routing block in {} (card {})", path.display(), card_index);
    }

    // The file is written with elevated privilege but read by the
    // unprivileged service user.
    let path_str = path.display().to_string();
    control
        .run_once(&cfg.chown_bin, &[&cfg.runtime_owner, &path_str], true)
        .await?;
    control
        .run_once(&cfg.alsactl_bin, &["-L", "-R", "restore"], false)
        .await?;

    Ok(())
}
