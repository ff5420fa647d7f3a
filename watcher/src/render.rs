//! Human-readable status line.
//!
//! Each successful cycle prints one line such as:
//!
//! ```text
//! #142259035 (2312) 5 validators ✅ kiln (98.91%, 99.74%)
//! ```
//!
//! The line lists the tracked accounts (configured order) that are part of
//! the current validator set, with their block and chunk uptime.

use std::io::Write;
use std::sync::Mutex;

use console::style;

use crate::config::TrackedAccounts;
use crate::derive::{block_uptime, chunk_uptime, is_healthy};
use crate::types::{NodeStatus, ValidatorSet};

const HEALTHY: &str = "✅";
const DEGRADED: &str = "❌";

/// Suffixes stripped from account ids for display, first match wins.
const DISPLAY_SUFFIXES: &[&str] = &[".pool.f863973.m0", ".poolv1.near", ".pool.near"];

/// Shortens well-known staking pool account ids for display.
///
/// At most one suffix is stripped. Metric labels always carry the full id.
pub fn pretty_account_id(account_id: &str) -> &str {
    DISPLAY_SUFFIXES
        .iter()
        .find_map(|suffix| account_id.strip_suffix(suffix))
        .unwrap_or(account_id)
}

/// Formats a percentage with at most two decimals; integral values have none.
pub fn pretty_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Builds the status line for one cycle, without trailing newline.
pub fn format_status_line(
    status: &NodeStatus,
    validators: &ValidatorSet,
    tracked: &TrackedAccounts,
    colored: bool,
) -> String {
    let header = format!(
        "#{} ({})",
        status.sync_info.latest_block_height, validators.epoch_height
    );
    let count = format!("{} validators", validators.current_validators.len());

    let mut line = if colored {
        format!(
            "{} {}",
            style(header).yellow().force_styling(true),
            style(count).cyan().force_styling(true)
        )
    } else {
        format!("{header} {count}")
    };

    for account in tracked.iter() {
        let Some(v) = validators.current(account.as_str()) else {
            continue;
        };
        let glyph = if is_healthy(v) { HEALTHY } else { DEGRADED };
        line.push_str(&format!(
            " {glyph} {} ({}%, {}%)",
            pretty_account_id(v.account_id.as_str()),
            pretty_percent(block_uptime(v)),
            pretty_percent(chunk_uptime(v)),
        ));
    }

    line
}

/// Writes status lines to an injected sink (stdout in the binary).
pub struct StatusRenderer {
    out: Mutex<Box<dyn Write + Send>>,
    colored: bool,
}

impl StatusRenderer {
    pub fn new(out: Box<dyn Write + Send>, colored: bool) -> Self {
        Self {
            out: Mutex::new(out),
            colored,
        }
    }

    /// Renderer writing to standard output.
    pub fn stdout(colored: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), colored)
    }

    /// Writes the status line of one cycle followed by a newline.
    pub fn render(
        &self,
        status: &NodeStatus,
        validators: &ValidatorSet,
        tracked: &TrackedAccounts,
    ) -> std::io::Result<()> {
        let line = format_status_line(status, validators, tracked, self.colored);
        let mut out = self
            .out
            .lock()
            .map_err(|_| std::io::Error::other("status writer poisoned"))?;
        writeln!(out, "{line}")?;
        out.flush()
    }
}
