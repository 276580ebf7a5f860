// * Config Renderer
// * Pure functions turning registry state into the engine's native config text.
// * Output is byte-identical for identical registry state.

use std::fmt;
use thiserror::Error;

use crate::registry::{AlertRule, Registry, ScrapeTarget};

// * Joins the global, scrape and alert blocks
pub const BLOCK_SEPARATOR: &str = "\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("scrape interval {0:?} is not an integer number of seconds")]
    InvalidScrapeInterval(String),
}

/// The three rendered blocks of one config generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub global: String,
    pub scrape: String,
    pub alert: String,
}

impl RenderedConfig {
    /// Concatenates the non-empty blocks with [`BLOCK_SEPARATOR`].
    ///
    /// Every block opens with a newline, so trailing newlines are trimmed from
    /// all but the last block to keep exactly one blank line between blocks.
    pub fn text(&self) -> String {
        let blocks: Vec<&str> = [&self.global, &self.scrape, &self.alert]
            .into_iter()
            .filter(|block| !block.is_empty())
            .map(String::as_str)
            .collect();

        let last = blocks.len().saturating_sub(1);
        blocks
            .iter()
            .enumerate()
            .map(|(i, block)| if i < last { block.trim_end_matches('\n') } else { *block })
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }
}

impl fmt::Display for RenderedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Renders the `global:` block from the raw scrape-interval setting.
///
/// Fails when `raw_interval` is not an integer; callers must not persist
/// anything in that case. Negative values are rendered as given and left for
/// the engine to reject.
pub fn render_global(raw_interval: &str) -> Result<String, RenderError> {
    let seconds: i64 = raw_interval
        .parse()
        .map_err(|_| RenderError::InvalidScrapeInterval(raw_interval.to_string()))?;

    Ok(format!("\nglobal:\n  scrape_interval: {}s", seconds))
}

/// Renders one `scrape_configs:` stanza per target, in iteration order.
///
/// Each stanza repeats the header and is DNS-discovered as `tasks.<name>`.
pub fn render_scrape_block<'a, I>(targets: I) -> String
where
    I: IntoIterator<Item = &'a ScrapeTarget>,
{
    let mut block = String::new();
    for (i, target) in targets.into_iter().enumerate() {
        if i > 0 {
            block.push('\n');
        }
        block.push_str(&format!(
            r#"
scrape_configs:
  - job_name: "{name}"
    dns_sd_configs:
      - names: ["tasks.{name}"]
        type: A
        port: {port}
"#,
            name = target.name,
            port = target.port,
        ));
    }
    block
}

/// Renders one `ALERT` stanza per rule; the `FROM` line only when a source is set.
pub fn render_alert_block<'a, I>(rules: I) -> String
where
    I: IntoIterator<Item = &'a AlertRule>,
{
    let mut block = String::new();
    for (i, rule) in rules.into_iter().enumerate() {
        if i > 0 {
            block.push('\n');
        }
        block.push_str(&format!("\nALERT {}\n  IF {}\n", rule.name, rule.condition));
        if rule.has_source() {
            block.push_str(&format!("  FROM {}\n", rule.source));
        }
    }
    block
}

/// Renders the full config for a registry snapshot.
pub fn render_config(registry: &Registry, raw_interval: &str) -> Result<RenderedConfig, RenderError> {
    Ok(RenderedConfig {
        global: render_global(raw_interval)?,
        scrape: render_scrape_block(registry.targets()),
        alert: render_alert_block(registry.rules()),
    })
}
