//! Download progress with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Byte-count progress for one download.
///
/// Shows an indicatif bar in interactive mode, a single plain line in CI.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Start tracking a download of `total` bytes (unknown when `None`)
    pub fn new(ctx: &UiContext, label: &str, total: Option<u64>) -> Self {
        if !ctx.use_fancy_output() {
            eprintln!("{} Downloading {}", style("...").dim(), label);
            return Self { bar: None };
        }

        let bar = match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                if let Ok(template) = ProgressStyle::default_bar().template(
                    "  {spinner:.cyan} {prefix}  {bar:20.cyan/dim} {bytes}/{total_bytes} {elapsed:.dim}",
                ) {
                    bar.set_style(template.progress_chars("━╸─"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(template) =
                    ProgressStyle::default_spinner().template("  {spinner:.cyan} {prefix}  {bytes} {elapsed:.dim}")
                {
                    bar.set_style(template);
                }
                bar
            }
        };
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar: Some(bar) }
    }

    /// Record `bytes` more received
    pub fn advance(&self, bytes: u64) {
        if let Some(ref bar) = self.bar {
            bar.inc(bytes);
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Short label for a download URL: its last path segment without the query
pub fn url_label(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(path)
}
