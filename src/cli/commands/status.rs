//! Status command - show the cache location and its verdict

use crate::cache::Staleness;
use crate::cli::args::StatusArgs;
use crate::config::Config;
use crate::error::PrebuildResult;
use crate::pipeline::{self, StatusReport};
use crate::settings::Settings;
use console::{style, Emoji};
use serde::Serialize;
use std::path::PathBuf;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

#[derive(Serialize)]
struct StatusView {
    key: String,
    base_path: PathBuf,
    lock_path: PathBuf,
    stored_tag: Option<String>,
    stale: bool,
    staleness: Staleness,
}

impl From<StatusReport> for StatusView {
    fn from(report: StatusReport) -> Self {
        Self {
            key: report.key.to_string(),
            base_path: report.location.base_path,
            lock_path: report.location.lock_path,
            stored_tag: report.stored_tag,
            stale: report.staleness.is_stale(),
            staleness: report.staleness,
        }
    }
}

/// Execute the status command
pub fn execute(args: StatusArgs, config: &Config) -> PrebuildResult<()> {
    let settings = Settings::resolve(args.invocation(), config)?;
    let view = StatusView::from(pipeline::status(&settings)?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", style("Prebuild Cache Status").bold().cyan());
    println!();
    println!("  Location:   {}", view.base_path.display());
    println!("  Lock:       {}", view.lock_path.display());
    println!("  Key:        {}", view.key);
    println!(
        "  Stored tag: {}",
        view.stored_tag.as_deref().unwrap_or("(none)")
    );
    println!();
    if view.stale {
        println!("  {}{}", WARN, style(&view.staleness).yellow());
    } else {
        println!("  {}{}", CHECK, style(&view.staleness).green());
    }
    Ok(())
}
