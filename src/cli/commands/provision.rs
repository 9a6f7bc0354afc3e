//! Provision command - bring the dependency cache up to date

use crate::cli::args::ProvisionArgs;
use crate::config::Config;
use crate::error::PrebuildResult;
use crate::pipeline::Pipeline;
use crate::settings::Settings;
use crate::toolbox::LocalToolbox;
use crate::ui::UiContext;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");

/// Execute the provision command
pub fn execute(args: ProvisionArgs, config: &Config) -> PrebuildResult<()> {
    let settings = Settings::resolve(args.invocation(), config)?;
    let toolbox = LocalToolbox::new(UiContext::detect());
    let report = Pipeline::new(&settings, &toolbox).run()?;

    println!(
        "{}{} {} ({})",
        CHECK,
        style("Cache").bold(),
        report.location.base_path.display(),
        report.staleness
    );
    println!("  key:    {}", report.key);
    println!("  config: {}", report.config_path.display());

    if let Some(bundle) = &report.bundle {
        println!(
            "{}{} {} framework libs, {} libs, {} jars, {} assets",
            CHECK,
            style("Bundle").bold(),
            bundle.framework_libs,
            bundle.bundled_libs,
            bundle.jars,
            bundle.assets
        );
        println!("  manifest: {}", bundle.manifest_path.display());
        if !bundle.permissions.is_empty() {
            println!("  permissions: {}", bundle.permissions.join(", "));
        }
        if !bundle.features.is_empty() {
            println!("  features: {}", bundle.features.join(", "));
        }
    }
    Ok(())
}
