//! Key command - print the cache key of the recipe overlay

use crate::cache::CacheKey;
use crate::cli::args::KeyArgs;
use crate::config::Config;
use crate::error::PrebuildResult;
use crate::settings::Settings;

/// Execute the key command
pub fn execute(args: KeyArgs, config: &Config) -> PrebuildResult<()> {
    let settings = Settings::resolve(args.invocation(), config)?;
    let key = CacheKey::from_directory(&settings.ports_dir)?;
    println!("{}", key);
    Ok(())
}
