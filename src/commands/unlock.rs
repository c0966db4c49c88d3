use crate::config::Config;
use crate::paths::with_prefix;
use crate::pdf::unlock::unlock;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(
    config: &Config,
    path: P,
    password: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let path = path.as_ref();
    let output = output.unwrap_or_else(|| with_prefix(path, &config.unlocked_prefix));

    let written = unlock(path, &output, password)?;
    println!("Unlocked PDF saved as {}", written.display());

    Ok(())
}
