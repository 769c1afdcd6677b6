//! `quicktube settings show|set`.

use anyhow::{Context, Result};
use quicktube_core::settings::SETTING_KEYS;

use crate::ProcessExit;
use crate::app::context::AppContext;

pub(crate) fn run_settings_show_command(ctx: &AppContext) -> Result<ProcessExit> {
    println!("# {}", ctx.config.settings_path().display());
    for key in SETTING_KEYS {
        let value = ctx.settings.get(key)?;
        println!("{key} = {value}");
    }
    Ok(ProcessExit::Success)
}

pub(crate) fn run_settings_set_command(
    ctx: &mut AppContext,
    key: &str,
    value: &str,
) -> Result<ProcessExit> {
    ctx.settings.set(key, value)?;
    let path = ctx.config.settings_path();
    ctx.settings
        .save(&path)
        .with_context(|| format!("Cannot save settings to {}", path.display()))?;
    println!("{key} = {}", ctx.settings.get(key)?);
    Ok(ProcessExit::Success)
}
