use crate::cli::Toggle;
use crate::error::{DashError, Result};
use crate::settings::{load_settings, save_settings, settings_path, Settings};

/// Apply the given changes to `settings`. Returns whether anything changed.
pub fn apply(
    settings: &mut Settings,
    privacy: Option<Toggle>,
    top: Option<usize>,
    skip_rows: Option<usize>,
) -> Result<bool> {
    let mut changed = false;
    if let Some(p) = privacy {
        settings.privacy_mode = p.into();
        changed = true;
    }
    if let Some(n) = top {
        if n == 0 {
            return Err(DashError::Settings("top must be at least 1".into()));
        }
        settings.top_n = n;
        changed = true;
    }
    if let Some(n) = skip_rows {
        settings.skip_rows = n;
        changed = true;
    }
    Ok(changed)
}

pub fn run(privacy: Option<Toggle>, top: Option<usize>, skip_rows: Option<usize>) -> Result<()> {
    let mut settings = load_settings();
    if apply(&mut settings, privacy, top, skip_rows)? {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    println!("Settings:   {}", settings_path().display());
    println!("Privacy:    {}", if settings.privacy_mode { "on" } else { "off" });
    println!("Top N:      {}", settings.top_n);
    println!("Skip rows:  {}", settings.skip_rows);
    println!(
        "Palette:    deposit {}  withdrawal {}  hourly {}",
        settings.palette.deposit, settings.palette.withdrawal, settings.palette.hourly
    );
    Ok(())
}
