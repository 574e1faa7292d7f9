use std::path::{Path, PathBuf};

use dirs_next as dirs;

use crate::config::{Config, config_file_path};
use crate::error::AppError;

pub struct ConfigOptions {
    pub show_path: bool,
    pub add_exclude: Option<String>,
}

pub fn execute_config(options: ConfigOptions) -> Result<(), AppError> {
    if let Some(pattern) = options.add_exclude.as_deref() {
        let mut config = Config::load()?;
        if config.append_exclude(pattern.to_string()) {
            config.compile_excludes()?;
            config.save()?;
            println!("Added exclude pattern '{}'.", pattern);
        } else {
            println!("Exclude pattern '{}' is already configured.", pattern);
        }
    }

    if options.show_path || options.add_exclude.is_none() {
        let path = config_file_path()?;
        println!("Configuration file: {}", display_path(&path));
    }

    Ok(())
}

/// Replace the home directory prefix with `~` to make output easier to read.
fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        let mut display = PathBuf::from("~");
        display.push(stripped);
        return display.display().to_string();
    }

    path.display().to_string()
}
