//! Configuration file editor command.
//!
//! Opens the wavetide configuration file in the user's preferred editor,
//! writing the defaults first when no file exists.

use std::path::Path;
use std::process::Command;

use crate::config::{config_path, AppConfig};

/// Opens the configuration file in the user's preferred editor.
///
/// Tries editors in this order:
/// 1. $EDITOR environment variable
/// 2. nano
/// 3. vi
///
/// The edited file is validated afterwards and problems are reported.
///
/// # Errors
/// - If the default file cannot be written
/// - If no editor can be found or executed
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = config_path()?;
    ensure_config_file(&config_path)?;

    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    match check_config(&config_path) {
        Ok(()) => tracing::info!("Config file edited successfully"),
        Err(err) => {
            tracing::warn!("Edited config is not usable: {err:#}");
            eprintln!("Warning: {err:#}");
        }
    }
    Ok(())
}

/// Writes the default configuration if `path` does not exist yet.
fn ensure_config_file(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    tracing::info!("Creating default config at {}", path.display());
    AppConfig::default().save_to(path)
}

/// Parses the file and validates the waveform section.
fn check_config(path: &Path) -> anyhow::Result<()> {
    let config = AppConfig::load_from(path)?;
    config.waveform.validate()?;
    Ok(())
}

/// Finds the best available editor to use.
fn find_editor() -> anyhow::Result<String> {
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    for editor in &["nano", "vi"] {
        if is_editor_available(editor) {
            return Ok(editor.to_string());
        }
    }

    Err(anyhow::anyhow!(
        "No editor found. Please set the $EDITOR environment variable."
    ))
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_file_is_created_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("wavetide.toml");

        ensure_config_file(&path).expect("create");
        assert!(check_config(&path).is_ok());

        fs::write(&path, "[display]\nframe_rate = 30\n").expect("write");
        ensure_config_file(&path).expect("keep");
        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.display.frame_rate, 30);
    }

    #[test]
    fn test_invalid_waveform_section_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("wavetide.toml");
        fs::write(&path, "[waveform]\nslot_count = 0\n").expect("write");
        assert!(check_config(&path).is_err());
    }
}
