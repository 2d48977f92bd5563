use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;

pub fn workspace_dir() -> PathBuf {
    let output = std::process::Command::new(env!("CARGO"))
        .arg("locate-project")
        .arg("--workspace")
        .arg("--message-format=plain")
        .output()
        .ok()
        .map(|output| output.stdout);

    // Outside of a cargo checkout (e.g. a deployed binary) fall back to cwd.
    match output.as_deref().map(std::str::from_utf8) {
        Some(Ok(path)) if !path.trim().is_empty() => Path::new(path.trim())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        _ => PathBuf::from("."),
    }
}

/// Reads `config_name` from the workspace root and deserializes it.
pub fn load_config<T: DeserializeOwned>(config_name: &str) -> anyhow::Result<T> {
    read_toml(&workspace_dir().join(config_name))
}

/// Reads `Secrets.dev.toml` from the workspace root.
pub fn load_env<T: DeserializeOwned>() -> anyhow::Result<T> {
    read_toml(&workspace_dir().join("Secrets.dev.toml"))
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    toml::from_str::<T>(&text)
        .with_context(|| format!("failed to parse {}", path.display()))
}
