use std::fs;
use std::path::Path;

use posemaze_game::GameConfig;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::CliError;
use crate::paths::AppPaths;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the effective config.
///
/// An explicit `--config` path must exist. Otherwise the per-user config file
/// is used when present, falling back to built-in defaults.
pub fn load_config(
    explicit: Option<&Path>,
    paths: Option<&AppPaths>,
) -> Result<GameConfig, CliError> {
    let cfg = match (explicit, paths) {
        (Some(path), _) => {
            info!("Loading config from {:?}", path);
            read_json(path)?
        }
        (None, Some(paths)) if paths.config_file().is_file() => {
            let path = paths.config_file();
            info!("Loading config from {:?}", path);
            read_json(&path)?
        }
        _ => GameConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("posemaze-{}-{}", std::process::id(), name));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_without_any_file() {
        assert_eq!(load_config(None, None).unwrap(), GameConfig::default());
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let path = temp_file(
            "cfg-ok.json",
            r#"{ "move_interval_ms": 250, "stability_frames": 5 }"#,
        );
        let cfg = load_config(Some(&path), None).unwrap();
        assert_eq!(cfg.move_interval_ms, 250);
        assert_eq!(cfg.stability_frames, 5);
        assert_eq!(cfg.confidence_threshold, 0.7);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = temp_file("cfg-bad.json", r#"{ "confidence_threshold": 2.0 }"#);
        let err = load_config(Some(&path), None).unwrap_err();
        assert!(matches!(err, CliError::Game(_)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("posemaze-definitely-missing.json");
        assert!(matches!(
            load_config(Some(&path), None),
            Err(CliError::Io { .. })
        ));
    }
}
