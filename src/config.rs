use std::{
    fs::{create_dir_all, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cert_sign_request::san::MAX_SANS;

#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub openssl: OpensslConfig,
    pub csr: RequestConfig,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct OpensslConfig {
    /// executable invoked for key and request generation.
    pub binary: PathBuf,
}

impl Default for OpensslConfig {
    fn default() -> Self {
        Self {
            binary: "openssl".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequestConfig {
    pub key_bits: u32,
    /// lowers the alternative name limit, at most 100.
    pub max_sans: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            key_bits: 2048,
            max_sans: MAX_SANS,
        }
    }
}

fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    let mut str = String::new();
    File::open(path)
        .with_context(|| format!("can't open {path:?}"))?
        .read_to_string(&mut str)
        .with_context(|| format!("Can't read {path:?}"))?;
    let config = toml::from_str::<Config>(&str)
        .with_context(|| format!("Can't parse file {path:?}"))?;
    if config.csr.max_sans > MAX_SANS {
        anyhow::bail!(
            "{path:?}: csr.max_sans is {}, at most {MAX_SANS} is allowed",
            config.csr.max_sans
        );
    }
    Ok(config)
}

/// Resolve settings: an explicit `--settings` file wins, otherwise
/// `config.toml` in the user config dir, which is seeded with the defaults
/// the first time it is missing.
pub fn read_config(
    config_dir: Option<&Path>,
    user_config_path: Option<&Path>,
) -> anyhow::Result<Config> {
    if let Some(user_config_path) = user_config_path {
        if !user_config_path.exists() {
            anyhow::bail!("can't find settings file {user_config_path:?}");
        }
        return load_config_file(user_config_path);
    }
    let Some(config_dir) = config_dir else {
        tracing::debug!("no config dir available, using default settings");
        return Ok(Config::default());
    };
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        load_config_file(&config_path)
    } else {
        let config = Config::default();
        create_dir_all(config_dir).context("Can't create config dir")?;
        File::create(&config_path)
            .with_context(|| format!("Can't create file {config_path:?}"))?
            .write_all(toml::to_string_pretty(&config)?.as_bytes())
            .with_context(|| format!("Can't write file {config_path:?}"))?;
        tracing::info!("wrote default settings to {config_path:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_default_file_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("csrgen");

        let config = read_config(Some(&config_dir), None).unwrap();

        assert_eq!(config, Config::default());
        let written = fs::read_to_string(config_dir.join("config.toml")).unwrap();
        assert!(written.contains("key_bits = 2048"));
        assert!(written.contains("binary = \"openssl\""));
    }

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[csr]\nmax_sans = 5\n").unwrap();

        let config = read_config(None, Some(&path)).unwrap();

        assert_eq!(config.csr.max_sans, 5);
        assert_eq!(config.csr.key_bits, 2048);
        assert_eq!(config.openssl.binary, PathBuf::from("openssl"));
    }

    #[test]
    fn san_limit_above_100_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[csr]\nmax_sans = 500\n").unwrap();

        let err = read_config(None, Some(&path)).unwrap_err();

        assert!(err.to_string().contains("max_sans is 500"), "{err}");
    }

    #[test]
    fn explicit_settings_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(None, Some(&dir.path().join("nope.toml")))
            .unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn no_config_dir_uses_defaults() {
        assert_eq!(read_config(None, None).unwrap(), Config::default());
    }
}
