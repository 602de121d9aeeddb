use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

const ENV_ADDR: &str = "MODEM_ADDR";
const ENV_MESSAGES: &str = "MODEM_MESSAGES";
const ENV_SEND_LOG: &str = "MODEM_SEND_LOG";
const ENV_RECEIVE_LOG: &str = "MODEM_RECEIVE_LOG";
const ENV_INPUT_DEVICE: &str = "MODEM_INPUT_DEVICE";
const ENV_OUTPUT_DEVICE: &str = "MODEM_OUTPUT_DEVICE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to determine XDG config directories: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
}

/// Optional defaults for any CLI flag not given on the command line,
/// layered in the same order the XDG-aware loader searches for it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub addr: Option<u8>,
    pub messages: Option<PathBuf>,
    pub send_log: Option<PathBuf>,
    pub receive_log: Option<PathBuf>,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

impl Config {
    /// Sets `MODEM_*` environment variables from every field present in
    /// this config, unless the variable is already set -- an explicit
    /// environment variable or CLI flag always wins over the file.
    pub fn load_into_env(&self) {
        set_env_if_absent(ENV_ADDR, self.addr.map(|a| a.to_string()));
        set_env_if_absent(ENV_MESSAGES, path_string(&self.messages));
        set_env_if_absent(ENV_SEND_LOG, path_string(&self.send_log));
        set_env_if_absent(ENV_RECEIVE_LOG, path_string(&self.receive_log));
        set_env_if_absent(ENV_INPUT_DEVICE, self.input_device.clone());
        set_env_if_absent(ENV_OUTPUT_DEVICE, self.output_device.clone());
    }
}

fn path_string(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

fn set_env_if_absent(key: &str, value: Option<String>) {
    if std::env::var_os(key).is_some() {
        return;
    }
    if let Some(value) = value {
        std::env::set_var(key, value);
    }
}

/// Loads `modem.toml` from the current directory if present, falling
/// back to the XDG config directory, then applies it to the environment.
/// Absence of a config file anywhere is not an error -- CLI flags and
/// built-in `structopt` defaults still apply.
pub fn read() -> Result<(), ConfigError> {
    if let Some(config) = load_file(PathBuf::from("modem.toml"))? {
        config.load_into_env();
        return Ok(());
    }

    let xdg_dirs = xdg::BaseDirectories::with_prefix("modem")?;
    if let Some(path) = xdg_dirs.find_config_file("modem.toml") {
        if let Some(config) = load_file(path)? {
            config.load_into_env();
        }
    }

    Ok(())
}

fn load_file(path: PathBuf) -> Result<Option<Config>, ConfigError> {
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse { path, source })
}
