//! Runtime configuration loaded from the process environment.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use super::error::{PredictorError, PredictorResult};

/// File name of the model artefact expected beside the executable.
pub const MODEL_FILE_NAME: &str = "heart_model.json";

/// Directory, relative to the working directory, holding the bundled artefact.
pub const MODEL_DIR: &str = "models";

/// Output format for log records.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> PredictorResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(PredictorError::config(format!(
                "HEART_LOG_FORMAT must be `text` or `json`, got `{other}`"
            ))),
        }
    }
}

/// Snapshot of configuration values consumed by the service.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> PredictorResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> PredictorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port_raw = env_or("HEART_PORT", "8000");
        let port = port_raw.trim().parse::<u16>().map_err(|_| {
            PredictorError::config(format!("HEART_PORT must be a port number, got `{port_raw}`"))
        })?;

        let model_path = match lookup("HEART_MODEL_PATH").filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_model_path(),
        };

        Ok(Self {
            host: env_or("HEART_HOST", "127.0.0.1"),
            port,
            model_path,
            log_filter: env_or("HEART_LOG", "info"),
            log_format: LogFormat::parse(&env_or("HEART_LOG_FORMAT", "text"))?,
        })
    }

    /// Socket address the HTTP listener binds to.
    pub fn bind_addr(&self) -> PredictorResult<SocketAddr> {
        let ip: IpAddr = self.host.trim().parse().map_err(|_| {
            PredictorError::config(format!(
                "HEART_HOST must be an IP address, got `{}`",
                self.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Default artefact location when `HEART_MODEL_PATH` is unset.
///
/// Prefers `heart_model.json` beside the running executable, then
/// `models/heart_model.json` under the working directory. When neither exists
/// the executable-side path is returned so the startup error names it.
pub fn default_model_path() -> PathBuf {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = env::current_dir().ok();
    resolve_model_path(exe_dir.as_deref(), cwd.as_deref(), Path::is_file)
}

fn resolve_model_path<F>(exe_dir: Option<&Path>, cwd: Option<&Path>, exists: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let beside_exe = exe_dir.map(|dir| dir.join(MODEL_FILE_NAME));
    let in_workdir = cwd.map(|dir| dir.join(MODEL_DIR).join(MODEL_FILE_NAME));

    let found = beside_exe
        .iter()
        .chain(in_workdir.iter())
        .find(|path| exists(path.as_path()))
        .cloned();
    found
        .or(beside_exe)
        .unwrap_or_else(|| Path::new(MODEL_DIR).join(MODEL_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg_from(pairs: &[(&str, &str)]) -> PredictorResult<AppCfg> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppCfg::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = cfg_from(&[]).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.log_format, LogFormat::Text);
        assert!(cfg.model_path.ends_with(MODEL_FILE_NAME));
    }

    #[test]
    fn overrides_are_honoured() {
        let cfg = cfg_from(&[
            ("HEART_HOST", "0.0.0.0"),
            ("HEART_PORT", "9100"),
            ("HEART_MODEL_PATH", "/opt/models/heart.json"),
            ("HEART_LOG", "debug"),
            ("HEART_LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "0.0.0.0:9100");
        assert_eq!(cfg.model_path, PathBuf::from("/opt/models/heart.json"));
        assert_eq!(cfg.log_filter, "debug");
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = cfg_from(&[("HEART_PORT", "  "), ("HEART_MODEL_PATH", "")]).unwrap();
        assert_eq!(cfg.port, 8000);
        assert!(cfg.model_path.ends_with(MODEL_FILE_NAME));
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = cfg_from(&[("HEART_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, PredictorError::Config(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(cfg_from(&[("HEART_LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn ipv6_host_binds() {
        let cfg = cfg_from(&[("HEART_HOST", "::"), ("HEART_PORT", "8080")]).unwrap();
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "[::]:8080");
    }

    #[test]
    fn hostname_is_not_a_bind_address() {
        let cfg = cfg_from(&[("HEART_HOST", "localhost")]).unwrap();
        assert!(cfg.bind_addr().is_err());
    }

    #[test]
    fn artefact_beside_executable_wins() {
        let exe = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(exe.path().join(MODEL_FILE_NAME), "{}").unwrap();
        std::fs::create_dir(cwd.path().join(MODEL_DIR)).unwrap();
        std::fs::write(cwd.path().join(MODEL_DIR).join(MODEL_FILE_NAME), "{}").unwrap();

        let path = resolve_model_path(Some(exe.path()), Some(cwd.path()), Path::is_file);
        assert_eq!(path, exe.path().join(MODEL_FILE_NAME));
    }

    #[test]
    fn bundled_models_directory_is_the_fallback() {
        let exe = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::create_dir(cwd.path().join(MODEL_DIR)).unwrap();
        std::fs::write(cwd.path().join(MODEL_DIR).join(MODEL_FILE_NAME), "{}").unwrap();

        let path = resolve_model_path(Some(exe.path()), Some(cwd.path()), Path::is_file);
        assert_eq!(path, cwd.path().join("models/heart_model.json"));
    }

    #[test]
    fn absent_everywhere_names_the_executable_side_path() {
        let exe = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let path = resolve_model_path(Some(exe.path()), Some(cwd.path()), Path::is_file);
        assert_eq!(path, exe.path().join(MODEL_FILE_NAME));

        let path = resolve_model_path(None, None, |_| false);
        assert_eq!(path, PathBuf::from("models/heart_model.json"));
    }
}
