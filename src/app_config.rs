use clap::Parser;
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_BIND: &str = "0.0.0.0";

#[derive(Parser, Debug, Default)]
#[command(version, about = "Development proxy that fetches a target URL on the caller's behalf")]
pub struct Cli {
  /// YAML settings file
  #[arg(long)]
  pub config: Option<PathBuf>,
  #[arg(long)]
  pub bind: Option<String>,
  #[arg(long)]
  pub port: Option<u16>,
  #[arg(long)]
  pub workers: Option<usize>,
  /// off, error, warn, info, debug or trace
  #[arg(long)]
  pub log_level: Option<String>,
}

/// Connection settings for the hosted backend client. Both values are
/// optional at startup.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct BackendSettings {
  pub url: Option<String>,
  pub anon_key: Option<String>,
}

impl BackendSettings {
  pub fn is_configured(&self) -> bool {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
    present(&self.url) && present(&self.anon_key)
  }

  pub fn report(&self) {
    if self.is_configured() {
      info!("Backend client configured for '{}'.", self.url.as_deref().unwrap_or_default());
    } else {
      warn!("Backend settings are incomplete, set SUPABASE_URL and SUPABASE_ANON_KEY.");
    }
  }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct ConfigFile {
  pub bind: Option<String>,
  pub port: Option<u16>,
  pub workers: Option<usize>,
  pub log_level: Option<String>,
  pub backend: BackendSettings,
}

impl ConfigFile {
  pub fn load_from_file(file: &File) -> Result<ConfigFile, std::io::Error> {
    let config: ConfigFile =
      serde_yaml::from_reader(file).map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

    Ok(config)
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub bind: String,
  pub port: u16,
  pub workers: usize,
  pub log_level: LevelFilter,
  pub backend: BackendSettings,
}

impl Default for AppConfig {
  fn default() -> Self {
    AppConfig {
      bind: DEFAULT_BIND.into(),
      port: DEFAULT_PORT,
      workers: DEFAULT_WORKER_COUNT,
      log_level: LevelFilter::Info,
      backend: BackendSettings::default(),
    }
  }
}

impl AppConfig {
  /// Defaults, then the YAML file, then the environment, then the command line.
  pub fn load<F>(cli: &Cli, env: F) -> Result<AppConfig, std::io::Error>
  where
    F: Fn(&str) -> Option<String>,
  {
    let env = |key: &str| env(key).filter(|value| !value.is_empty());
    let mut config = AppConfig::default();

    let config_path = cli
      .config
      .clone()
      .or_else(|| env("PROXY_CONF_LOCATION").map(PathBuf::from));

    if let Some(path) = config_path {
      let file = File::open(&path)?;
      config.apply_file(ConfigFile::load_from_file(&file)?);
    }

    config.apply_env(env);
    config.apply_cli(cli);

    Ok(config)
  }

  fn apply_file(&mut self, file: ConfigFile) {
    let ConfigFile {
      bind,
      port,
      workers,
      log_level,
      backend,
    } = file;

    if let Some(bind) = bind {
      self.bind = bind;
    }
    self.port = port.unwrap_or(self.port);
    self.workers = workers.filter(|n| *n > 0).unwrap_or(self.workers);
    self.log_level = parse_level(log_level.as_deref()).unwrap_or(self.log_level);
    self.backend = BackendSettings {
      url: backend.url.filter(|url| !url.is_empty()),
      anon_key: backend.anon_key.filter(|key| !key.is_empty()),
    };
  }

  fn apply_env<F>(&mut self, env: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(bind) = env("HTTP_BIND") {
      self.bind = bind;
    }
    self.port = env("HTTP_PORT").and_then(|e| e.parse::<u16>().ok()).unwrap_or(self.port);
    self.workers = env("HTTP_WORKER_COUNT")
      .and_then(|e| e.parse::<usize>().ok())
      .filter(|n| *n > 0)
      .unwrap_or(self.workers);
    self.log_level = parse_level(env("LOG_LEVEL").as_deref()).unwrap_or(self.log_level);

    if let Some(url) = env("SUPABASE_URL") {
      self.backend.url = Some(url);
    }
    if let Some(anon_key) = env("SUPABASE_ANON_KEY") {
      self.backend.anon_key = Some(anon_key);
    }
  }

  fn apply_cli(&mut self, cli: &Cli) {
    if let Some(bind) = &cli.bind {
      self.bind = bind.clone();
    }
    self.port = cli.port.unwrap_or(self.port);
    self.workers = cli.workers.filter(|n| *n > 0).unwrap_or(self.workers);
    self.log_level = parse_level(cli.log_level.as_deref()).unwrap_or(self.log_level);
  }
}

fn parse_level(value: Option<&str>) -> Option<LevelFilter> {
  value.and_then(|level| LevelFilter::from_str(level).ok())
}
