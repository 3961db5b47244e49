use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DB_NAME: &str = "queryvault";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

pub struct AppPaths {
    pub base_dir: PathBuf,
    pub cache_file: PathBuf,
    pub log_file: PathBuf,
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl AppPaths {
    /// `$QV_HOME` if set, otherwise `~/.queryvault`.
    pub fn new() -> Self {
        let base = match std::env::var_os("QV_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".queryvault"),
        };
        Self::from_base(base)
    }

    pub fn from_base(base: PathBuf) -> Self {
        Self {
            cache_file: base.join("cache.json"),
            log_file: base.join("queryvault.log"),
            base_dir: base,
        }
    }

    /// Store file for a database name; an explicit path wins.
    pub fn db_path(&self, db_name: &str, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.base_dir.join(format!("{db_name}.db")))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
