use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for the placement tracking server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind the listener to
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// URL for the database connection
    pub database_url: String,
    /// Secret used to sign access tokens
    pub jwt_secret: String,
    /// Secret used to sign refresh tokens
    pub jwt_refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_token_expiry_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry_secs: u64,
    /// Number of async runtime worker threads
    pub worker_threads: usize,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
    /// Password applied by the admin reset endpoint
    pub default_reset_password: String,
    /// Directory for rolling JSON log files; stderr-only when unset
    pub log_dir: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub jwt_refresh_secret: Option<String>,
    #[serde(default)]
    pub access_token_expiry_secs: Option<u64>,
    #[serde(default)]
    pub refresh_token_expiry_secs: Option<u64>,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub default_reset_password: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Command line arguments for the application
#[derive(Parser, Debug, Default)]
#[clap(name = "placetrack", about = "Placement drive tracking server")]
pub struct CliArgs {
    /// Address to bind to
    #[clap(long, env = "HOST")]
    pub host: Option<String>,

    /// TCP port to listen on
    #[clap(long, env = "PORT")]
    pub port: Option<u16>,

    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Secret used to sign access tokens
    #[clap(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Secret used to sign refresh tokens
    #[clap(long, env = "JWT_REFRESH_SECRET_KEY", hide_env_values = true)]
    pub jwt_refresh_secret: Option<String>,

    /// Access token lifetime in seconds
    #[clap(long, env = "ACCESS_TOKEN_EXPIRY")]
    pub access_token_expiry_secs: Option<u64>,

    /// Refresh token lifetime in seconds
    #[clap(long, env = "REFRESH_TOKEN_EXPIRY")]
    pub refresh_token_expiry_secs: Option<u64>,

    /// Number of async runtime worker threads
    #[clap(long, env = "WORKER_THREADS")]
    pub worker_threads: Option<usize>,

    /// Comma-separated origins allowed for credentialed CORS requests
    #[clap(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Option<Vec<String>>,

    /// Password applied by the admin reset endpoint
    #[clap(long, env = "DEFAULT_RESET_PASSWORD")]
    pub default_reset_password: Option<String>,

    /// Directory for rolling JSON log files
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Placeholder secret that must be replaced outside of development
pub const DEV_SECRET: &str = "insecure-dev-secret";

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            host: update.host.unwrap_or(self.host),
            port: update.port.unwrap_or(self.port),
            database_url: update.database_url.unwrap_or(self.database_url),
            jwt_secret: update.jwt_secret.unwrap_or(self.jwt_secret),
            jwt_refresh_secret: update.jwt_refresh_secret.unwrap_or(self.jwt_refresh_secret),
            access_token_expiry_secs: update
                .access_token_expiry_secs
                .unwrap_or(self.access_token_expiry_secs),
            refresh_token_expiry_secs: update
                .refresh_token_expiry_secs
                .unwrap_or(self.refresh_token_expiry_secs),
            worker_threads: update.worker_threads.unwrap_or(self.worker_threads),
            allowed_origins: update.allowed_origins.unwrap_or(self.allowed_origins),
            default_reset_password: update
                .default_reset_password
                .unwrap_or(self.default_reset_password),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Returns the access token lifetime as a Duration
    pub fn access_token_expiry(&self) -> Duration {
        Duration::from_secs(self.access_token_expiry_secs)
    }

    /// Returns the refresh token lifetime as a Duration
    pub fn refresh_token_expiry(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expiry_secs)
    }
}

/// Returns the base (default) configuration
///
/// The port fallback of 5000 and the 15 minute / 7 day token lifetimes are
/// the service's documented defaults when the corresponding environment
/// variables are unset.
pub fn base_config(config_dir: Option<PathBuf>) -> Config {
    let database_url = config_dir.map_or("placetrack.db".to_string(), |dir| {
        dir.join("placetrack.db").to_string_lossy().to_string()
    });

    Config {
        host: "0.0.0.0".to_string(),
        port: 5000,
        database_url,
        jwt_secret: DEV_SECRET.to_string(),
        jwt_refresh_secret: DEV_SECRET.to_string(),
        access_token_expiry_secs: 900,
        refresh_token_expiry_secs: 604_800,
        // The service was sized as 2 workers x 4 threads before the move
        // to a single multi-threaded runtime.
        worker_threads: 8,
        allowed_origins: vec![
            "http://localhost:5000".to_string(),
            "http://localhost:5173".to_string(),
        ],
        default_reset_password: "changeme".to_string(),
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
///
/// Every field also has an environment fallback wired through clap, which
/// is how the deployment surface (`PORT`, `JWT_SECRET_KEY`, ...) reaches
/// the process.
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        host: args.host,
        port: args.port,
        database_url: args.database_url,
        jwt_secret: args.jwt_secret,
        jwt_refresh_secret: args.jwt_refresh_secret,
        access_token_expiry_secs: args.access_token_expiry_secs,
        refresh_token_expiry_secs: args.refresh_token_expiry_secs,
        worker_threads: args.worker_threads,
        allowed_origins: args.allowed_origins,
        default_reset_password: args.default_reset_password,
        log_dir: args.log_dir,
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line
/// arguments in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_dir = match ProjectDirs::from("com", "placetrack", "placetrack") {
        Some(proj_dirs) => {
            let path = PathBuf::from(proj_dirs.config_dir());
            if path.exists() { Some(path) } else { None }
        }
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    };

    let base = base_config(config_dir.clone());
    let config_file = config_dir.map(|dir| dir.join("config.toml"));

    let config = base
        .apply_update(config_from_file(config_file).unwrap_or_default())
        .apply_update(config_from_args(args));

    if config.jwt_secret == DEV_SECRET || config.jwt_refresh_secret == DEV_SECRET {
        warn!("JWT secrets are unset; using the development placeholder. Set JWT_SECRET_KEY and JWT_REFRESH_SECRET_KEY.");
    }

    info!(
        "Final configuration: listen={}:{}, database_url={}, worker_threads={}",
        config.host, config.port, config.database_url, config.worker_threads
    );

    config
}
