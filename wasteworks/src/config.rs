use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use depot_store::StoreConfig;
use thiserror::Error;

/// Deployment target for the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(ConfigError::UnknownEnvironment {
                value: other.to_string(),
            }),
        }
    }
}

/// Minimal configuration blob compiled into the binary.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub listen_addr: SocketAddr,
    pub store: StoreConfig,
    /// Enables the `/testing/` seed and reset routes.
    pub testing_routes: bool,
    /// Seed the demo network on boot when the store is empty.
    pub seed_on_boot: bool,
}

impl AppConfig {
    pub fn load(env: Environment) -> Self {
        match env {
            Environment::Dev => Self {
                env,
                listen_addr: ([127, 0, 0, 1], 8080).into(),
                store: StoreConfig::new(PathBuf::from("wasteworks.state")),
                testing_routes: true,
                seed_on_boot: true,
            },
            Environment::Prod => Self {
                env,
                listen_addr: ([0, 0, 0, 0], 8080).into(),
                store: StoreConfig::new(PathBuf::from("/var/lib/wasteworks")),
                testing_routes: false,
                seed_on_boot: false,
            },
        }
    }

    pub fn env_label(&self) -> &'static str {
        match self.env {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown environment {value:?}; expected dev or prod")]
    UnknownEnvironment { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn dev_config_enables_testing_routes() {
        let config = AppConfig::load(Environment::Dev);
        assert!(config.testing_routes);
        assert!(config.seed_on_boot);
        let config = AppConfig::load(Environment::Prod);
        assert!(!config.testing_routes);
        assert!(!config.seed_on_boot);
    }
}
