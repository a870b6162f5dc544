use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Listener settings shared by every service in the workspace.
///
/// Read from an optional `configuration` file and from `APP__*` variables,
/// e.g. `APP__PORT=8080`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// The gRPC listener takes `port + 1`, so the top port is unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.port == u16::MAX {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "port {} leaves no room for the gRPC listener on port + 1",
                self.port
            )));
        }
        Ok(())
    }

    /// Address of the HTTP listener.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Address of the gRPC listener: HTTP port + 1, or an ephemeral port when
    /// the HTTP port is ephemeral too. Assumes [`Config::validate`] passed.
    pub fn grpc_addr(&self) -> SocketAddr {
        let port = if self.port == 0 { 0 } else { self.port.saturating_add(1) };
        SocketAddr::new(self.host, port)
    }
}
