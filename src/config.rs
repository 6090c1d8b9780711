use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use log::{info, warn};

use crate::azure::LoginMode;

pub struct EnvConfig {
    pub bind_addr: SocketAddr,
    pub options: PathBuf,
    pub az_cli: String,
    pub login_mode: LoginMode,
    pub login_timeout_s: u64,
    pub query_timeout_s: u64,
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, defaults applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr = var("BIND_ADDR", "127.0.0.1:5000");
        let login_timeout = var("AZ_LOGIN_TIMEOUT_S", "120");
        let query_timeout = var("AZ_QUERY_TIMEOUT_S", "60");

        Ok(Self {
            bind_addr: bind_addr
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {}", bind_addr))?,
            options: var("OPTIONS_PATH", "options.json").into(),
            az_cli: var("AZ_CLI_PATH", "az"),
            login_mode: login_mode(&var("AZ_LOGIN_MODE", "interactive"), &lookup)?,
            login_timeout_s: login_timeout
                .parse()
                .with_context(|| format!("AZ_LOGIN_TIMEOUT_S is not a number: {}", login_timeout))?,
            query_timeout_s: query_timeout
                .parse()
                .with_context(|| format!("AZ_QUERY_TIMEOUT_S is not a number: {}", query_timeout))?,
        })
    }

    pub fn validate(self) -> Result<Self> {
        info!("--- Checking env variables ---");
        info!("🌐 Bind: {}", self.bind_addr);
        info!("📄 Options: {:?}", self.options);
        info!("🛠 az CLI: {}", self.az_cli);
        info!("⏱ Timeouts: login {}s, query {}s", self.login_timeout_s, self.query_timeout_s);

        ensure!(self.login_timeout_s > 0, "AZ_LOGIN_TIMEOUT_S must be greater than zero");
        ensure!(self.query_timeout_s > 0, "AZ_QUERY_TIMEOUT_S must be greater than zero");
        ensure!(!self.az_cli.trim().is_empty(), "AZ_CLI_PATH cannot be empty");

        if self.login_mode == LoginMode::Interactive {
            warn!("⚠️ Interactive az login may block until a browser sign-in completes.");
        }

        Ok(self)
    }
}

fn login_mode<F>(mode: &str, lookup: &F) -> Result<LoginMode>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| -> Result<String> {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("{} is required for service-principal login", key))
    };

    Ok(match mode.trim().to_ascii_lowercase().as_str() {
        "interactive" => LoginMode::Interactive,
        "service-principal" | "sp" => LoginMode::ServicePrincipal {
            client_id: required("AZURE_CLIENT_ID")?,
            client_secret: required("AZURE_CLIENT_SECRET")?,
            tenant_id: required("AZURE_TENANT_ID")?,
        },
        "identity" => LoginMode::ManagedIdentity,
        "skip" => LoginMode::Skip,
        other => bail!("Unknown AZ_LOGIN_MODE: {}", other),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(pairs: &[(&str, &str)]) -> Result<EnvConfig> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        EnvConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = from_map(&[]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 5000);
        assert_eq!(cfg.az_cli, "az");
        assert_eq!(cfg.login_mode, LoginMode::Interactive);
        assert_eq!(cfg.login_timeout_s, 120);
        assert_eq!(cfg.query_timeout_s, 60);
    }

    #[test]
    fn service_principal_requires_credentials() {
        assert!(from_map(&[("AZ_LOGIN_MODE", "service-principal")]).is_err());

        let cfg = from_map(&[
            ("AZ_LOGIN_MODE", "service-principal"),
            ("AZURE_CLIENT_ID", "app"),
            ("AZURE_CLIENT_SECRET", "s3cret"),
            ("AZURE_TENANT_ID", "tenant"),
        ])
        .unwrap();
        assert!(matches!(cfg.login_mode, LoginMode::ServicePrincipal { ref tenant_id, .. } if tenant_id == "tenant"));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let cfg = from_map(&[("AZ_QUERY_TIMEOUT_S", "0")]).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_mode_and_bad_numbers() {
        assert!(from_map(&[("AZ_LOGIN_MODE", "magic")]).is_err());
        assert!(from_map(&[("AZ_LOGIN_TIMEOUT_S", "soon")]).is_err());
        assert!(from_map(&[("BIND_ADDR", "localhost")]).is_err());
    }
}
