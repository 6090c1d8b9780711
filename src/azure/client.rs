use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;
use tokio::process::Command;

use crate::azure::models::GraphQueryResponse;
use crate::error::ClientError;

/// How the CLI session is established before querying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginMode {
    /// Plain `az login`, may open a browser on the serving host.
    Interactive,
    ServicePrincipal {
        client_id: String,
        client_secret: String,
        tenant_id: String,
    },
    ManagedIdentity,
    /// Reuse an existing session; only checked with `az account show`.
    Skip,
}

/// One page of Resource Graph results.
#[derive(Debug, Default)]
pub struct QueryPage {
    pub records: Vec<Value>,
    pub total_records: Option<u64>,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn login(&self) -> Result<(), ClientError>;
}

#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn page(&self, query: &str, offset: usize, limit: usize) -> Result<QueryPage, ClientError>;
}

pub struct AzCliClient {
    program: String,
    login_mode: LoginMode,
    login_timeout: Duration,
    query_timeout: Duration,
}

impl AzCliClient {
    pub fn new(program: String, login_mode: LoginMode, login_timeout_secs: u64, query_timeout_secs: u64) -> Self {
        Self {
            program,
            login_mode,
            login_timeout: Duration::from_secs(login_timeout_secs),
            query_timeout: Duration::from_secs(query_timeout_secs),
        }
    }

    fn login_args(&self) -> Vec<String> {
        match &self.login_mode {
            LoginMode::Interactive => vec!["login".into()],
            LoginMode::ServicePrincipal { client_id, client_secret, tenant_id } => vec![
                "login".into(),
                "--service-principal".into(),
                "--username".into(),
                client_id.clone(),
                "--password".into(),
                client_secret.clone(),
                "--tenant".into(),
                tenant_id.clone(),
            ],
            LoginMode::ManagedIdentity => vec!["login".into(), "--identity".into()],
            LoginMode::Skip => vec!["account".into(), "show".into()],
        }
    }

    /// Runs the CLI to completion. The child is killed if the deadline passes.
    async fn run(&self, operation: &'static str, args: &[String], limit: Duration) -> Result<String, ClientError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(limit, cmd.output()).await {
            Ok(res) => res.map_err(|source| ClientError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => return Err(ClientError::Timeout { operation, limit }),
        };

        if !output.status.success() {
            return Err(ClientError::Failure {
                operation,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl AuthClient for AzCliClient {
    async fn login(&self) -> Result<(), ClientError> {
        info!("Azure login ({})...", login_mode_name(&self.login_mode));
        self.run("az login", &self.login_args(), self.login_timeout).await?;
        info!("✅ Azure login successful.");
        Ok(())
    }
}

#[async_trait]
impl QueryClient for AzCliClient {
    async fn page(&self, query: &str, offset: usize, limit: usize) -> Result<QueryPage, ClientError> {
        let args = vec![
            "graph".to_string(),
            "query".into(),
            "-q".into(),
            query.to_string(),
            "--first".into(),
            limit.to_string(),
            "--skip".into(),
            offset.to_string(),
            "--output".into(),
            "json".into(),
        ];

        let stdout = self.run("az graph query", &args, self.query_timeout).await?;
        parse_page(&stdout)
    }
}

/// Blank output means there is nothing left to read.
pub(crate) fn parse_page(stdout: &str) -> Result<QueryPage, ClientError> {
    if stdout.trim().is_empty() {
        debug!("az graph query returned no output");
        return Ok(QueryPage::default());
    }

    let resp: GraphQueryResponse = serde_json::from_str(stdout)?;
    Ok(QueryPage {
        records: resp.data,
        total_records: resp.total_records,
    })
}

fn login_mode_name(mode: &LoginMode) -> &'static str {
    match mode {
        LoginMode::Interactive => "interactive",
        LoginMode::ServicePrincipal { .. } => "service-principal",
        LoginMode::ManagedIdentity => "identity",
        LoginMode::Skip => "existing session",
    }
}
