//! az CLI wrapper
//!
//! Wraps the Azure CLI for control-plane operations. Credentials come from
//! the CLI's own login session (`az login`, managed identity, or service
//! principal environment variables).

use crate::error::{AzureError, Result, is_not_found};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone)]
enum Arg {
    Plain(String),
    Secret(String),
}

/// Argument list for one az invocation; secret values are redacted when displayed
#[derive(Debug, Clone, Default)]
pub struct AzArgs {
    args: Vec<Arg>,
}

impl AzArgs {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: command.into_iter().map(|s| Arg::Plain(s.into())).collect(),
        }
    }

    pub fn flag(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(name.to_string()));
        self.args.push(Arg::Plain(value.into()));
        self
    }

    pub fn flag_opt(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.flag(name, v),
            None => self,
        }
    }

    pub fn switch(mut self, name: &str) -> Self {
        self.args.push(Arg::Plain(name.to_string()));
        self
    }

    pub fn secret(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(name.to_string()));
        self.args.push(Arg::Secret(value.into()));
        self
    }

    /// Values passed to the process
    pub fn to_args(&self) -> Vec<&str> {
        self.args
            .iter()
            .map(|a| match a {
                Arg::Plain(s) | Arg::Secret(s) => s.as_str(),
            })
            .collect()
    }
}

impl std::fmt::Display for AzArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<&str> = self
            .args
            .iter()
            .map(|a| match a {
                Arg::Plain(s) => s.as_str(),
                Arg::Secret(_) => "***",
            })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

/// az CLI wrapper
#[derive(Debug, Clone)]
pub struct AzCli {
    program: String,
    subscription: Option<String>,
}

impl AzCli {
    pub fn new(subscription: Option<String>) -> Self {
        Self {
            program: "az".to_string(),
            subscription,
        }
    }

    /// Use a different az executable (e.g. a pinned install)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    /// Check that az is installed and logged in
    pub async fn check_auth(&self) -> Result<AzAccount> {
        let which = Command::new("which").arg(&self.program).output().await?;
        if !which.status.success() {
            return Err(AzureError::AzNotFound);
        }

        let output = self
            .run(&AzArgs::new(["account", "show"]))
            .await
            .map_err(|e| match e {
                AzureError::CommandFailed(stderr) => AzureError::AuthenticationFailed(stderr),
                other => other,
            })?;

        let account: AzAccount = serde_json::from_str(&output)?;
        Ok(account)
    }

    /// Run an az command with JSON output and return stdout
    pub async fn run(&self, args: &AzArgs) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args.to_args());
        if let Some(subscription) = &self.subscription {
            cmd.arg("--subscription").arg(subscription);
        }
        cmd.arg("--output").arg("json");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, args);

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a create/update command and extract the resulting resource id
    pub async fn apply(&self, args: &AzArgs) -> Result<String> {
        let output = self.run(args).await?;
        resource_id(&output)
    }

    /// Run a `show` command; `Ok(None)` when the resource does not exist
    pub async fn show(&self, args: &AzArgs) -> Result<Option<String>> {
        match self.run(args).await {
            Ok(output) => resource_id(&output).map(Some),
            Err(AzureError::CommandFailed(stderr)) if is_not_found(&stderr) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Extract the ARM resource id from az JSON output.
///
/// `az network vnet create` wraps the resource in `newVNet`.
pub fn resource_id(output: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(output)?;
    let id = value
        .get("id")
        .or_else(|| value.get("newVNet").and_then(|v| v.get("id")))
        .and_then(|v| v.as_str());
    match id {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(AzureError::MissingId(truncate(output, 200))),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Active account reported by `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzAccount {
    /// Subscription id
    pub id: String,

    /// Subscription display name
    pub name: String,

    #[serde(rename = "tenantId")]
    pub tenant_id: Option<String>,

    pub user: Option<AzUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzUser {
    pub name: String,

    #[serde(rename = "type")]
    pub user_type: String,
}
