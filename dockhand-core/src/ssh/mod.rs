//! SSH transport for the connection pool
//!
//! Sessions are OpenSSH ControlMaster connections: `connect`
//! establishes a multiplexing master (`ssh -f -N -M`), commands run
//! over the shared socket without re-authenticating, `is_alive` maps
//! to `ssh -O check`, and `close` to `ssh -O exit`. Password
//! authentication goes through `sshpass -e` when the binary is
//! available, mirroring how interactive monitoring shells it out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{PoolError, PoolResult, SessionError, SessionResult};
use crate::pool::{CommandOutput, Connector, RemoteSession};

/// Timeout for one remote command (seconds)
const SSH_EXEC_TIMEOUT_SECS: u64 = 10;

/// Timeout for establishing the master connection (seconds)
const SSH_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Timeout for control-socket operations like `-O check` (seconds)
const SSH_CONTROL_TIMEOUT_SECS: u64 = 5;

/// Builds the argument list shared by every invocation against one
/// server's control socket
fn base_args(server: &ServerConfig, control_path: &Path, password_auth: bool) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "-o".to_string(),
        "ConnectTimeout=5".to_string(),
        "-S".to_string(),
        control_path.display().to_string(),
    ];
    if !password_auth {
        args.push("-o".to_string());
        args.push("BatchMode=yes".to_string());
    }
    if server.port != crate::config::DEFAULT_SSH_PORT {
        args.push("-p".to_string());
        args.push(server.port.to_string());
    }
    if let Some(key) = server.expanded_key_path() {
        args.push("-i".to_string());
        args.push(key);
    }
    args
}

/// `user@host`, or bare `host` when no username is configured
fn destination(server: &ServerConfig) -> String {
    server.username.as_ref().map_or_else(
        || server.host.clone(),
        |user| format!("{user}@{}", server.host),
    )
}

/// [`Connector`] implementation backed by the system `ssh` binary
pub struct SshConnector {
    servers: HashMap<String, ServerConfig>,
    sshpass_available: bool,
}

impl SshConnector {
    /// Creates a connector over the given server inventory
    ///
    /// `sshpass` availability is checked once here, only when some
    /// server is configured for password authentication.
    #[must_use]
    pub fn new(servers: impl IntoIterator<Item = ServerConfig>) -> Self {
        let servers: HashMap<String, ServerConfig> = servers
            .into_iter()
            .map(|server| (server.name.clone(), server))
            .collect();

        let needs_sshpass = servers.values().any(|s| s.password.is_some());
        let sshpass_available = needs_sshpass
            && std::process::Command::new("sshpass")
                .arg("-V")
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .is_ok();
        if needs_sshpass && !sshpass_available {
            warn!("password-auth servers configured but sshpass is not installed");
        }

        Self {
            servers,
            sshpass_available,
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, target: &str) -> PoolResult<Box<dyn RemoteSession>> {
        let server = self
            .servers
            .get(target)
            .ok_or_else(|| PoolError::UnknownTarget(target.to_string()))?;

        let control_path = std::env::temp_dir().join(format!("dockhand-{}.sock", Uuid::new_v4()));
        let use_password = server.password.is_some() && self.sshpass_available;
        let args = base_args(server, &control_path, use_password);
        let dest = destination(server);

        let mut cmd;
        if use_password {
            cmd = Command::new("sshpass");
            cmd.arg("-e").arg("ssh");
            if let Some(password) = &server.password {
                cmd.env("SSHPASS", password.expose_secret());
            }
        } else {
            cmd = Command::new("ssh");
        }
        cmd.args(&args)
            .arg("-f")
            .arg("-N")
            .arg("-M")
            .arg(&dest)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped());

        let connect_timeout = Duration::from_secs(SSH_CONNECT_TIMEOUT_SECS);
        let output = match tokio::time::timeout(connect_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PoolError::Connection {
                    target: target.to_string(),
                    message: format!("failed to spawn ssh: {e}"),
                })
            }
            Err(_) => {
                return Err(PoolError::Connection {
                    target: target.to_string(),
                    message: format!("connect timed out after {SSH_CONNECT_TIMEOUT_SECS}s"),
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PoolError::Connection {
                target: target.to_string(),
                message: stderr.trim().to_string(),
            });
        }

        debug!(%target, control_path = %control_path.display(), "ssh master established");
        Ok(Box::new(SshSession {
            destination: dest,
            control_path,
            args,
        }))
    }
}

/// One established ControlMaster connection
pub struct SshSession {
    destination: String,
    control_path: PathBuf,
    args: Vec<String>,
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn execute(&mut self, command: &str) -> SessionResult<CommandOutput> {
        let mut cmd = Command::new("ssh");
        cmd.args(&self.args)
            .arg(&self.destination)
            .arg(command)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let timeout = Duration::from_secs(SSH_EXEC_TIMEOUT_SECS);
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8(output.stdout)?,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(SessionError::Spawn(e)),
            Err(_) => Err(SessionError::Timeout(SSH_EXEC_TIMEOUT_SECS)),
        }
    }

    async fn is_alive(&mut self) -> bool {
        let mut cmd = Command::new("ssh");
        cmd.args(&self.args)
            .arg("-O")
            .arg("check")
            .arg(&self.destination)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        let timeout = Duration::from_secs(SSH_CONTROL_TIMEOUT_SECS);
        matches!(
            tokio::time::timeout(timeout, cmd.status()).await,
            Ok(Ok(status)) if status.success()
        )
    }

    fn close(&mut self) -> SessionResult<()> {
        let status = std::process::Command::new("ssh")
            .args(&self.args)
            .arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map_err(SessionError::Spawn)?;
        if !status.success() {
            // master already gone; nothing left to tear down
            debug!(destination = %self.destination, "ssh master was not running on close");
        }
        let _ = std::fs::remove_file(&self.control_path);
        Ok(())
    }
}
