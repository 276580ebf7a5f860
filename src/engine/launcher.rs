// * Engine Launcher
// * Runs the scrape engine as a child process of the registry

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{error, info, warn};

// * Shell used to interpret the engine command line
const SHELL: &str = "/bin/sh";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn engine command {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine command {command:?} exited with {status}")]
    Exited { command: String, status: String },
}

/// Type alias for async launch result
pub type LaunchFuture = Pin<Box<dyn Future<Output = Result<(), LaunchError>> + Send>>;

/// Starts the engine and resolves when it stops
pub trait EngineLauncher: Send + Sync {
    fn launch(&self) -> LaunchFuture;
}

/// Launches the engine through `/bin/sh -c "exec <command>"`.
///
/// The shell execs the engine, so the child pid is the engine itself and
/// dropping the launch future kills it. Output is streamed line by line into
/// the log while the engine runs.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    command: String,
}

impl ShellLauncher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    // * Single place the child process is configured
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(SHELL);
        cmd.arg("-c")
            .arg(format!("exec {}", self.command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    pub async fn run(&self) -> Result<(), LaunchError> {
        info!(command = %self.command, "Launching engine");

        let spawn_error = |source| LaunchError::Spawn {
            command: self.command.clone(),
            source,
        };

        let mut child = self.build_command().spawn().map_err(spawn_error)?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!("engine stdout: {}", line);
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("engine stderr: {}", line);
                }
            });
        }

        let status = child.wait().await.map_err(spawn_error)?;

        if status.success() {
            info!("Engine exited cleanly");
            Ok(())
        } else {
            error!(status = %status, "Engine exited with failure");
            Err(LaunchError::Exited {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}

impl EngineLauncher for ShellLauncher {
    fn launch(&self) -> LaunchFuture {
        let launcher = self.clone();
        Box::pin(async move { launcher.run().await })
    }
}
