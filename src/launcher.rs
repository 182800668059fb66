//! Process launcher for `ponzu build` and `ponzu run`.
//!
//! Both verbs delegate to an external process and block until it exits.
//! Process execution is behind a trait so the derived command lines can be
//! checked without spawning anything.

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::cli::Flags;
use crate::config::BuildConfig;
use crate::services::DEFAULT_SERVICES;

/// Errors from launching external processes
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {status}")]
    Exited { program: String, status: ExitStatus },
}

/// A fully derived command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Trait abstracting process execution for testability
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Start `command` with inherited stdout/stderr and wait for it to exit.
    /// A non-zero exit is an error.
    async fn run(&self, command: &CommandSpec) -> Result<(), LaunchError>;
}

/// Real implementation using `tokio::process`
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<(), LaunchError> {
        let program = command.program.display().to_string();

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LaunchError::NotFound(program.clone())
            } else {
                LaunchError::Spawn {
                    program: program.clone(),
                    source,
                }
            }
        })?;

        tracing::info!(command = %command, pid = child.id(), "Started process");

        let status = child.wait().await.map_err(|source| LaunchError::Wait {
            program: program.clone(),
            source,
        })?;

        tracing::info!(command = %command, %status, "Process exited");

        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::Exited { program, status })
        }
    }
}

/// Child-process arguments for `ponzu run`.
///
/// `--devhttps` wins over `--https`; services default to `admin,api`.
pub fn run_args(flags: &Flags, services: Option<&str>) -> Vec<String> {
    let tls_flag = if flags.dev_https {
        "--devhttps"
    } else if flags.https {
        "--https"
    } else {
        "--https=false"
    };

    vec![
        format!("--port={}", flags.port),
        format!("--httpsport={}", flags.https_port),
        tls_flag.to_string(),
        "serve".to_string(),
        services.unwrap_or(DEFAULT_SERVICES).to_string(),
    ]
}

/// Builds and runs the server binary of the project in `project_dir`
pub struct Launcher {
    runner: Arc<dyn ProcessRunner>,
    build: BuildConfig,
    project_dir: PathBuf,
}

impl Launcher {
    pub fn new(runner: Arc<dyn ProcessRunner>, build: BuildConfig, project_dir: PathBuf) -> Self {
        Self {
            runner,
            build,
            project_dir,
        }
    }

    /// `<gocmd> build -o <binary> [extra...] <package>`
    pub fn build_command(&self, gocmd: &str, extra: &[String]) -> CommandSpec {
        let mut args = vec![
            "build".to_string(),
            "-o".to_string(),
            self.build.binary.clone(),
        ];
        args.extend(extra.iter().cloned());
        args.push(self.build.package.clone());

        CommandSpec {
            program: PathBuf::from(gocmd),
            args,
            cwd: Some(self.project_dir.clone()),
        }
    }

    pub fn run_command(&self, flags: &Flags, services: Option<&str>) -> CommandSpec {
        CommandSpec {
            program: self.project_dir.join(&self.build.binary),
            args: run_args(flags, services),
            cwd: Some(self.project_dir.clone()),
        }
    }

    pub async fn build(&self, gocmd: &str, extra: &[String]) -> Result<(), LaunchError> {
        let command = self.build_command(gocmd, extra);
        tracing::info!(command = %command, "Building server");
        self.runner.run(&command).await
    }

    pub async fn run(&self, flags: &Flags, services: Option<&str>) -> Result<(), LaunchError> {
        self.runner.run(&self.run_command(flags, services)).await
    }
}
