//! Verb dispatch.
//!
//! Exactly one branch runs per invocation. Usage problems print guidance and
//! succeed; delegated failures print the error and exit 1; `serve` only comes
//! back when the bootstrap failed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::{Invocation, Verb};
use crate::config::Config;
use crate::generate::generate_content_type;
use crate::launcher::{Launcher, ProcessRunner};
use crate::scaffold::{ProjectScaffold, ScaffoldOptions};
use crate::serve::{Bootstrapper, ServeArgs, ServeError};
use crate::services::DEFAULT_SERVICES;
use crate::usage;

/// Process exit status chosen by a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::Failure => 1,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

pub struct Dispatcher {
    config: Config,
    launcher: Launcher,
}

impl Dispatcher {
    pub fn new(config: Config, runner: Arc<dyn ProcessRunner>) -> Self {
        let launcher = Launcher::new(runner, config.build.clone(), PathBuf::from("."));
        Self { config, launcher }
    }

    pub async fn dispatch(&self, invocation: &Invocation) -> Exit {
        let Some(verb) = &invocation.verb else {
            println!("{}", usage::usage());
            return Exit::Success;
        };

        match verb {
            Verb::Help => cmd_help(invocation),
            Verb::New => cmd_new(invocation),
            Verb::Generate => self.cmd_generate(invocation),
            Verb::Build => self.cmd_build(invocation).await,
            Verb::Run => self.cmd_run(invocation).await,
            Verb::Serve => self.cmd_serve(invocation).await,
            Verb::Unknown(_) => {
                println!("{}", usage::usage());
                println!("{}", usage::USAGE_HELP);
                Exit::Success
            }
        }
    }

    fn cmd_generate(&self, invocation: &Invocation) -> Exit {
        if invocation.rest.len() < 2 {
            println!("{}", usage::USAGE_GENERATE);
            return Exit::Success;
        }

        match invocation.rest[0].as_str() {
            "content" | "c" => {
                let content_dir = self.config.content_path();
                match generate_content_type(&content_dir, &invocation.rest[1..]) {
                    Ok(path) => {
                        println!("Generated content type definition {}", path.display());
                        Exit::Success
                    }
                    Err(e) => {
                        println!("{}", e);
                        Exit::Failure
                    }
                }
            }
            other => {
                println!("Generator '{}' is not implemented.", other);
                Exit::Success
            }
        }
    }

    async fn cmd_build(&self, invocation: &Invocation) -> Exit {
        match self
            .launcher
            .build(&invocation.flags.gocmd, &invocation.rest)
            .await
        {
            Ok(()) => {
                println!("Built {}", self.config.build.binary);
                Exit::Success
            }
            Err(e) => {
                println!("{}", e);
                Exit::Failure
            }
        }
    }

    async fn cmd_run(&self, invocation: &Invocation) -> Exit {
        println!("Running..");
        let services = invocation.first_arg();
        println!("services: {}", services.unwrap_or(DEFAULT_SERVICES));

        match self.launcher.run(&invocation.flags, services).await {
            Ok(()) => {
                println!("serve command executed.");
                Exit::Success
            }
            Err(e) => {
                println!("{}", e);
                Exit::Failure
            }
        }
    }

    async fn cmd_serve(&self, invocation: &Invocation) -> Exit {
        let bootstrapper = Bootstrapper::from_config(&self.config);

        match bootstrapper.serve(ServeArgs::from(invocation)).await {
            Ok(never) => match never {},
            Err(ServeError::UnknownService(e)) => {
                tracing::error!("{}", e);
                Exit::Failure
            }
            Err(ServeError::Fatal(e)) => {
                tracing::error!(kind = %e.kind, "{}", e);
                Exit::Failure
            }
        }
    }
}

fn cmd_help(invocation: &Invocation) -> Exit {
    match invocation.first_arg() {
        None => {
            println!("{}", usage::USAGE_HELP);
            println!("{}", usage::usage());
        }
        Some(command) => {
            // Unrecognised topics print nothing
            if let Some(text) = usage::topic(command) {
                println!("{}", text);
            }
        }
    }
    Exit::Success
}

fn cmd_new(invocation: &Invocation) -> Exit {
    let Some(dir) = invocation.first_arg() else {
        println!("{}", usage::USAGE_NEW);
        return Exit::Success;
    };

    let options = ScaffoldOptions {
        dev: invocation.flags.dev,
        fork: invocation.flags.fork.clone(),
    };

    match ProjectScaffold::new(PathBuf::from(dir), options).generate() {
        Ok(result) => {
            println!("{}", result.summary());
            Exit::Success
        }
        Err(e) => {
            println!("{}", e);
            Exit::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Flags;
    use crate::launcher::{CommandSpec, LaunchError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<CommandSpec>>,
        fail: bool,
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(&self, command: &CommandSpec) -> Result<(), LaunchError> {
            self.commands.lock().unwrap().push(command.clone());
            if self.fail {
                Err(LaunchError::NotFound(command.program.display().to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn invocation(args: &[&str]) -> Invocation {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Invocation::new(Flags::default(), &args)
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.data = temp_dir.path().join("data").to_string_lossy().to_string();
        config.paths.content = temp_dir.path().join("content").to_string_lossy().to_string();
        config
    }

    fn dispatcher(temp_dir: &TempDir, runner: Arc<RecordingRunner>) -> Dispatcher {
        Dispatcher::new(test_config(temp_dir), runner)
    }

    #[tokio::test]
    async fn test_usage_paths_succeed() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let dispatcher = dispatcher(&temp_dir, runner.clone());

        for args in [
            &[][..],
            &["help"][..],
            &["h", "generate"][..],
            &["help", "serve"][..],
            &["new"][..],
            &["generate", "content"][..],
            &[""][..],
            &["deploy"][..],
        ] {
            assert_eq!(dispatcher.dispatch(&invocation(args)).await, Exit::Success);
        }
        assert!(runner.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_scaffolds_project() {
        let temp_dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(&temp_dir, Arc::new(RecordingRunner::default()));
        let target = temp_dir.path().join("site");

        let exit = dispatcher
            .dispatch(&invocation(&["new", target.to_str().unwrap()]))
            .await;
        assert_eq!(exit, Exit::Success);
        assert!(target.join("ponzu.toml").exists());

        // Second run hits a non-empty directory
        let exit = dispatcher
            .dispatch(&invocation(&["new", target.to_str().unwrap()]))
            .await;
        assert_eq!(exit, Exit::Failure);
    }

    #[tokio::test]
    async fn test_generate_branches() {
        let temp_dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(&temp_dir, Arc::new(RecordingRunner::default()));

        let exit = dispatcher
            .dispatch(&invocation(&["gen", "c", "post", "title:string"]))
            .await;
        assert_eq!(exit, Exit::Success);
        assert!(temp_dir.path().join("content/post.toml").exists());

        let exit = dispatcher
            .dispatch(&invocation(&["g", "content", "post", "title:bogus"]))
            .await;
        assert_eq!(exit, Exit::Failure);

        let exit = dispatcher
            .dispatch(&invocation(&["generate", "plugin", "thing"]))
            .await;
        assert_eq!(exit, Exit::Success);
    }

    #[tokio::test]
    async fn test_build_and_run_delegate() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let dispatcher = dispatcher(&temp_dir, runner.clone());

        assert_eq!(
            dispatcher.dispatch(&invocation(&["build", "-v"])).await,
            Exit::Success
        );
        assert_eq!(dispatcher.dispatch(&invocation(&["run"])).await, Exit::Success);

        let commands = runner.commands.lock().unwrap();
        assert_eq!(commands[0].args, ["build", "-o", "ponzu-server", "-v", "./cmd/ponzu"]);
        assert_eq!(
            commands[1].args.join(" "),
            "--port=8080 --httpsport=443 --https=false serve admin,api"
        );
    }

    #[tokio::test]
    async fn test_delegated_failures_exit_one() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        });
        let dispatcher = dispatcher(&temp_dir, runner);

        assert_eq!(dispatcher.dispatch(&invocation(&["build"])).await, Exit::Failure);
        assert_eq!(
            dispatcher.dispatch(&invocation(&["run", "api"])).await,
            Exit::Failure
        );
    }

    #[tokio::test]
    async fn test_serve_unknown_service_persists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let dispatcher = Dispatcher::new(config.clone(), Arc::new(RecordingRunner::default()));

        let exit = dispatcher
            .dispatch(&invocation(&["serve", "admin,api,bogus"]))
            .await;
        assert_eq!(exit, Exit::Failure);
        assert!(!config.store_path().exists());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Exit::Success.code(), 0);
        assert_eq!(Exit::Failure.code(), 1);
    }
}
