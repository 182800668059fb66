//! Command-line parsing.
//!
//! Flags are only recognised ahead of the verb. The verb and everything after
//! it are collected verbatim so `build` can pass flag-looking arguments on to
//! the compiler.

use clap::{ArgAction, Parser};

use crate::tls::TlsMode;

#[derive(Parser, Debug, Clone)]
#[command(name = "ponzu")]
#[command(about = "Scaffold, build and serve a ponzu content server")]
#[command(version)]
pub struct Cli {
    /// port for ponzu to bind its HTTP listener
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// port for ponzu to bind its HTTPS listener
    #[arg(long, default_value_t = 443)]
    pub httpsport: u16,

    /// enable automatic TLS/SSL certificate management
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub https: bool,

    /// [dev environment] enable self-signed TLS/SSL on localhost
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub devhttps: bool,

    /// modify environment for ponzu core development
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub dev: bool,

    /// modify repo source for ponzu core development
    #[arg(long)]
    pub fork: Option<String>,

    /// custom compiler command used by `build`
    #[arg(long, default_value = "go")]
    pub gocmd: String,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Verb followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Top-level verb selected by the first positional argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Help,
    New,
    Generate,
    Build,
    Run,
    Serve,
    /// Anything else, including an explicit empty string
    Unknown(String),
}

impl Verb {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "help" | "h" => Verb::Help,
            "new" => Verb::New,
            "generate" | "gen" | "g" => Verb::Generate,
            "build" => Verb::Build,
            "run" => Verb::Run,
            "serve" | "s" => Verb::Serve,
            other => Verb::Unknown(other.to_string()),
        }
    }
}

/// Parsed flags, immutable once the invocation is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flags {
    pub port: u16,
    pub https_port: u16,
    pub https: bool,
    pub dev_https: bool,
    pub dev: bool,
    pub fork: Option<String>,
    pub gocmd: String,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            port: 8080,
            https_port: 443,
            https: false,
            dev_https: false,
            dev: false,
            fork: None,
            gocmd: "go".to_string(),
        }
    }
}

impl Flags {
    pub fn tls_mode(&self) -> TlsMode {
        TlsMode::resolve(self.dev_https, self.https)
    }
}

/// A single run of the tool: one verb, its flags and the remaining arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// `None` when no positional argument was given at all
    pub verb: Option<Verb>,
    pub flags: Flags,
    /// Positional arguments following the verb, in order
    pub rest: Vec<String>,
}

impl Invocation {
    pub fn new(flags: Flags, args: &[String]) -> Self {
        let verb = args.first().map(|raw| Verb::parse(raw));
        let rest = args.iter().skip(1).cloned().collect();
        Self { verb, flags, rest }
    }

    /// First positional argument after the verb
    pub fn first_arg(&self) -> Option<&str> {
        self.rest.first().map(String::as_str)
    }
}

impl From<&Cli> for Invocation {
    fn from(cli: &Cli) -> Self {
        let flags = Flags {
            port: cli.port,
            https_port: cli.httpsport,
            https: cli.https,
            dev_https: cli.devhttps,
            dev: cli.dev,
            fork: cli.fork.clone().filter(|fork| !fork.is_empty()),
            gocmd: cli.gocmd.clone(),
        };
        Invocation::new(flags, &cli.args)
    }
}
