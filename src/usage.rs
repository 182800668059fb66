//! Usage text printed by `ponzu help` and the usage-error paths.

pub const USAGE_HEADER: &str = "
$ ponzu [flags] command <params>

Ponzu scaffolds content server projects, generates content type definitions,
compiles the server binary and runs its admin and API services over HTTP, with
optional TLS.

COMMANDS:
";

pub const USAGE_HELP: &str = "
help, h (command)

	Help command will print the usage for Ponzu, or if a command is entered, it
	will show only the usage for that specific command.

	Example:
	$ ponzu help generate
";

pub const USAGE_NEW: &str = "
new <directory>

	Creates a project directory of the name supplied as a parameter immediately
	following the 'new' option. The project contains the ponzu.toml config, an
	empty content directory and the server package layout.

	Example:
	$ ponzu new myProject
	> New ponzu project created at myProject
";

pub const USAGE_GENERATE: &str = "
generate, gen, g <generator type (,...fields)>

	Generate boilerplate code for various Ponzu components, such as 'content'.

	Example:
	$ ponzu gen content review title:string body:string:richtext rating:int
	> Generated content type definition content/review.toml

	The command above will define the type 'Review' with the fields 'title'
	(string), 'body' (string, edited with a richtext editor) and 'rating' (int).

	Field kinds: string, int, float, bool, time, and []kind for lists.
";

pub const USAGE_BUILD: &str = "
[--gocmd=go] build

	From within your Ponzu project directory, running build will compile the
	server binary (ponzu-server) from the configured package. Arguments after
	'build' are passed to the compiler.

	Example:
	$ ponzu build
	(or)
	$ ponzu --gocmd=go1.22rc1 build
";

pub const USAGE_RUN: &str = "
[[--port=8080] [--https|--devhttps]] run <service(,service)>

	Starts the 'ponzu-server' binary with the given flags and services. The
	services are 'admin' and 'api'; both run when none are given.

	Example:
	$ ponzu run
	(or)
	$ ponzu --port=8080 --https run admin,api
	(or)
	$ ponzu run admin
	(or)
	$ ponzu --port=8888 run api

	Defaults to '--port=8080 --httpsport=443 run admin,api'. Use --https to
	serve production TLS on --httpsport, or --devhttps to serve a self-signed
	certificate on https://localhost:10443.
";

/// Full usage: header followed by every command section.
pub fn usage() -> String {
    [USAGE_HEADER, USAGE_NEW, USAGE_GENERATE, USAGE_BUILD, USAGE_RUN].concat()
}

/// Usage for a single `help <command>` topic, if it names one.
pub fn topic(command: &str) -> Option<&'static str> {
    match command {
        "new" => Some(USAGE_NEW),
        "generate" | "gen" | "g" => Some(USAGE_GENERATE),
        "build" => Some(USAGE_BUILD),
        "run" => Some(USAGE_RUN),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_contains_every_section() {
        let text = usage();
        assert!(text.starts_with(USAGE_HEADER));
        for section in [USAGE_NEW, USAGE_GENERATE, USAGE_BUILD, USAGE_RUN] {
            assert!(text.contains(section));
        }
        assert!(!text.contains(USAGE_HELP));
    }

    #[test]
    fn test_topics() {
        assert_eq!(topic("new"), Some(USAGE_NEW));
        assert_eq!(topic("gen"), Some(USAGE_GENERATE));
        assert_eq!(topic("g"), Some(USAGE_GENERATE));
        assert_eq!(topic("build"), Some(USAGE_BUILD));
        assert_eq!(topic("run"), Some(USAGE_RUN));
        assert_eq!(topic("serve"), None);
    }
}
