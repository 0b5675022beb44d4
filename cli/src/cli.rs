//! CLI argument parsing with clap derive, and top-level exit-code
//! resolution.
//!
//! Verbs are free-form positionals rather than clap subcommands: the filter
//! flags apply uniformly across verbs, and an unknown verb must map to its
//! own exit code instead of clap's usage failure.

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory as _, Parser};

use crate::commands::{self, Invocation};
use crate::error::{CommandError, exit_codes};
use crate::filter::{Filter, FilterKey};
use crate::output::OutputContext;

const AFTER_HELP: &str = "\
Commands:
    show                           List slots
    install <binary> <config>      Install a binary on empty slots
    assign <binary> <config>       Assign a binary to selected slots
    clear                          Clear the assignment of selected slots
    upgrade <versions>             Upgrade binary and/or config versions
    terminate                      Terminate selected slots
    start | stop | restart         Drive the slot lifecycle
    reset-to-actual                Reset expected state to the actual state
    ssh                            Open a shell on the first selected slot
    agent [show]                   List agents
    agent add [instance-type]      Provision new agents

Notes:
    A filter is required for all commands except show and install.
    HOST, BINARY and CONFIG filter values are globs.
    BINARY format is groupId:artifactId[:packaging[:classifier]]:version.
    CONFIG format is @env:component[:pools]:version.";

/// Manage slots and agents through a coordinator
#[derive(Debug, Parser)]
#[command(
    name = "flotilla",
    version,
    disable_version_flag = true,
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Coordinator address
    #[arg(long, value_name = "COORDINATOR", env = "FLOTILLA_COORDINATOR")]
    pub coordinator: Option<String>,

    /// Print debug traces to stderr
    #[arg(long)]
    pub debug: bool,

    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Select slots with a given binary
    #[arg(short = 'b', long = "binary", value_name = "BINARY")]
    pub binary: Vec<String>,

    /// Select slots with a given configuration
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    pub config: Vec<String>,

    /// Select slots on a given host
    #[arg(short = 'i', long = "host", value_name = "HOST")]
    pub host: Vec<String>,

    /// Select slots at a given IP address
    #[arg(short = 'I', long = "ip", value_name = "IP")]
    pub ip: Vec<String>,

    /// Select the slot with a given uuid
    #[arg(short = 'u', long = "uuid", value_name = "SLOT_UUID")]
    pub uuid: Vec<String>,

    /// Select 'r{unning}', 's{topped}', 'u{nassigned}' or 'unknown' slots
    #[arg(short = 's', long = "state", value_name = "STATE")]
    pub state: Vec<String>,

    /// Number of agents to provision (agent add)
    #[arg(long, value_name = "COUNT")]
    pub count: Option<u32>,

    /// Availability zone to provision agents in (agent add)
    #[arg(long, value_name = "ZONE")]
    pub availability_zone: Option<String>,

    /// The ssh command to use (overrides FLOTILLA_SSH_COMMAND)
    #[arg(short = 'x', long = "ssh-command", value_name = "SSH_COMMAND")]
    pub ssh_command: Option<String>,

    /// Command verb and its arguments
    #[arg(value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Finalize parsed flags into an immutable invocation.
    ///
    /// Filter keys enter in a fixed order (binary, config, host, ip, uuid,
    /// state) so the query string never depends on flag position.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an unrecognized state value.
    pub fn into_invocation(self) -> Result<Invocation, CommandError> {
        let mut filter = Filter::new();
        for value in self.binary {
            filter.add(FilterKey::Binary, value);
        }
        for value in self.config {
            filter.add(FilterKey::Config, value);
        }
        for value in self.host {
            filter.add(FilterKey::Host, value);
        }
        for value in self.ip {
            filter.add(FilterKey::Ip, value);
        }
        for value in self.uuid {
            filter.add(FilterKey::Uuid, value);
        }
        for value in &self.state {
            filter.add(FilterKey::State, canonical_state(value)?);
        }
        Ok(Invocation {
            command: self.command,
            filter,
            coordinator: self.coordinator,
            debug: self.debug,
            count: self.count,
            availability_zone: self.availability_zone,
            ssh_command: self.ssh_command,
        })
    }
}

/// Map a state flag value, including its single-letter aliases, onto the
/// coordinator's lowercase state word.
fn canonical_state(raw: &str) -> Result<&'static str, CommandError> {
    match raw {
        "running" | "r" => Ok("running"),
        "stopped" | "s" => Ok("stopped"),
        "unassigned" | "u" => Ok("unassigned"),
        "unknown" => Ok("unknown"),
        other => Err(CommandError::InvalidUsage(format!(
            "Invalid state '{other}'. Valid states are r{{unning}}, s{{topped}}, u{{nassigned}} and unknown."
        ))),
    }
}

/// Parse the process arguments and run one invocation, returning the exit
/// code for [`std::process::exit`].
#[must_use]
pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return finish_parse_error(&err),
    };
    let debug = cli.debug;

    let invocation = match cli.into_invocation() {
        Ok(invocation) => invocation,
        Err(err) => return fail(&err, debug),
    };

    if invocation.debug {
        echo_invocation(&invocation);
    }

    if invocation.command.is_empty() {
        print_usage();
        return exit_codes::SUCCESS;
    }

    let ctx = OutputContext::detect();
    match commands::execute(&invocation, &ctx) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => fail(&err, debug),
    }
}

/// Help and version requests exit cleanly; real parse failures print one
/// line plus the usage banner and exit as usage errors.
fn finish_parse_error(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            exit_codes::SUCCESS
        }
        _ => {
            let rendered = err.to_string();
            let first_line = rendered.lines().next().unwrap_or("invalid arguments");
            println!("{first_line}");
            println!();
            print_usage();
            exit_codes::INVALID_USAGE
        }
    }
}

/// Print the error's single user-facing line, reprint usage for usage
/// errors, and resolve the exit code.
fn fail(err: &CommandError, debug: bool) -> i32 {
    println!("{err}");
    if matches!(err, CommandError::InvalidUsage(_)) {
        println!();
        print_usage();
    }
    let code = err.exit_code();
    if debug {
        eprintln!("exit: {code}");
    }
    code
}

fn print_usage() {
    let mut usage = Cli::command();
    let _ = usage.print_help();
}

/// Echo the effective coordinator and filter pairs to stderr.
fn echo_invocation(invocation: &Invocation) {
    if let Some(coordinator) = &invocation.coordinator {
        eprintln!("coordinator={coordinator}");
    }
    for (key, values) in invocation.filter.entries() {
        for value in values {
            eprintln!("{}={value}", key.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments parse")
    }

    #[test]
    fn test_canonical_state_accepts_full_words_and_aliases() {
        assert_eq!(canonical_state("running").expect("valid"), "running");
        assert_eq!(canonical_state("r").expect("valid"), "running");
        assert_eq!(canonical_state("stopped").expect("valid"), "stopped");
        assert_eq!(canonical_state("s").expect("valid"), "stopped");
        assert_eq!(canonical_state("unassigned").expect("valid"), "unassigned");
        assert_eq!(canonical_state("u").expect("valid"), "unassigned");
        assert_eq!(canonical_state("unknown").expect("valid"), "unknown");
    }

    #[test]
    fn test_canonical_state_rejects_unrecognized_values() {
        let err = canonical_state("draining").expect_err("invalid state");
        assert!(matches!(err, CommandError::InvalidUsage(_)));
        assert!(err.to_string().contains("draining"));
    }

    #[test]
    fn test_command_collects_verb_words_and_arguments() {
        let cli = parse(&["flotilla", "agent", "add", "m1.large"]);
        assert_eq!(cli.command, ["agent", "add", "m1.large"]);
    }

    #[test]
    fn test_filter_flags_may_follow_the_verb() {
        let cli = parse(&["flotilla", "show", "-b", "com.example:web:1.0"]);
        assert_eq!(cli.command, ["show"]);
        assert_eq!(cli.binary, ["com.example:web:1.0"]);
    }

    #[test]
    fn test_repeated_flags_accumulate_in_order() {
        let cli = parse(&["flotilla", "-i", "h1", "-i", "h2", "show"]);
        assert_eq!(cli.host, ["h1", "h2"]);
    }

    #[test]
    fn test_into_invocation_emits_keys_in_fixed_order() {
        let cli = parse(&["flotilla", "-s", "running", "-b", "x", "show"]);
        let invocation = cli.into_invocation().expect("state is valid");
        assert_eq!(invocation.filter.serialize(), "binary=x&state=running");
    }

    #[test]
    fn test_into_invocation_canonicalizes_state_aliases() {
        let cli = parse(&["flotilla", "-s", "r", "show"]);
        let invocation = cli.into_invocation().expect("alias is valid");
        assert_eq!(invocation.filter.serialize(), "state=running");
    }

    #[test]
    fn test_into_invocation_rejects_bad_state() {
        let cli = parse(&["flotilla", "-s", "bogus", "show"]);
        let err = cli.into_invocation().expect_err("invalid state");
        assert!(matches!(err, CommandError::InvalidUsage(_)));
    }

    #[test]
    fn test_no_flags_yields_empty_filter() {
        let cli = parse(&["flotilla", "terminate"]);
        let invocation = cli.into_invocation().expect("no states to validate");
        assert!(invocation.filter.is_empty());
    }

    #[test]
    fn test_version_flag_maps_to_version_action() {
        let err = Cli::try_parse_from(["flotilla", "-v"]).expect_err("version exits parse");
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_help_flag_maps_to_help_action() {
        let err = Cli::try_parse_from(["flotilla", "--help"]).expect_err("help exits parse");
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_count_must_be_numeric() {
        let err = Cli::try_parse_from(["flotilla", "--count", "three", "agent", "add"])
            .expect_err("non-numeric count");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }
}
