//! Command registry: verb resolution, per-verb contracts, validation, and
//! dispatch to the coordinator.

use serde::Serialize;

use crate::coordinator::{CoordinatorClient, CoordinatorRequest, Method, RequestBody};
use crate::error::CommandError;
use crate::filter::{Filter, FilterKey};
use crate::output::OutputContext;
use crate::presenter;
use crate::records::ResourceKind;
use crate::ssh;

/// Everything one invocation needs, finalized after argument parsing.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Verb word(s) followed by positional arguments.
    pub command: Vec<String>,
    pub filter: Filter,
    pub coordinator: Option<String>,
    pub debug: bool,
    pub count: Option<u32>,
    pub availability_zone: Option<String>,
    pub ssh_command: Option<String>,
}

/// Command verbs. Closed registry: adding a variant forces every match in
/// this module to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Show,
    Install,
    Assign,
    Clear,
    Upgrade,
    Terminate,
    Start,
    Stop,
    Restart,
    ResetToActual,
    Ssh,
    AgentShow,
    AgentAdd,
}

/// Whether a verb requires, tolerates, or rejects a selector filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRule {
    Optional,
    Required,
    Forbidden,
}

/// The fixed contract of one verb: arity, filter rule, request shape, and
/// the record type the reply decodes into.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub filter_rule: FilterRule,
    pub method: Method,
    pub sub_path: Option<&'static str>,
    pub kind: ResourceKind,
}

impl Verb {
    pub const ALL: [Verb; 13] = [
        Verb::Show,
        Verb::Install,
        Verb::Assign,
        Verb::Clear,
        Verb::Upgrade,
        Verb::Terminate,
        Verb::Start,
        Verb::Stop,
        Verb::Restart,
        Verb::ResetToActual,
        Verb::Ssh,
        Verb::AgentShow,
        Verb::AgentAdd,
    ];

    /// Resolve the verb at the front of the positional arguments, returning
    /// it together with the remaining arguments.
    ///
    /// `agent` is a compound verb with `show` and `add` sub-verbs; a bare
    /// `agent` means `agent show`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnsupportedCommand`] for anything outside the
    /// registry.
    pub fn resolve(command: &[String]) -> Result<(Self, &[String]), CommandError> {
        let Some((word, rest)) = command.split_first() else {
            return Err(CommandError::UnsupportedCommand(String::new()));
        };
        match word.as_str() {
            "show" => Ok((Self::Show, rest)),
            "install" => Ok((Self::Install, rest)),
            "assign" => Ok((Self::Assign, rest)),
            "clear" => Ok((Self::Clear, rest)),
            "upgrade" => Ok((Self::Upgrade, rest)),
            "terminate" => Ok((Self::Terminate, rest)),
            "start" => Ok((Self::Start, rest)),
            "stop" => Ok((Self::Stop, rest)),
            "restart" => Ok((Self::Restart, rest)),
            "reset-to-actual" => Ok((Self::ResetToActual, rest)),
            "ssh" => Ok((Self::Ssh, rest)),
            "agent" => match rest.split_first() {
                None => Ok((Self::AgentShow, rest)),
                Some((sub, sub_rest)) if sub == "show" => Ok((Self::AgentShow, sub_rest)),
                Some((sub, sub_rest)) if sub == "add" => Ok((Self::AgentAdd, sub_rest)),
                Some((sub, _)) => Err(CommandError::UnsupportedCommand(format!("agent {sub}"))),
            },
            other => Err(CommandError::UnsupportedCommand(other.to_string())),
        }
    }

    /// The registry row for this verb.
    #[must_use]
    pub fn spec(self) -> CommandSpec {
        match self {
            Self::Show => CommandSpec {
                name: "show",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Optional,
                method: Method::Get,
                sub_path: None,
                kind: ResourceKind::Slot,
            },
            Self::Install => CommandSpec {
                name: "install",
                min_args: 2,
                max_args: 2,
                filter_rule: FilterRule::Optional,
                method: Method::Post,
                sub_path: None,
                kind: ResourceKind::Slot,
            },
            Self::Assign => CommandSpec {
                name: "assign",
                min_args: 2,
                max_args: 2,
                filter_rule: FilterRule::Required,
                method: Method::Put,
                sub_path: Some("assignment"),
                kind: ResourceKind::Slot,
            },
            Self::Clear => CommandSpec {
                name: "clear",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Delete,
                sub_path: Some("assignment"),
                kind: ResourceKind::Slot,
            },
            Self::Upgrade => CommandSpec {
                name: "upgrade",
                min_args: 1,
                max_args: 2,
                filter_rule: FilterRule::Required,
                method: Method::Post,
                sub_path: Some("assignment"),
                kind: ResourceKind::Slot,
            },
            Self::Terminate => CommandSpec {
                name: "terminate",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Delete,
                sub_path: None,
                kind: ResourceKind::Slot,
            },
            Self::Start => CommandSpec {
                name: "start",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Put,
                sub_path: Some("lifecycle"),
                kind: ResourceKind::Slot,
            },
            Self::Stop => CommandSpec {
                name: "stop",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Put,
                sub_path: Some("lifecycle"),
                kind: ResourceKind::Slot,
            },
            Self::Restart => CommandSpec {
                name: "restart",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Put,
                sub_path: Some("lifecycle"),
                kind: ResourceKind::Slot,
            },
            Self::ResetToActual => CommandSpec {
                name: "reset-to-actual",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Delete,
                sub_path: Some("expected-state"),
                kind: ResourceKind::Slot,
            },
            Self::Ssh => CommandSpec {
                name: "ssh",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Required,
                method: Method::Get,
                sub_path: None,
                kind: ResourceKind::Slot,
            },
            Self::AgentShow => CommandSpec {
                name: "agent show",
                min_args: 0,
                max_args: 0,
                filter_rule: FilterRule::Forbidden,
                method: Method::Get,
                sub_path: None,
                kind: ResourceKind::Agent,
            },
            Self::AgentAdd => CommandSpec {
                name: "agent add",
                min_args: 0,
                max_args: 1,
                filter_rule: FilterRule::Forbidden,
                method: Method::Post,
                sub_path: None,
                kind: ResourceKind::Agent,
            },
        }
    }
}

/// Binary plus config pair sent by install and assign.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Assignment {
    pub binary: String,
    pub config: String,
}

impl Assignment {
    /// Split two positional arguments into binary and config. A
    /// `@`-prefixed argument is always the config (kept verbatim, including
    /// the `@`); otherwise position decides.
    #[must_use]
    pub fn from_args(first: &str, second: &str) -> Self {
        if first.starts_with('@') {
            Self {
                binary: second.to_string(),
                config: first.to_string(),
            }
        } else {
            Self {
                binary: first.to_string(),
                config: second.to_string(),
            }
        }
    }
}

/// Version pair sent by upgrade. At least one side is present.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeVersions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_version: Option<String>,
}

impl UpgradeVersions {
    /// Split one or two version tokens. A `@`-prefixed token names the
    /// config version (the `@` is stripped); otherwise position decides.
    #[must_use]
    pub fn from_args(args: &[String]) -> Self {
        let (binary, config) = match args {
            [only] if only.starts_with('@') => (None, Some(only.as_str())),
            [only] => (Some(only.as_str()), None),
            [first, second] if first.starts_with('@') => {
                (Some(second.as_str()), Some(first.as_str()))
            }
            [first, second] => (Some(first.as_str()), Some(second.as_str())),
            _ => (None, None),
        };
        Self {
            binary_version: binary.map(str::to_string),
            config_version: config.map(|version| {
                version.strip_prefix('@').unwrap_or(version).to_string()
            }),
        }
    }
}

/// Provisioning request sent by agent add.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentProvisioning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

/// Validate and execute one invocation end to end.
///
/// Validation runs strictly before any network traffic, in fixed order:
/// verb resolution, coordinator presence, arity, filter rule.
///
/// # Errors
///
/// The full [`CommandError`] taxonomy: registry and usage violations from
/// validation, then transport, server, decode, and no-resource failures
/// from the coordinator exchange.
pub fn execute(invocation: &Invocation, ctx: &OutputContext) -> Result<(), CommandError> {
    let (verb, args) = Verb::resolve(&invocation.command)?;
    let spec = verb.spec();

    let coordinator = invocation
        .coordinator
        .as_deref()
        .filter(|address| !address.trim().is_empty())
        .ok_or_else(|| {
            CommandError::InvalidUsage(
                "You must set the coordinator address by passing --coordinator COORDINATOR \
                 or by setting the FLOTILLA_COORDINATOR environment variable."
                    .to_string(),
            )
        })?;

    if args.len() < spec.min_args || args.len() > spec.max_args {
        return Err(CommandError::InvalidUsage(arity_message(verb)));
    }

    match spec.filter_rule {
        FilterRule::Required if invocation.filter.is_empty() => {
            return Err(CommandError::InvalidUsage(format!(
                "You must specify a filter for {}.",
                spec.name
            )));
        }
        FilterRule::Forbidden if !invocation.filter.is_empty() => {
            return Err(CommandError::InvalidUsage(format!(
                "You can not specify a filter for {}.",
                spec.name
            )));
        }
        _ => {}
    }

    let client = CoordinatorClient::new(coordinator, invocation.debug);

    if verb == Verb::Ssh {
        return ssh::run(&client, &invocation.filter, invocation.ssh_command.as_deref());
    }

    let query = match verb {
        Verb::AgentAdd => {
            let mut provision_query = Filter::new();
            provision_query.add(
                FilterKey::Count,
                invocation.count.unwrap_or(1).to_string(),
            );
            provision_query.serialize()
        }
        _ => invocation.filter.serialize(),
    };

    let request = CoordinatorRequest {
        method: spec.method,
        kind: spec.kind,
        sub_path: spec.sub_path,
        query,
        body: build_body(verb, args, invocation)?,
    };

    match spec.kind {
        ResourceKind::Slot => {
            let slots = client.fetch_slots(&request)?;
            presenter::display_slots(ctx, slots);
        }
        ResourceKind::Agent => {
            let agents = client.fetch_agents(&request)?;
            presenter::display_agents(ctx, agents);
        }
    }
    Ok(())
}

fn arity_message(verb: Verb) -> String {
    match verb {
        Verb::Install => "You must specify a binary and config to install.".to_string(),
        Verb::Assign => "You must specify a binary and config to assign.".to_string(),
        Verb::Upgrade => {
            "You must specify a binary version or a config version for upgrade.".to_string()
        }
        Verb::AgentAdd => "You can pass at most an instance type to agent add.".to_string(),
        other => format!("You can not pass arguments to {}.", other.spec().name),
    }
}

fn build_body(
    verb: Verb,
    args: &[String],
    invocation: &Invocation,
) -> Result<RequestBody, CommandError> {
    let body = match verb {
        Verb::Install | Verb::Assign => match args {
            [first, second] => json_body(&Assignment::from_args(first, second))?,
            _ => return Err(CommandError::InvalidUsage(arity_message(verb))),
        },
        Verb::Upgrade => json_body(&UpgradeVersions::from_args(args))?,
        Verb::AgentAdd => json_body(&AgentProvisioning {
            instance_type: args.first().cloned(),
            availability_zone: invocation.availability_zone.clone(),
        })?,
        Verb::Start => RequestBody::Text("running"),
        Verb::Stop => RequestBody::Text("stopped"),
        Verb::Restart => RequestBody::Text("restarting"),
        Verb::Show
        | Verb::Clear
        | Verb::Terminate
        | Verb::ResetToActual
        | Verb::Ssh
        | Verb::AgentShow => RequestBody::None,
    };
    Ok(body)
}

fn json_body<T: Serialize>(payload: &T) -> Result<RequestBody, CommandError> {
    let value = serde_json::to_value(payload).map_err(|e| CommandError::Other(e.into()))?;
    Ok(RequestBody::Json(value))
}
