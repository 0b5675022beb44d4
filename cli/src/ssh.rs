//! Interactive remote shell into the first slot matching a filter.

use std::process::Command;

use anyhow::Context as _;

use crate::coordinator::{CoordinatorClient, CoordinatorRequest, Method, RequestBody};
use crate::error::CommandError;
use crate::filter::Filter;
use crate::records::{ResourceKind, Slot};

/// Environment variable naming the ssh program and leading arguments.
pub const SSH_COMMAND_ENV: &str = "FLOTILLA_SSH_COMMAND";

/// Fetch the slots matching `filter` and open an interactive shell on the
/// first one, in coordinator reply order. Renders no table.
///
/// The ssh program comes from `ssh_override`, then [`SSH_COMMAND_ENV`], then
/// plain `ssh`. The child's own exit status is ignored.
///
/// # Errors
///
/// Propagates the fetch taxonomy (including no matching slots); a malformed
/// ssh command is a usage error and a failed launch a general error.
pub fn run(
    client: &CoordinatorClient,
    filter: &Filter,
    ssh_override: Option<&str>,
) -> Result<(), CommandError> {
    let request = CoordinatorRequest {
        method: Method::Get,
        kind: ResourceKind::Slot,
        sub_path: None,
        query: filter.serialize(),
        body: RequestBody::None,
    };
    let slots = client.fetch_slots(&request)?;
    // First slot in reply order; display sorting never applies here.
    if let Some(slot) = slots.first() {
        launch(slot, ssh_override)?;
    }
    Ok(())
}

fn launch(slot: &Slot, ssh_override: Option<&str>) -> Result<(), CommandError> {
    let raw = ssh_override
        .map(str::to_string)
        .or_else(|| std::env::var(SSH_COMMAND_ENV).ok())
        .filter(|command| !command.trim().is_empty())
        .unwrap_or_else(|| "ssh".to_string());
    let tokens = shell_words::split(&raw)
        .map_err(|e| CommandError::InvalidUsage(format!("Invalid ssh command '{raw}': {e}")))?;
    let (program, leading): (&str, &[String]) = match tokens.split_first() {
        Some((first, rest)) => (first.as_str(), rest),
        None => ("ssh", &[]),
    };

    let _ = Command::new(program)
        .args(leading)
        .arg(&slot.host)
        .arg("-t")
        .arg(remote_command(slot))
        .status()
        .with_context(|| format!("failed to spawn {program}"))?;
    Ok(())
}

/// Remote side: change into the install path (or the remote home when the
/// slot has none) and start the login shell.
fn remote_command(slot: &Slot) -> String {
    let path = slot.install_path.as_deref().unwrap_or("$HOME");
    format!("cd \"{path}\"; $SHELL")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SlotStatus;

    fn slot(install_path: Option<&str>) -> Slot {
        Slot {
            uuid: "u1".to_string(),
            short_id: "u1".to_string(),
            host: "host1.example.com".to_string(),
            ip: "10.0.0.1".to_string(),
            url: "http://10.0.0.1:64001/v1/slot/u1".to_string(),
            binary: None,
            config: None,
            status: SlotStatus::Running,
            status_message: None,
            install_path: install_path.map(str::to_string),
        }
    }

    #[test]
    fn test_remote_command_changes_into_install_path() {
        let command = remote_command(&slot(Some("/opt/slots/web")));
        assert_eq!(command, "cd \"/opt/slots/web\"; $SHELL");
    }

    #[test]
    fn test_remote_command_falls_back_to_remote_home() {
        let command = remote_command(&slot(None));
        assert_eq!(command, "cd \"$HOME\"; $SHELL");
    }

    #[test]
    fn test_remote_command_defers_variable_expansion_to_the_remote_shell() {
        let command = remote_command(&slot(None));
        assert!(command.contains("$HOME"));
        assert!(command.ends_with("$SHELL"));
    }
}
