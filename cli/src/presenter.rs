//! Sorting and table presentation of fetched records.

use crate::output::table::{Cell, Table};
use crate::output::{OutputContext, Styles};
use crate::records::{Agent, Slot, SlotStatus};

const SLOT_TERMINAL_HEADERS: [&str; 6] =
    ["uuid", "ip", "status", "binary", "config", "statusMessage"];
const SLOT_PIPE_HEADERS: [&str; 5] = ["uuid", "ip", "status", "binary", "config"];
const AGENT_HEADERS: [&str; 5] = ["agentId", "ip", "status", "instanceType", "location"];

/// Sort slots into display order: ip, then binary, config, uuid.
pub fn sort_slots(slots: &mut [Slot]) {
    slots.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Sort agents into display order: ip, then agent id.
pub fn sort_agents(agents: &mut [Agent]) {
    agents.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Sort and print slots in the mode the output context selects.
pub fn display_slots(ctx: &OutputContext, mut slots: Vec<Slot>) {
    sort_slots(&mut slots);
    print!("{}", render_slots(ctx, &slots));
}

/// Sort and print agents in the mode the output context selects.
pub fn display_agents(ctx: &OutputContext, mut agents: Vec<Agent>) {
    sort_agents(&mut agents);
    print!("{}", render_agents(ctx, &agents));
}

/// Render already-sorted slots.
///
/// Terminal mode shows the short display id under `uuid` and appends the
/// status message column; pipe mode shows the full uuid and drops the
/// message.
#[must_use]
pub fn render_slots(ctx: &OutputContext, slots: &[Slot]) -> String {
    if ctx.is_tty {
        let mut table = Table::new(SLOT_TERMINAL_HEADERS.to_vec());
        for slot in slots {
            table.push_row(vec![
                Cell::plain(slot.short_id.clone()),
                Cell::plain(slot.ip.clone()),
                slot_status_cell(slot.status, &ctx.styles),
                Cell::plain(slot.binary.clone().unwrap_or_default()),
                Cell::plain(slot.config.clone().unwrap_or_default()),
                Cell::styled(
                    slot.status_message.clone().unwrap_or_default(),
                    ctx.styles.error,
                ),
            ]);
        }
        table.render_terminal(&ctx.styles)
    } else {
        let mut table = Table::new(SLOT_PIPE_HEADERS.to_vec());
        for slot in slots {
            table.push_row(vec![
                Cell::plain(slot.uuid.clone()),
                Cell::plain(slot.ip.clone()),
                Cell::plain(slot.status.as_str()),
                Cell::plain(slot.binary.clone().unwrap_or_default()),
                Cell::plain(slot.config.clone().unwrap_or_default()),
            ]);
        }
        table.render_pipe()
    }
}

/// Render already-sorted agents. Same columns in both modes.
#[must_use]
pub fn render_agents(ctx: &OutputContext, agents: &[Agent]) -> String {
    let mut table = Table::new(AGENT_HEADERS.to_vec());
    for agent in agents {
        table.push_row(vec![
            Cell::plain(agent.agent_id.clone()),
            Cell::plain(agent.ip.clone()),
            agent_status_cell(&agent.status, &ctx.styles),
            Cell::plain(agent.instance_type.clone().unwrap_or_default()),
            Cell::plain(agent.location.clone().unwrap_or_default()),
        ]);
    }
    if ctx.is_tty {
        table.render_terminal(&ctx.styles)
    } else {
        table.render_pipe()
    }
}

fn slot_status_cell(status: SlotStatus, styles: &Styles) -> Cell {
    match status {
        SlotStatus::Running => Cell::styled(status.as_str(), styles.success),
        SlotStatus::Unknown => Cell::styled(status.as_str(), styles.error),
        SlotStatus::Stopped | SlotStatus::Unassigned => Cell::plain(status.as_str()),
    }
}

fn agent_status_cell(status: &str, styles: &Styles) -> Cell {
    match status {
        "ONLINE" => Cell::styled(status, styles.success),
        "OFFLINE" => Cell::styled(status, styles.error),
        "PROVISIONING" => Cell::styled(status, styles.info),
        _ => Cell::plain(status),
    }
}
