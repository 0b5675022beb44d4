//! Typed slot and agent records decoded from coordinator replies.

use std::fmt;
use std::net::ToSocketAddrs;

use serde::Deserialize;
use url::Url;

use crate::error::CommandError;

/// Which record type a coordinator reply decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Slot,
    Agent,
}

impl ResourceKind {
    /// Plural noun used in user-facing messages.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Slot => "slots",
            Self::Agent => "agents",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Slot lifecycle state as reported by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Running,
    Stopped,
    Unassigned,
    /// Catch-all for states this client predates.
    #[serde(other)]
    Unknown,
}

impl SlotStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Unassigned => "UNASSIGNED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotWire {
    id: String,
    short_id: String,
    #[serde(rename = "self")]
    self_url: String,
    #[serde(default)]
    binary: Option<String>,
    #[serde(default)]
    config: Option<String>,
    status: SlotStatus,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    install_path: Option<String>,
}

/// A deployed process slot. Immutable once decoded.
#[derive(Debug, Clone)]
pub struct Slot {
    pub uuid: String,
    pub short_id: String,
    pub host: String,
    pub ip: String,
    pub url: String,
    pub binary: Option<String>,
    pub config: Option<String>,
    pub status: SlotStatus,
    pub status_message: Option<String>,
    pub install_path: Option<String>,
}

impl Slot {
    fn from_wire(wire: SlotWire) -> Result<Self, CommandError> {
        let (host, ip) = host_and_ip(&wire.self_url)?;
        Ok(Self {
            uuid: wire.id,
            short_id: wire.short_id,
            host,
            ip,
            url: wire.self_url,
            binary: wire.binary,
            config: wire.config,
            status: wire.status,
            status_message: wire.status_message,
            install_path: wire.install_path,
        })
    }

    /// Total display-order key: `(ip, binary, config, uuid)` with absent
    /// assignment fields as empty strings.
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.ip,
            self.binary.as_deref().unwrap_or(""),
            self.config.as_deref().unwrap_or(""),
            &self.uuid,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentWire {
    agent_id: String,
    state: String,
    #[serde(rename = "self")]
    self_url: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    instance_type: Option<String>,
}

/// A host capable of running slots. Immutable once decoded.
#[derive(Debug, Clone)]
pub struct Agent {
    pub agent_id: String,
    pub host: String,
    pub ip: String,
    pub url: String,
    /// Provisioning state. Open set on the wire (ONLINE, OFFLINE, ...).
    pub status: String,
    pub location: Option<String>,
    pub instance_type: Option<String>,
}

impl Agent {
    fn from_wire(wire: AgentWire) -> Result<Self, CommandError> {
        let (host, ip) = host_and_ip(&wire.self_url)?;
        Ok(Self {
            agent_id: wire.agent_id,
            host,
            ip,
            url: wire.self_url,
            status: wire.state,
            location: wire.location,
            instance_type: wire.instance_type,
        })
    }

    /// Total display-order key: `(ip, agent_id)`.
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.ip, &self.agent_id)
    }
}

/// Decode a JSON array of slot objects.
///
/// # Errors
///
/// Returns [`CommandError::Decode`] when the payload is not a JSON array of
/// well-formed slot objects, or when a record URL cannot be parsed or its
/// host resolved.
pub fn decode_slots(raw: &str) -> Result<Vec<Slot>, CommandError> {
    let wire: Vec<SlotWire> =
        serde_json::from_str(raw).map_err(|e| CommandError::Decode(e.to_string()))?;
    wire.into_iter().map(Slot::from_wire).collect()
}

/// Decode a JSON array of agent objects.
///
/// # Errors
///
/// Same contract as [`decode_slots`], for agents.
pub fn decode_agents(raw: &str) -> Result<Vec<Agent>, CommandError> {
    let wire: Vec<AgentWire> =
        serde_json::from_str(raw).map_err(|e| CommandError::Decode(e.to_string()))?;
    wire.into_iter().map(Agent::from_wire).collect()
}

/// Extract the authority host from a record's self URL and resolve it to a
/// presentable IP address.
fn host_and_ip(raw_url: &str) -> Result<(String, String), CommandError> {
    let parsed = Url::parse(raw_url)
        .map_err(|e| CommandError::Decode(format!("invalid record url {raw_url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| CommandError::Decode(format!("record url {raw_url} has no host")))?
        .to_string();
    let port = parsed.port_or_known_default().unwrap_or(80);
    let ip = resolve_ip(&host, port)?;
    Ok((host, ip))
}

fn resolve_ip(host: &str, port: u16) -> Result<String, CommandError> {
    // IPv6 authorities come back bracketed from the URL parser.
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    let mut addrs = (bare, port)
        .to_socket_addrs()
        .map_err(|e| CommandError::Decode(format!("cannot resolve host {host}: {e}")))?;
    addrs
        .next()
        .map(|addr| addr.ip().to_string())
        .ok_or_else(|| CommandError::Decode(format!("cannot resolve host {host}")))
}
