//! Network manager runtime state for links and for the whole system.
//!
//! State files are `KEY=VALUE` lines; list values are space separated.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::config::Paths;
use crate::netlink::Result;

/// Setup state reported for links without managed state.
pub const UNMANAGED: &str = "unmanaged";

/// Parse `KEY=VALUE` lines. Comments, blank lines and lines without `=`
/// are skipped; surrounding double quotes are removed from values.
pub fn parse_env(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Read a state file; `None` when it does not exist.
fn read_env(path: &Path) -> Result<Option<HashMap<String, String>>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(parse_env(&text))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn list(env: &HashMap<String, String>, key: &str) -> Vec<String> {
    env.get(key)
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn string(env: &HashMap<String, String>, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty()).cloned()
}

fn ifindexes(env: &HashMap<String, String>, key: &str) -> Vec<u32> {
    list(env, key)
        .iter()
        .filter_map(|v| match v.parse() {
            Ok(index) => Some(index),
            Err(_) => {
                tracing::debug!(key, value = %v, "ignoring invalid interface index");
                None
            }
        })
        .collect()
}

/// Managed state of one link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkState {
    pub oper_state: Option<String>,
    /// Setup (administrative) state, e.g. `configured` or `failed`.
    pub setup_state: Option<String>,
    pub network_file: Option<String>,
    pub dns: Vec<String>,
    pub ntp: Vec<String>,
    pub search_domains: Vec<String>,
    pub route_domains: Vec<String>,
    pub timezone: Option<String>,
    pub carrier_bound_to: Vec<u32>,
    pub carrier_bound_by: Vec<u32>,
}

impl LinkState {
    /// Load the state of `ifindex`; `None` when the link is unmanaged.
    pub fn load(paths: &Paths, ifindex: u32) -> Result<Option<Self>> {
        let path = paths.link_state_dir.join(ifindex.to_string());
        Ok(read_env(&path)?.map(|env| Self::from_env(&env)))
    }

    pub fn parse(text: &str) -> Self {
        Self::from_env(&parse_env(text))
    }

    fn from_env(env: &HashMap<String, String>) -> Self {
        Self {
            oper_state: string(env, "OPER_STATE"),
            setup_state: string(env, "ADMIN_STATE"),
            network_file: string(env, "NETWORK_FILE"),
            dns: list(env, "DNS"),
            ntp: list(env, "NTP"),
            search_domains: list(env, "DOMAINS"),
            route_domains: list(env, "ROUTE_DOMAINS"),
            timezone: string(env, "TIMEZONE"),
            carrier_bound_to: ifindexes(env, "CARRIER_BOUND_TO"),
            carrier_bound_by: ifindexes(env, "CARRIER_BOUND_BY"),
        }
    }
}

/// The setup state, or `unmanaged` when none is recorded.
pub fn setup_state_or_unmanaged(state: Option<&LinkState>) -> &str {
    state
        .and_then(|s| s.setup_state.as_deref())
        .unwrap_or(UNMANAGED)
}

/// The operational state, when recorded.
pub fn oper_state(state: Option<&LinkState>) -> Option<&str> {
    state.and_then(|s| s.oper_state.as_deref())
}

/// Global network manager state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemState {
    pub oper_state: Option<String>,
    pub dns: Vec<String>,
    pub ntp: Vec<String>,
    pub search_domains: Vec<String>,
    pub route_domains: Vec<String>,
}

impl SystemState {
    /// Load the global state; `None` when the manager is not running.
    pub fn load(paths: &Paths) -> Result<Option<Self>> {
        Ok(read_env(&paths.state_file)?.map(|env| Self::from_env(&env)))
    }

    pub fn parse(text: &str) -> Self {
        Self::from_env(&parse_env(text))
    }

    fn from_env(env: &HashMap<String, String>) -> Self {
        Self {
            oper_state: string(env, "OPER_STATE"),
            dns: list(env, "DNS"),
            ntp: list(env, "NTP"),
            search_domains: list(env, "DOMAINS"),
            route_domains: list(env, "ROUTE_DOMAINS"),
        }
    }
}
