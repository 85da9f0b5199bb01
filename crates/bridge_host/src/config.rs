use scene_bridge::commands::{DEFAULT_DIAGNOSTIC_LIMIT, DEFAULT_HISTORY_LIMIT};
use tracing::warn;

const TRANSPORT_ENV_VAR: &str = "SCENE_BRIDGE_TRANSPORT";
const PORT_ENV_VAR: &str = "SCENE_BRIDGE_PORT";
const HISTORY_LIMIT_ENV_VAR: &str = "SCENE_BRIDGE_HISTORY_LIMIT";
const DIAGNOSTIC_LIMIT_ENV_VAR: &str = "SCENE_BRIDGE_DIAGNOSTIC_LIMIT";
pub(crate) const DEFAULT_PORT: u16 = 46011;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportKind {
    Stdio,
    Tcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HostConfig {
    pub(crate) transport: TransportKind,
    pub(crate) port: u16,
    pub(crate) history_limit: usize,
    pub(crate) diagnostic_limit: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stdio,
            port: DEFAULT_PORT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }
}

impl HostConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            transport: parse_transport(lookup(TRANSPORT_ENV_VAR).as_deref()),
            port: parse_port(lookup(PORT_ENV_VAR).as_deref()),
            history_limit: parse_limit(
                HISTORY_LIMIT_ENV_VAR,
                lookup(HISTORY_LIMIT_ENV_VAR).as_deref(),
                DEFAULT_HISTORY_LIMIT,
            ),
            diagnostic_limit: parse_limit(
                DIAGNOSTIC_LIMIT_ENV_VAR,
                lookup(DIAGNOSTIC_LIMIT_ENV_VAR).as_deref(),
                DEFAULT_DIAGNOSTIC_LIMIT,
            ),
        }
    }
}

fn parse_transport(raw: Option<&str>) -> TransportKind {
    match raw.map(str::trim) {
        None | Some("") => TransportKind::Stdio,
        Some(value) if value.eq_ignore_ascii_case("stdio") => TransportKind::Stdio,
        Some(value) if value.eq_ignore_ascii_case("tcp") => TransportKind::Tcp,
        Some(value) => {
            warn!(value, "bridge_unknown_transport_using_stdio");
            TransportKind::Stdio
        }
    }
}

fn parse_port(raw: Option<&str>) -> u16 {
    let Some(value) = raw else {
        return DEFAULT_PORT;
    };
    match value.trim().parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            warn!(
                value,
                fallback_port = DEFAULT_PORT,
                "bridge_invalid_port_using_default"
            );
            DEFAULT_PORT
        }
    }
}

fn parse_limit(var: &'static str, raw: Option<&str>, default: usize) -> usize {
    let Some(value) = raw else {
        return default;
    };
    match value.trim().parse::<usize>() {
        Ok(limit) => limit,
        Err(_) => {
            warn!(var, value, fallback = default, "bridge_invalid_limit_using_default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> HostConfig {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        HostConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config_from(&[]), HostConfig::default());
    }

    #[test]
    fn transport_values_are_case_insensitive() {
        assert_eq!(parse_transport(Some("TCP")), TransportKind::Tcp);
        assert_eq!(parse_transport(Some("stdio")), TransportKind::Stdio);
        assert_eq!(parse_transport(Some("carrier-pigeon")), TransportKind::Stdio);
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
        assert_eq!(parse_port(Some("46012")), 46012);
        assert_eq!(parse_port(Some("not-a-port")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("70000")), DEFAULT_PORT);
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            (TRANSPORT_ENV_VAR, "tcp"),
            (PORT_ENV_VAR, "0"),
            (HISTORY_LIMIT_ENV_VAR, "4"),
            (DIAGNOSTIC_LIMIT_ENV_VAR, "-1"),
        ]);
        assert_eq!(config.transport, TransportKind::Tcp);
        assert_eq!(config.port, 0);
        assert_eq!(config.history_limit, 4);
        assert_eq!(config.diagnostic_limit, DEFAULT_DIAGNOSTIC_LIMIT);
    }
}
