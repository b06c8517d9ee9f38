//! Server health from `INFO` output.

use crate::error::Result;
use crate::model::{ServerHealth, ServerMode};
use crate::store::Store;
use crate::telemetry::query::record_operation;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Parse `INFO` text (`# Section` headers and `key:value` lines).
///
/// Fields the server does not report stay `None`. A reported total memory
/// of zero (unknown on some platforms, or no `maxmemory` limit) is treated
/// as absent.
pub fn parse_info(text: &str) -> ServerHealth {
    let fields: HashMap<&str, &str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .collect();

    let number = |name: &str| fields.get(name).and_then(|v| v.trim().parse::<u64>().ok());
    let nonzero = |name: &str| number(name).filter(|&n| n > 0);

    ServerHealth {
        version: fields
            .get("redis_version")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        mode: fields.get("redis_mode").map(|mode| match mode.trim() {
            "standalone" => ServerMode::Standalone,
            "cluster" => ServerMode::Cluster,
            "sentinel" => ServerMode::Sentinel,
            other => ServerMode::Other(other.to_string()),
        }),
        used_memory: number("used_memory"),
        total_memory: nonzero("total_system_memory").or_else(|| nonzero("maxmemory")),
        connected_clients: number("connected_clients"),
    }
}

impl<S: Store> super::Explorer<S> {
    /// Snapshot server version, mode, memory and client count.
    pub async fn probe(&self) -> Result<ServerHealth> {
        let started = Instant::now();
        let info = self.store.server_info().await?;
        let health = parse_info(&info);
        debug!(
            version = health.version_display(),
            clients = ?health.connected_clients,
            "server probed"
        );
        record_operation("probe", "", started);
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Server\r\n\
        redis_version:7.2.4\r\n\
        redis_mode:standalone\r\n\
        \r\n\
        # Clients\r\n\
        connected_clients:12\r\n\
        \r\n\
        # Memory\r\n\
        used_memory:1048576\r\n\
        used_memory_human:1.00M\r\n\
        total_system_memory:0\r\n\
        maxmemory:4294967296\r\n";

    #[test]
    fn parses_standard_fields() {
        let health = parse_info(SAMPLE);
        assert_eq!(health.version.as_deref(), Some("7.2.4"));
        assert_eq!(health.mode, Some(ServerMode::Standalone));
        assert_eq!(health.used_memory, Some(1_048_576));
        assert_eq!(health.connected_clients, Some(12));
    }

    #[test]
    fn falls_back_to_maxmemory_when_system_memory_unknown() {
        assert_eq!(parse_info(SAMPLE).total_memory, Some(4_294_967_296));
    }

    #[test]
    fn missing_fields_are_unknown() {
        let health = parse_info("# Server\nredis_mode:cluster\n");
        assert_eq!(health.version, None);
        assert_eq!(health.mode, Some(ServerMode::Cluster));
        assert_eq!(health.used_memory_display(), "-");
        assert_eq!(health.clients_display(), "-");
    }
}
