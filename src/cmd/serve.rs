//! HTTP server command — `luigi serve`.

use anyhow::Result;

use luigi::config::Config;

pub async fn cmd_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    dev: bool,
) -> Result<()> {
    config.dev_mode = dev;
    match host {
        Some(host) => config.host = host,
        // Reachable from containers and the frontend dev server.
        None if dev => config.host = "0.0.0.0".to_string(),
        None => {}
    }
    if let Some(port) = port {
        config.port = port;
    }
    luigi::server::start_server(config).await
}
