use crate::cli::{Cli, Command};
use crate::view::{TerminalView, render_status};
use anyhow::{Context, Result, bail};
use panel_core::client::HttpDevice;
use panel_core::config::{PanelConfig, load_config_from_file, load_config_from_toml_str};
use panel_core::mock_device::{MockDevice, MockDeviceConfig};
use panel_core::panel::{PollOutcome, ProvisioningPanel};
use panel_core::structs::{ConnectionStatus, Credentials};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// 内置默认配置
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/panel.toml");

/// 配置优先级：--device > --config 文件 > 内置默认配置
async fn resolve_config(device: Option<&str>, config: Option<&Path>) -> Result<PanelConfig> {
    let config = match config {
        Some(path) => load_config_from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => load_config_from_toml_str(DEFAULT_CONFIG_TOML).context("Invalid built-in config")?,
    };
    match device {
        Some(url) => Ok(config.with_device_url(url)?),
        None => Ok(config),
    }
}

/// 根据命令调度：`simulate` 运行模拟设备，其余命令都经过面板控制器
pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        device,
        config,
        command,
    } = cli;

    if let Command::Simulate {
        bind,
        networks,
        connect_delay_ms,
    } = command
    {
        return simulate(bind, networks, connect_delay_ms).await;
    }

    let config = resolve_config(device.as_deref(), config.as_deref()).await?;
    tracing::debug!(device = %config.device_url, "Resolved panel config");
    let http = Arc::new(HttpDevice::new(config.device_url.clone()));
    let panel = ProvisioningPanel::new(http, Arc::new(TerminalView::new()), config);

    match command {
        Command::Connect {
            ssid,
            password,
            show_password,
        } => connect(&panel, Credentials::new(ssid, password), show_password).await,
        Command::Status => {
            let status = panel.get_wifi_connect_status().await?;
            tracing::debug!(?status, "Status read");
            Ok(())
        }
        Command::Info => {
            if panel.get_connect_info().await?.is_none() {
                println!("Device is not connected to an access point.");
            }
            Ok(())
        }
        Command::Disconnect => {
            let _ticker = panel.disconnect_wifi().await;
            Ok(())
        }
        Command::Time { watch } => {
            panel.get_local_time().await?;
            if watch {
                let ticker = panel.start_local_time_ticker();
                tokio::signal::ctrl_c().await?;
                ticker.stop();
            }
            Ok(())
        }
        Command::Simulate { .. } => Ok(()),
    }
}

async fn connect(panel: &ProvisioningPanel, credentials: Credentials, show_password: bool) -> Result<()> {
    if show_password {
        panel.show_password();
    }
    println!(
        "📶 Connecting to '{}' (password: {})",
        credentials.ssid,
        credentials.display_password(panel.password_masked())
    );

    let Ok(mut poll) = panel.check_credentials(&credentials) else {
        bail!("Credentials rejected");
    };

    let interrupted = tokio::select! {
        outcome = poll.wait() => Some(outcome?),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match interrupted {
        Some(outcome) => outcome,
        None => {
            poll.stop();
            PollOutcome::Stopped
        }
    };

    match outcome {
        PollOutcome::Connected => Ok(()),
        PollOutcome::Failed => bail!("{}", render_status(ConnectionStatus::Failed)),
        PollOutcome::Stopped => {
            println!("Stopped following the connection status.");
            Ok(())
        }
    }
}

async fn simulate(bind: SocketAddr, networks: Vec<(String, String)>, connect_delay_ms: u64) -> Result<()> {
    let mut config = MockDeviceConfig {
        connect_delay: Duration::from_millis(connect_delay_ms),
        ..MockDeviceConfig::default()
    };
    if !networks.is_empty() {
        config.known_networks = networks.into_iter().collect();
    }
    for ssid in config.known_networks.keys() {
        tracing::info!(ssid = %ssid, "Simulated network available");
    }

    let (addr, server) = MockDevice::new(config).spawn(bind).await?;
    println!("🤖 Simulated device ready at http://{}", addr);
    tokio::select! {
        result = server => result??,
        _ = tokio::signal::ctrl_c() => tracing::info!("🛑 Shutting down simulated device."),
    }
    Ok(())
}
