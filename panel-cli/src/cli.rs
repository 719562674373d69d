use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// 嵌入式设备 WiFi 配网面板
#[derive(Parser, Debug)]
#[command(name = "provisioner-panel", version, about)]
pub struct Cli {
    /// 设备 HTTP 服务地址，覆盖配置文件中的 device_url
    #[arg(long, global = true, env = "PANEL_DEVICE_URL")]
    pub device: Option<String>,

    /// TOML 配置文件；省略时使用内置默认配置
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit credentials and follow the connection status until it settles
    Connect {
        #[arg(long, env = "PANEL_WIFI_SSID", default_value = "")]
        ssid: String,
        #[arg(long, env = "PANEL_WIFI_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,
        /// 在输出中显示明文密码
        #[arg(long)]
        show_password: bool,
    },
    /// Read the connection status once
    Status,
    /// Show the connection info of the device
    Info,
    /// Disconnect the device from its access point and reload the panel
    Disconnect,
    /// Show the device's local time
    Time {
        /// 持续刷新，直到 Ctrl-C
        #[arg(long)]
        watch: bool,
    },
    /// Run a simulated device serving the provisioning endpoints
    Simulate {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// 可以连接成功的网络，格式 SSID=PASSWORD，可重复
        #[arg(long = "network", value_parser = parse_network)]
        networks: Vec<(String, String)>,
        #[arg(long, default_value_t = 3000)]
        connect_delay_ms: u64,
    },
}

fn parse_network(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((ssid, password)) if !ssid.is_empty() => Ok((ssid.to_string(), password.to_string())),
        _ => Err(format!("expected SSID=PASSWORD, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_argument_splits_on_first_equals() {
        assert_eq!(
            parse_network("Home=pa=ss").unwrap(),
            ("Home".to_string(), "pa=ss".to_string())
        );
        assert!(parse_network("=secret").is_err());
        assert!(parse_network("Home").is_err());
    }

    #[test]
    fn connect_flags_parse() {
        let cli = Cli::try_parse_from([
            "provisioner-panel",
            "--device",
            "http://127.0.0.1:8080",
            "connect",
            "--ssid",
            "Home",
            "--password",
            "secret",
            "--show-password",
        ])
        .unwrap();
        assert_eq!(cli.device.as_deref(), Some("http://127.0.0.1:8080"));
        match cli.command {
            Command::Connect { ssid, password, show_password } => {
                assert_eq!(ssid, "Home");
                assert_eq!(password, "secret");
                assert!(show_password);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn simulate_collects_networks() {
        let cli = Cli::try_parse_from([
            "provisioner-panel",
            "simulate",
            "--network",
            "A=1",
            "--network",
            "B=2",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate { networks, bind, connect_delay_ms } => {
                assert_eq!(networks.len(), 2);
                assert_eq!(bind.port(), 8080);
                assert_eq!(connect_delay_ms, 3000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
