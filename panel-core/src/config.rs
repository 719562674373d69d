use crate::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// 面板运行时配置
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// 设备 HTTP 服务的根地址。
    ///
    /// Must be a bare origin (`http://host[:port]`): the firmware serves
    /// every endpoint from `/`, so a path, query or fragment is rejected.
    pub device_url: Url,
    /// 状态轮询间隔
    pub poll_interval: Duration,
    /// 断开连接后到重新加载面板的延迟
    pub reload_delay: Duration,
    /// 本地时间刷新间隔
    pub local_time_interval: Duration,
    /// 加载面板时是否同时启动本地时间刷新
    pub show_local_time: bool,
}

pub const DEFAULT_DEVICE_URL: &str = "http://192.168.4.1";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2800;
pub const DEFAULT_RELOAD_DELAY_MS: u64 = 2000;
pub const DEFAULT_LOCAL_TIME_INTERVAL_MS: u64 = 10_000;

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            device_url: Url::parse(DEFAULT_DEVICE_URL).expect("Invalid DEFAULT_DEVICE_URL"),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            reload_delay: Duration::from_millis(DEFAULT_RELOAD_DELAY_MS),
            local_time_interval: Duration::from_millis(DEFAULT_LOCAL_TIME_INTERVAL_MS),
            show_local_time: false,
        }
    }
}

impl PanelConfig {
    /// 以默认配置为基础，替换设备地址
    pub fn with_device_url(mut self, device_url: &str) -> Result<Self> {
        self.device_url = parse_device_url(device_url)?;
        Ok(self)
    }
}

/// 解析设备地址，只接受不带路径的根地址
fn parse_device_url(s: &str) -> Result<Url> {
    let url = Url::parse(s)?;
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Config(format!(
            "device_url must be an origin like http://192.168.4.1, got {}",
            url
        )));
    }
    Ok(url)
}

/// 用于解析 TOML 的临时结构
#[derive(Deserialize)]
struct PanelConfigFile {
    /// [device] 表
    device: DeviceToml,
    /// [panel] 表（可选）
    #[serde(default)]
    panel: PanelToml,
}

#[derive(Deserialize)]
struct DeviceToml {
    device_url: String,
}

#[derive(Deserialize)]
#[serde(default)]
struct PanelToml {
    poll_interval_ms: u64,
    reload_delay_ms: u64,
    local_time_interval_ms: u64,
    show_local_time: bool,
}

impl Default for PanelToml {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            reload_delay_ms: DEFAULT_RELOAD_DELAY_MS,
            local_time_interval_ms: DEFAULT_LOCAL_TIME_INTERVAL_MS,
            show_local_time: false,
        }
    }
}

impl TryFrom<PanelConfigFile> for PanelConfig {
    type Error = Error;

    fn try_from(t: PanelConfigFile) -> Result<Self> {
        let device_url = parse_device_url(&t.device.device_url)?;
        let nonzero = |name: &str, ms: u64| {
            if ms == 0 {
                Err(Error::Config(format!("{} must be greater than zero", name)))
            } else {
                Ok(Duration::from_millis(ms))
            }
        };
        Ok(PanelConfig {
            device_url,
            poll_interval: nonzero("poll_interval_ms", t.panel.poll_interval_ms)?,
            reload_delay: Duration::from_millis(t.panel.reload_delay_ms),
            local_time_interval: nonzero("local_time_interval_ms", t.panel.local_time_interval_ms)?,
            show_local_time: t.panel.show_local_time,
        })
    }
}

/// 从 TOML 字符串加载面板配置
pub fn load_config_from_toml_str(s: &str) -> Result<PanelConfig> {
    let parsed: PanelConfigFile = toml::from_str(s)?;
    PanelConfig::try_from(parsed)
}

/// 从磁盘上的 TOML 文件加载面板配置
pub async fn load_config_from_file(path: &std::path::Path) -> Result<PanelConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    tracing::debug!(path = %path.display(), "Loaded panel config file");
    load_config_from_toml_str(&content)
}
