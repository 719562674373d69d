use serde::{Deserialize, Serialize};
use std::fmt;

// 设备 HTTP 接口上传输的数据结构，以及面板展示用的文本。

/// `/wifiConnectStatus` 的响应体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub wifi_connect_status_json: i64,
}

impl StatusReport {
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_code(self.wifi_connect_status_json)
    }
}

/// 设备报告的连接状态。
///
/// 固件使用 0 (NONE) 和 1 (CONNECTING) 两个非终态码，面板对两者不做区分；
/// 未知的状态码同样按连接中处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Failed,
    Success,
}

impl ConnectionStatus {
    pub const CODE_NONE: i64 = 0;
    pub const CODE_CONNECTING: i64 = 1;
    pub const CODE_FAILED: i64 = 2;
    pub const CODE_SUCCESS: i64 = 3;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::CODE_FAILED => ConnectionStatus::Failed,
            Self::CODE_SUCCESS => ConnectionStatus::Success,
            _ => ConnectionStatus::Connecting,
        }
    }

    /// Failed 和 Success 会结束轮询
    pub fn is_terminal(self) -> bool {
        !matches!(self, ConnectionStatus::Connecting)
    }

    /// 面板上显示的状态文本
    pub fn message(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Failed => {
                "Failed to Connect. Please check your AP credentials and compatibility"
            }
            ConnectionStatus::Success => "Connection Success!",
        }
    }
}

/// `/wifiConnectInfo.json` 的响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "ap")]
    pub access_point: String,
    #[serde(rename = "ip")]
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
}

impl ConnectionInfo {
    /// The four labeled fields in display order.
    pub fn labeled_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("Connected to: ", self.access_point.as_str()),
            ("IP Address: ", self.ip_address.as_str()),
            ("Netmask: ", self.netmask.as_str()),
            ("Gateway: ", self.gateway.as_str()),
        ]
    }
}

/// 用户在表单中输入的凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

impl Credentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    /// Returns one error per empty field, SSID first.
    pub fn validate(&self) -> std::result::Result<(), Vec<CredentialError>> {
        let mut errors = Vec::new();
        if self.ssid.is_empty() {
            errors.push(CredentialError::EmptySsid);
        }
        if self.password.is_empty() {
            errors.push(CredentialError::EmptyPassword);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// 按掩码状态返回密码的展示形式
    pub fn display_password(&self, masked: bool) -> String {
        if masked {
            "*".repeat(self.password.chars().count())
        } else {
            self.password.clone()
        }
    }

    pub fn to_request(&self) -> ConnectRequest {
        ConnectRequest {
            c_ssid: self.ssid.clone(),
            c_pwd: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    EmptySsid,
    EmptyPassword,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::EmptySsid => f.write_str("SSID cannot be empty!"),
            CredentialError::EmptyPassword => f.write_str("Password cannot be empty!"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// `/wifiConnect.json` 的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub c_ssid: String,
    pub c_pwd: String,
}

/// `/wifiDisconnect.json` 的请求体（表单编码）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub timestamp: u64,
}

/// `/localTime.json` 的响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTime {
    pub time: String,
}
