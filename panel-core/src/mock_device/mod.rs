use crate::client::{
    CONNECT_INFO_PATH, CONNECT_PATH, CONNECT_STATUS_PATH, DISCONNECT_PATH, LOCAL_TIME_PATH,
};
use crate::structs::{ConnectRequest, ConnectionInfo, ConnectionStatus, LocalTime, StatusReport};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// 模拟设备的行为配置
#[derive(Debug, Clone)]
pub struct MockDeviceConfig {
    /// 可以连接成功的网络：SSID -> 密码
    pub known_networks: HashMap<String, String>,
    /// 从收到凭据到给出连接结果的时间
    pub connect_delay: Duration,
    /// 连接成功后分配到的地址
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
}

impl Default for MockDeviceConfig {
    fn default() -> Self {
        let mut known_networks = HashMap::new();
        known_networks.insert("MyHomeWiFi".to_string(), "password123".to_string());
        Self {
            known_networks,
            connect_delay: Duration::from_secs(3),
            ip_address: "192.168.1.87".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: "192.168.1.1".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    status_code: i64,
    station: Option<ConnectionInfo>,
    attempt: Option<JoinHandle<()>>,
    // 最近收到的请求体，固件本身不解析它们
    last_status_body: Option<String>,
    last_disconnect_body: Option<String>,
}

/// 一个模拟的配网设备。
/// It serves the same five endpoints as the firmware, without any radio.
#[derive(Debug, Clone)]
pub struct MockDevice {
    config: Arc<MockDeviceConfig>,
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new(config: MockDeviceConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(DeviceState::default())),
        }
    }

    /// 当前的原始状态码
    pub fn status_code(&self) -> i64 {
        self.state.lock().map(|s| s.status_code).unwrap_or_default()
    }

    /// 最近一次 `/wifiConnectStatus` 请求的原始请求体
    pub fn last_status_body(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.last_status_body.clone())
    }

    /// 最近一次 `/wifiDisconnect.json` 请求的原始请求体
    pub fn last_disconnect_body(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.last_disconnect_body.clone())
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(CONNECT_PATH, post(wifi_connect))
            .route(CONNECT_STATUS_PATH, post(wifi_connect_status))
            .route(CONNECT_INFO_PATH, get(wifi_connect_info))
            .route(DISCONNECT_PATH, delete(wifi_disconnect))
            .route(LOCAL_TIME_PATH, get(local_time))
            .with_state(self.clone())
    }

    /// 在给定的 listener 上运行，直到出错
    pub async fn serve(self, listener: TcpListener) -> crate::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("🤖 [MockDevice] listening on {}", addr);
        axum::serve(listener, self.router().into_make_service()).await?;
        Ok(())
    }

    /// 绑定地址并在后台运行，返回实际监听地址
    pub async fn spawn(self, bind: SocketAddr) -> crate::Result<(SocketAddr, JoinHandle<crate::Result<()>>)> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        Ok((addr, tokio::spawn(self.serve(listener))))
    }

    fn begin_attempt(&self, request: ConnectRequest) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if let Some(previous) = state.attempt.take() {
            previous.abort();
        }
        state.status_code = ConnectionStatus::CODE_CONNECTING;
        state.station = None;

        let device = self.clone();
        state.attempt = Some(tokio::spawn(async move {
            tokio::time::sleep(device.config.connect_delay).await;
            device.finish_attempt(&request);
        }));
    }

    fn finish_attempt(&self, request: &ConnectRequest) {
        let accepted = self
            .config
            .known_networks
            .get(&request.c_ssid)
            .is_some_and(|psk| *psk == request.c_pwd);
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.attempt = None;
        if accepted {
            println!("🤖 [MockDevice] Connection successful to '{}'", request.c_ssid);
            state.status_code = ConnectionStatus::CODE_SUCCESS;
            state.station = Some(ConnectionInfo {
                access_point: request.c_ssid.clone(),
                ip_address: self.config.ip_address.clone(),
                netmask: self.config.netmask.clone(),
                gateway: self.config.gateway.clone(),
            });
        } else {
            println!("🤖 [MockDevice] Connection failed to '{}'", request.c_ssid);
            state.status_code = ConnectionStatus::CODE_FAILED;
            state.station = None;
        }
    }
}

// --- Route Handlers ---

/// 固件不检查 Content-Type，直接把请求体当作 JSON 解析
async fn wifi_connect(State(device): State<MockDevice>, body: Bytes) -> impl IntoResponse {
    let request: ConnectRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("[MockDevice] Failed to parse {} body: {}", CONNECT_PATH, e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };
    println!(
        "🤖 [MockDevice] Attempting to connect to SSID: '{}' with password: '{}'",
        request.c_ssid,
        if request.c_pwd.is_empty() { "(empty)" } else { "********" }
    );
    device.begin_attempt(request);
    StatusCode::OK
}

async fn wifi_connect_status(State(device): State<MockDevice>, body: String) -> impl IntoResponse {
    if let Ok(mut state) = device.state.lock() {
        state.last_status_body = Some(body);
    }
    Json(StatusReport {
        wifi_connect_status_json: device.status_code(),
    })
}

/// 未连接时返回空响应体
async fn wifi_connect_info(State(device): State<MockDevice>) -> impl IntoResponse {
    let station = device.state.lock().ok().and_then(|s| {
        (s.status_code == ConnectionStatus::CODE_SUCCESS)
            .then(|| s.station.clone())
            .flatten()
    });
    let body = match station {
        Some(info) => serde_json::to_string(&info).unwrap_or_default(),
        None => String::new(),
    };
    ([(header::CONTENT_TYPE, "application/json")], body)
}

async fn wifi_disconnect(State(device): State<MockDevice>, body: String) -> impl IntoResponse {
    println!("🤖 [MockDevice] User requested disconnect");
    if let Ok(mut state) = device.state.lock() {
        state.last_disconnect_body = Some(body);
        if let Some(attempt) = state.attempt.take() {
            attempt.abort();
        }
        state.status_code = ConnectionStatus::CODE_NONE;
        state.station = None;
    }
    StatusCode::OK
}

async fn local_time() -> impl IntoResponse {
    let now = chrono::Local::now();
    Json(LocalTime {
        time: now.format("%d/%m/%Y %H:%M").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> MockDevice {
        MockDevice::new(MockDeviceConfig {
            connect_delay: Duration::from_secs(1),
            ..MockDeviceConfig::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn known_network_ends_in_success() {
        let device = device();
        assert_eq!(device.status_code(), ConnectionStatus::CODE_NONE);

        device.begin_attempt(ConnectRequest {
            c_ssid: "MyHomeWiFi".into(),
            c_pwd: "password123".into(),
        });
        assert_eq!(device.status_code(), ConnectionStatus::CODE_CONNECTING);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(device.status_code(), ConnectionStatus::CODE_SUCCESS);
        let station = device.state.lock().unwrap().station.clone().unwrap();
        assert_eq!(station.access_point, "MyHomeWiFi");
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_password_ends_in_failure() {
        let device = device();
        device.begin_attempt(ConnectRequest {
            c_ssid: "MyHomeWiFi".into(),
            c_pwd: "nope".into(),
        });
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(device.status_code(), ConnectionStatus::CODE_FAILED);
        assert!(device.state.lock().unwrap().station.is_none());
    }
}
