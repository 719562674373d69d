// 单元测试共用的假设备和记录型视图

use crate::structs::{
    ConnectionInfo, ConnectionStatus, CredentialError, Credentials, LocalTime, StatusReport,
};
use crate::traits::{DeviceApi, PanelView};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn info(ap: &str) -> ConnectionInfo {
    ConnectionInfo {
        access_point: ap.to_string(),
        ip_address: "192.168.1.20".to_string(),
        netmask: "255.255.255.0".to_string(),
        gateway: "192.168.1.1".to_string(),
    }
}

fn server_error(path: &'static str) -> Error {
    Error::UnexpectedStatus { path, status: 500 }
}

/// 按脚本依次返回状态码的假设备；脚本用完后一直返回 1 (连接中)
#[derive(Default)]
pub struct ScriptedDevice {
    statuses: Mutex<VecDeque<std::result::Result<i64, ()>>>,
    info: Option<ConnectionInfo>,
    fail_connect: bool,
    fail_disconnect: bool,
    connects: Mutex<Vec<Credentials>>,
    status_calls: Mutex<usize>,
    info_calls: Mutex<usize>,
    disconnect_calls: Mutex<usize>,
}

impl ScriptedDevice {
    pub fn new(statuses: Vec<std::result::Result<i64, ()>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn with_info(mut self, info: Option<ConnectionInfo>) -> Self {
        self.info = info;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn connect_calls(&self) -> Vec<Credentials> {
        self.connects.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        *self.status_calls.lock().unwrap()
    }

    pub fn info_calls(&self) -> usize {
        *self.info_calls.lock().unwrap()
    }

    pub fn disconnect_calls(&self) -> usize {
        *self.disconnect_calls.lock().unwrap()
    }
}

#[async_trait]
impl DeviceApi for ScriptedDevice {
    async fn connect(&self, credentials: &Credentials) -> Result<()> {
        self.connects.lock().unwrap().push(credentials.clone());
        if self.fail_connect {
            Err(server_error("/wifiConnect.json"))
        } else {
            Ok(())
        }
    }

    async fn connect_status(&self) -> Result<StatusReport> {
        *self.status_calls.lock().unwrap() += 1;
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ConnectionStatus::CODE_CONNECTING));
        match next {
            Ok(code) => Ok(StatusReport {
                wifi_connect_status_json: code,
            }),
            Err(()) => Err(server_error("/wifiConnectStatus")),
        }
    }

    async fn connect_info(&self) -> Result<Option<ConnectionInfo>> {
        *self.info_calls.lock().unwrap() += 1;
        Ok(self.info.clone())
    }

    async fn disconnect(&self, _timestamp: u64) -> Result<()> {
        *self.disconnect_calls.lock().unwrap() += 1;
        if self.fail_disconnect {
            Err(server_error("/wifiDisconnect.json"))
        } else {
            Ok(())
        }
    }

    async fn local_time(&self) -> Result<LocalTime> {
        Ok(LocalTime {
            time: "16/10/2026 12:00".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    CredentialErrors(Vec<String>),
    Status(ConnectionStatus),
    Info(ConnectionInfo),
    PasswordMasked(bool),
    LocalTime(String),
    Reload,
}

/// 按顺序记录所有渲染调用的视图
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PanelView for RecordingView {
    fn show_credential_errors(&self, errors: &[CredentialError]) {
        self.push(ViewEvent::CredentialErrors(
            errors.iter().map(ToString::to_string).collect(),
        ));
    }

    fn show_connect_status(&self, status: ConnectionStatus) {
        self.push(ViewEvent::Status(status));
    }

    fn show_connection_info(&self, info: &ConnectionInfo) {
        self.push(ViewEvent::Info(info.clone()));
    }

    fn set_password_masked(&self, masked: bool) {
        self.push(ViewEvent::PasswordMasked(masked));
    }

    fn show_local_time(&self, time: &str) {
        self.push(ViewEvent::LocalTime(time.to_string()));
    }

    fn reload(&self) {
        self.push(ViewEvent::Reload);
    }
}
