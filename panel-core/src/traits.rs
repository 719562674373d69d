use crate::structs::{ConnectionInfo, ConnectionStatus, CredentialError, Credentials, LocalTime, StatusReport};
use async_trait::async_trait;

// 面板的两个接缝：设备 HTTP 接口和渲染目标。

/// 设备端配网接口。
///
/// `Send + Sync` 约束是必须的，因为轮询和请求都在后台任务中执行。
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// POST `/wifiConnect.json`，提交凭据。设备不返回任何确认。
    async fn connect(&self, credentials: &Credentials) -> crate::Result<()>;

    /// POST `/wifiConnectStatus`，读取当前连接状态。
    async fn connect_status(&self) -> crate::Result<StatusReport>;

    /// GET `/wifiConnectInfo.json`.
    ///
    /// Returns `Ok(None)` when the device answers with an empty body,
    /// which is how it says it is not connected.
    async fn connect_info(&self) -> crate::Result<Option<ConnectionInfo>>;

    /// DELETE `/wifiDisconnect.json`.
    async fn disconnect(&self, timestamp: u64) -> crate::Result<()>;

    /// GET `/localTime.json`.
    async fn local_time(&self) -> crate::Result<LocalTime>;
}

/// 面板的渲染目标（原网页中的各个元素）。
///
/// All methods are synchronous: rendering never waits on the network.
pub trait PanelView: Send + Sync {
    /// 显示凭据校验错误；空切片表示清空错误区域
    fn show_credential_errors(&self, errors: &[CredentialError]);

    /// 显示连接状态文本
    fn show_connect_status(&self, status: ConnectionStatus);

    /// 填充四个带标签的字段并显示断开按钮
    fn show_connection_info(&self, info: &ConnectionInfo);

    /// 切换密码输入框的掩码状态
    fn set_password_masked(&self, masked: bool);

    fn show_local_time(&self, time: &str);

    /// 重新加载面板：清空所有已渲染的状态
    fn reload(&self);
}
