use crate::config::PanelConfig;
use crate::structs::{ConnectionInfo, ConnectionStatus, CredentialError, Credentials};
use crate::traits::{DeviceApi, PanelView};
use crate::Result;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::sleep;

/// 状态轮询结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// 设备报告连接失败 (状态码 2)
    Failed,
    /// 设备报告连接成功 (状态码 3)，连接信息已重新获取
    Connected,
    /// 轮询被句柄持有者主动停止
    Stopped,
}

/// 状态轮询任务的句柄。
///
/// Returned by [`ProvisioningPanel::connect_wifi`]; the caller owns it.
/// Dropping the handle detaches the task, which keeps polling until the
/// device reports a terminal status, a newer poll starts, or the panel
/// reloads.
#[derive(Debug)]
pub struct StatusPoll {
    task: Option<JoinHandle<PollOutcome>>,
}

impl StatusPoll {
    /// 停止轮询。重复调用是安全的。
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Status poll stopped by owner");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// 等待轮询结束，句柄仍归调用方所有
    pub async fn wait(&mut self) -> Result<PollOutcome> {
        let Some(task) = self.task.as_mut() else {
            return Ok(PollOutcome::Stopped);
        };
        let result = task.await;
        self.task = None;
        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_cancelled() => Ok(PollOutcome::Stopped),
            Err(e) => Err(e.into()),
        }
    }

    /// 等待轮询结束
    pub async fn outcome(mut self) -> Result<PollOutcome> {
        self.wait().await
    }
}

/// 本地时间刷新任务的句柄，drop 时停止刷新
#[derive(Debug)]
pub struct LocalTimeTicker {
    task: JoinHandle<()>,
}

impl LocalTimeTicker {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for LocalTimeTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 配网面板控制器。
///
/// Cheap to clone: every clone shares the same device, view and
/// password-mask state, so background tasks can hold their own copy.
#[derive(Clone)]
pub struct ProvisioningPanel {
    device: Arc<dyn DeviceApi>,
    view: Arc<dyn PanelView>,
    config: Arc<PanelConfig>,
    password_masked: Arc<AtomicBool>,
    // 最近一次启动的状态轮询；新轮询或重新加载时中止它
    active_poll: Arc<Mutex<Option<AbortHandle>>>,
}

impl ProvisioningPanel {
    pub fn new(device: Arc<dyn DeviceApi>, view: Arc<dyn PanelView>, config: PanelConfig) -> Self {
        Self {
            device,
            view,
            config: Arc::new(config),
            password_masked: Arc::new(AtomicBool::new(true)),
            active_poll: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn password_masked(&self) -> bool {
        self.password_masked.load(Ordering::SeqCst)
    }

    /// 面板加载：获取一次连接信息。
    ///
    /// Starts the local time ticker when `show_local_time` is set and
    /// returns it; the caller keeps it alive for as long as it should run.
    pub async fn load(&self) -> Option<LocalTimeTicker> {
        tracing::info!("📋 Loading panel from {}", self.config.device_url);
        if let Err(e) = self.get_connect_info().await {
            tracing::warn!("Initial connect info fetch failed: {}", e);
        }
        self.config
            .show_local_time
            .then(|| self.start_local_time_ticker())
    }

    /// 校验凭据，通过后发起连接。
    ///
    /// 每个空字段渲染一条错误并中止；通过时清空错误区域。
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime when the credentials are
    /// valid, see [`connect_wifi`](Self::connect_wifi).
    pub fn check_credentials(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<StatusPoll, Vec<CredentialError>> {
        match credentials.validate() {
            Err(errors) => {
                tracing::debug!(count = errors.len(), "Credentials rejected");
                self.view.show_credential_errors(&errors);
                Err(errors)
            }
            Ok(()) => {
                self.view.show_credential_errors(&[]);
                Ok(self.connect_wifi(credentials))
            }
        }
    }

    /// 提交凭据并立即开始状态轮询。
    ///
    /// The connect request is fire-and-forget: its result is only logged
    /// and the poll starts whether or not it succeeds.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime (uses `tokio::spawn`).
    pub fn connect_wifi(&self, credentials: &Credentials) -> StatusPoll {
        tracing::info!(ssid = %credentials.ssid, "📡 Submitting credentials");

        let device = self.device.clone();
        let credentials = credentials.clone();
        tokio::spawn(async move {
            if let Err(e) = device.connect(&credentials).await {
                tracing::warn!(ssid = %credentials.ssid, "Connect request failed: {}", e);
            }
        });

        self.start_status_poll()
    }

    /// 开始状态轮询。每次请求完成后，间隔一个周期再发起下一次。
    ///
    /// 同一时间只有一个轮询在运行：之前启动的轮询会被中止，其句柄的
    /// `outcome()` 返回 [`PollOutcome::Stopped`]。
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_status_poll(&self) -> StatusPoll {
        let panel = self.clone();
        let interval = self.config.poll_interval;
        let task = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                match panel.get_wifi_connect_status().await {
                    Ok(ConnectionStatus::Failed) => return PollOutcome::Failed,
                    Ok(ConnectionStatus::Success) => return PollOutcome::Connected,
                    Ok(ConnectionStatus::Connecting) => {}
                    Err(e) => tracing::warn!("Status poll request failed: {}", e),
                }
            }
        });
        if let Some(previous) = self.replace_active_poll(Some(task.abort_handle())) {
            tracing::debug!("Superseding previous status poll");
            previous.abort();
        }
        StatusPoll { task: Some(task) }
    }

    fn replace_active_poll(&self, next: Option<AbortHandle>) -> Option<AbortHandle> {
        match self.active_poll.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }

    /// 轮询一次连接状态并渲染结果。
    ///
    /// On a transport error or a non-200 answer nothing is rendered.
    /// On success the connection info is fetched again before returning.
    pub async fn get_wifi_connect_status(&self) -> Result<ConnectionStatus> {
        let report = self.device.connect_status().await?;
        let status = report.status();

        self.view.show_connect_status(ConnectionStatus::Connecting);
        match status {
            ConnectionStatus::Failed => {
                tracing::warn!(code = report.wifi_connect_status_json, "❌ Device failed to connect");
                self.view.show_connect_status(status);
            }
            ConnectionStatus::Success => {
                tracing::info!(code = report.wifi_connect_status_json, "✅ Device connected");
                self.view.show_connect_status(status);
                if let Err(e) = self.get_connect_info().await {
                    tracing::warn!("Connect info refresh failed: {}", e);
                }
            }
            ConnectionStatus::Connecting => {
                tracing::debug!(code = report.wifi_connect_status_json, "Still connecting");
            }
        }
        Ok(status)
    }

    /// 获取连接信息；设备已连接时填充字段并显示断开按钮
    pub async fn get_connect_info(&self) -> Result<Option<ConnectionInfo>> {
        let info = self.device.connect_info().await?;
        match &info {
            Some(info) => {
                tracing::debug!(ap = %info.access_point, ip = %info.ip_address, "Connect info received");
                self.view.show_connection_info(info);
            }
            None => tracing::debug!("Device is not connected, nothing to show"),
        }
        Ok(info)
    }

    /// 断开连接，并在固定延迟后重新加载面板（无论请求结果如何）
    pub async fn disconnect_wifi(&self) -> Option<LocalTimeTicker> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        tracing::info!("🔌 Requesting disconnect");

        let device = self.device.clone();
        tokio::spawn(async move {
            if let Err(e) = device.disconnect(timestamp).await {
                tracing::warn!("Disconnect request failed: {}", e);
            }
        });

        sleep(self.config.reload_delay).await;
        self.reload().await
    }

    /// 重新加载面板：停止正在进行的状态轮询，清空视图、恢复密码掩码并
    /// 重新执行加载流程
    pub async fn reload(&self) -> Option<LocalTimeTicker> {
        tracing::debug!("Reloading panel");
        if let Some(poll) = self.replace_active_poll(None) {
            poll.abort();
        }
        self.view.reload();
        self.password_masked.store(true, Ordering::SeqCst);
        self.load().await
    }

    /// 切换密码显示状态，返回切换后是否处于掩码状态
    pub fn show_password(&self) -> bool {
        let masked = !self.password_masked.fetch_xor(true, Ordering::SeqCst);
        self.view.set_password_masked(masked);
        masked
    }

    /// 获取并渲染一次设备本地时间
    pub async fn get_local_time(&self) -> Result<String> {
        let local = self.device.local_time().await?;
        self.view.show_local_time(&local.time);
        Ok(local.time)
    }

    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_local_time_ticker(&self) -> LocalTimeTicker {
        let panel = self.clone();
        let interval = self.config.local_time_interval;
        let task = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                if let Err(e) = panel.get_local_time().await {
                    tracing::warn!("Local time request failed: {}", e);
                }
            }
        });
        LocalTimeTicker { task }
    }
}
