use panel_core::structs::{ConnectionInfo, ConnectionStatus, CredentialError};
use panel_core::traits::PanelView;
use std::sync::Mutex;

/// 把面板渲染到终端的视图。
///
/// Repeated identical status lines are collapsed so a long poll prints
/// `Connecting...` once instead of once per tick.
#[derive(Debug, Default)]
pub struct TerminalView {
    last_status: Mutex<Option<ConnectionStatus>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn render_status(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connecting => format!("⏳ {}", status.message()),
        ConnectionStatus::Failed => format!("❌ {}", status.message()),
        ConnectionStatus::Success => format!("✅ {}", status.message()),
    }
}

pub fn render_info(info: &ConnectionInfo) -> String {
    let mut out = String::new();
    for (label, value) in info.labeled_fields() {
        out.push_str(label);
        out.push_str(value);
        out.push('\n');
    }
    out.push_str("[ Disconnect available: `provisioner-panel disconnect` ]");
    out
}

impl PanelView for TerminalView {
    fn show_credential_errors(&self, errors: &[CredentialError]) {
        for error in errors {
            eprintln!("❗ {}", error);
        }
    }

    fn show_connect_status(&self, status: ConnectionStatus) {
        let Ok(mut last) = self.last_status.lock() else {
            return;
        };
        if *last != Some(status) {
            println!("{}", render_status(status));
            *last = Some(status);
        }
    }

    fn show_connection_info(&self, info: &ConnectionInfo) {
        println!("{}", render_info(info));
    }

    fn set_password_masked(&self, masked: bool) {
        tracing::debug!(masked, "Password mask toggled");
    }

    fn show_local_time(&self, time: &str) {
        println!("🕒 {}", time);
    }

    fn reload(&self) {
        if let Ok(mut last) = self.last_status.lock() {
            *last = None;
        }
        println!("🔄 Reloading panel...");
    }
}
