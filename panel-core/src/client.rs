use crate::structs::{ConnectionInfo, Credentials, DisconnectRequest, LocalTime, StatusReport};
use crate::traits::DeviceApi;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

// 设备固件注册的接口路径
pub const CONNECT_PATH: &str = "/wifiConnect.json";
pub const CONNECT_STATUS_PATH: &str = "/wifiConnectStatus";
pub const CONNECT_INFO_PATH: &str = "/wifiConnectInfo.json";
pub const DISCONNECT_PATH: &str = "/wifiDisconnect.json";
pub const LOCAL_TIME_PATH: &str = "/localTime.json";

/// 状态轮询请求的固定请求体
pub const CONNECT_STATUS_BODY: &str = "wifi_connect_status_json";

/// 通过 HTTP 访问设备的 `DeviceApi` 实现。
///
/// `base_url` is the device origin; endpoint paths are absolute, so any path
/// on it is replaced rather than extended.
#[derive(Debug, Clone)]
pub struct HttpDevice {
    http: Client,
    base_url: Url,
}

impl HttpDevice {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// 只接受 200，其他状态码一律视为失败
    fn ensure_ok(path: &'static str, response: &Response) -> Result<()> {
        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(Error::UnexpectedStatus {
                path,
                status: response.status().as_u16(),
            })
        }
    }
}

/// 解析 `/wifiConnectInfo.json` 的响应体。
///
/// The firmware sends an empty body while the station is not connected.
pub fn parse_connect_info(body: &str) -> Result<Option<ConnectionInfo>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

#[async_trait]
impl DeviceApi for HttpDevice {
    async fn connect(&self, credentials: &Credentials) -> Result<()> {
        tracing::debug!(ssid = %credentials.ssid, "POST {}", CONNECT_PATH);
        let response = self
            .http
            .post(self.endpoint(CONNECT_PATH)?)
            .json(&credentials.to_request())
            .send()
            .await?;
        Self::ensure_ok(CONNECT_PATH, &response)
    }

    async fn connect_status(&self) -> Result<StatusReport> {
        let response = self
            .http
            .post(self.endpoint(CONNECT_STATUS_PATH)?)
            .body(CONNECT_STATUS_BODY)
            .send()
            .await?;
        Self::ensure_ok(CONNECT_STATUS_PATH, &response)?;
        let body = response.text().await?;
        let report: StatusReport = serde_json::from_str(&body)?;
        tracing::debug!(code = report.wifi_connect_status_json, "Device connect status");
        Ok(report)
    }

    async fn connect_info(&self) -> Result<Option<ConnectionInfo>> {
        let response = self.http.get(self.endpoint(CONNECT_INFO_PATH)?).send().await?;
        Self::ensure_ok(CONNECT_INFO_PATH, &response)?;
        let body = response.text().await?;
        parse_connect_info(&body)
    }

    async fn disconnect(&self, timestamp: u64) -> Result<()> {
        tracing::debug!(timestamp, "DELETE {}", DISCONNECT_PATH);
        let response = self
            .http
            .delete(self.endpoint(DISCONNECT_PATH)?)
            .form(&DisconnectRequest { timestamp })
            .send()
            .await?;
        Self::ensure_ok(DISCONNECT_PATH, &response)
    }

    async fn local_time(&self) -> Result<LocalTime> {
        let response = self.http.get(self.endpoint(LOCAL_TIME_PATH)?).send().await?;
        Self::ensure_ok(LOCAL_TIME_PATH, &response)?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_info_body_means_not_connected() {
        assert_eq!(parse_connect_info("").unwrap(), None);
        assert_eq!(parse_connect_info(" \n").unwrap(), None);
    }

    #[test]
    fn info_body_is_parsed() {
        let info = parse_connect_info(
            r#"{"ip":"10.0.0.7","netmask":"255.0.0.0","gateway":"10.0.0.1","ap":"lab"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(info.access_point, "lab");
        assert_eq!(info.ip_address, "10.0.0.7");
    }

    #[test]
    fn truncated_info_body_is_an_error() {
        assert!(matches!(parse_connect_info(r#"{"ip":"#), Err(Error::Json(_))));
    }

    #[test]
    fn endpoints_join_onto_base_url() {
        let device = HttpDevice::new(Url::parse("http://192.168.4.1").unwrap());
        assert_eq!(
            device.endpoint(CONNECT_STATUS_PATH).unwrap().as_str(),
            "http://192.168.4.1/wifiConnectStatus"
        );
        assert_eq!(
            device.endpoint(LOCAL_TIME_PATH).unwrap().as_str(),
            "http://192.168.4.1/localTime.json"
        );
    }
}
