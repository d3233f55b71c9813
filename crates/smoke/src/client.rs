//! 서비스 HTTP 클라이언트

use std::time::Duration;

use reqwest::{Client, Url};
use tracing::debug;

use crate::error::SmokeError;

/// HTTP 응답 (상태 코드와 본문)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// 서비스 API 클라이언트
///
/// 모든 요청에 같은 타임아웃을 적용합니다.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// # Errors
    ///
    /// URL 형식이 잘못됐거나 http/https가 아니면 [`SmokeError::InvalidUrl`]
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SmokeError> {
        let invalid = |reason: String| SmokeError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };

        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base_url.scheme())));
        }

        let mut builder = Client::builder().timeout(timeout).connect_timeout(timeout);
        // 로컬 서비스 요청은 환경변수 프록시를 거치지 않음
        if is_loopback(&base_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| SmokeError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 기본 URL에 경로를 붙입니다. 기본 URL의 경로 접두사는 유지됩니다.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET 요청을 보냅니다. 어떤 HTTP 상태 코드든 응답이 오면 성공입니다.
    ///
    /// # Errors
    ///
    /// 연결 실패, 타임아웃, 본문 읽기 실패는 [`SmokeError::Transport`]
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpReply, SmokeError> {
        let url = self.url(path);
        let transport = |e: reqwest::Error| SmokeError::Transport {
            url: url.clone(),
            reason: describe(&e),
        };

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport)?;

        debug!(url = %url, status, bytes = body.len(), "http response");
        Ok(HttpReply { status, body })
    }
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

/// reqwest 에러를 원인 체인까지 포함한 한 줄로 만듭니다.
fn describe(err: &reqwest::Error) -> String {
    let mut msg = if err.is_timeout() {
        "request timed out".to_owned()
    } else if err.is_connect() {
        "connection failed".to_owned()
    } else {
        err.to_string()
    };

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(1)).expect("valid base url")
    }

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(client("http://localhost:8000").url("/"), "http://localhost:8000/");
        assert_eq!(
            client("http://localhost:8000/").url("/entanglement/bell_state"),
            "http://localhost:8000/entanglement/bell_state"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        assert_eq!(
            client("http://gw.local/api/").url("entanglement/bell_state"),
            "http://gw.local/api/entanglement/bell_state"
        );
    }

    #[test]
    fn loopback_hosts_detected() {
        let url = |s: &str| Url::parse(s).expect("url");
        assert!(is_loopback(&url("http://localhost:8000")));
        assert!(is_loopback(&url("http://127.0.0.1:8000")));
        assert!(is_loopback(&url("http://[::1]:8000")));
        assert!(!is_loopback(&url("http://quantum.example.com")));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            ApiClient::new("localhost:8000", Duration::from_secs(1)),
            Err(SmokeError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(SmokeError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new("ftp://host", Duration::from_secs(1)),
            Err(SmokeError::InvalidUrl { .. })
        ));
    }
}
