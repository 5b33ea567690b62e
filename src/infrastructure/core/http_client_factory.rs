use reqwest::Client;
use std::time::Duration;
use url::Url;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates the HTTP client used for the prediction backend.
    ///
    /// No retry layer: a failed call is reported once and the router decides
    /// whether to fall back.
    pub fn create_client(timeout: Duration) -> Client {
        Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}

/// Join an endpoint path onto the service base URL.
///
/// Leading slashes in `path` are ignored so a base URL with a path prefix
/// (e.g. `https://host/ml/`) keeps its prefix.
pub fn endpoint_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_plain_host() {
        let base = Url::parse("http://10.0.2.2:8000").unwrap();
        let url = endpoint_url(&base, "/api/v1/predict/lstm").unwrap();
        assert_eq!(url.as_str(), "http://10.0.2.2:8000/api/v1/predict/lstm");
    }

    #[test]
    fn test_endpoint_url_keeps_path_prefix() {
        let base = Url::parse("https://example.com/ml").unwrap();
        let url = endpoint_url(&base, "/health").unwrap();
        assert_eq!(url.as_str(), "https://example.com/ml/health");
    }
}
