//! Deployment-specific rewriting of the resolved base URL.
//!
//! An explicit URL override wins over everything the resolver decided. Without
//! one, hosted notebook environments that can proxy a local port get a chance
//! to rewrite the URL. The result always ends with exactly one `/`.

use log::{debug, info};

use crate::endpoint::EndpointDescriptor;

/// Capability of a hosted notebook to expose a kernel-side port to the browser.
pub trait ProxyBridge {
    /// Browser-reachable URL for `port`, or `None` when the bridge is
    /// unavailable in this environment.
    fn proxy_port(&self, port: u16) -> Option<String>;
}

/// Apply overrides to a resolved endpoint.
pub fn apply_overrides(
    mut endpoint: EndpointDescriptor,
    raw_port: u16,
    url_override: Option<&str>,
    proxy: Option<&dyn ProxyBridge>,
) -> EndpointDescriptor {
    if let Some(url) = url_override {
        info!("[overrides] Using server URL override {}", url);
        endpoint.base_url = url.to_string();
    } else if let Some(proxied) = proxy.and_then(|bridge| bridge.proxy_port(raw_port)) {
        info!("[overrides] Port {} proxied as {}", raw_port, proxied);
        endpoint.base_url = proxied;
    } else {
        debug!("[overrides] No override for port {}", raw_port);
    }

    endpoint.base_url = with_trailing_slash(&endpoint.base_url);
    endpoint
}

/// Normalize `url` to end with exactly one `/`.
pub fn with_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bridge(Option<&'static str>);

    impl ProxyBridge for Bridge {
        fn proxy_port(&self, port: u16) -> Option<String> {
            self.0.map(|url| format!("{}{}", url, port))
        }
    }

    fn endpoint() -> EndpointDescriptor {
        EndpointDescriptor::new("http://localhost:9876/")
    }

    #[test]
    fn test_override_wins_over_proxy() {
        let bridge = Bridge(Some("https://proxy.example/"));
        let result = apply_overrides(
            endpoint(),
            9876,
            Some("https://override.example/"),
            Some(&bridge),
        );
        assert_eq!(result.base_url, "https://override.example/");
    }

    #[test]
    fn test_proxy_rewrites_base_url() {
        let bridge = Bridge(Some("https://proxy.example/p/"));
        let result = apply_overrides(endpoint(), 9876, None, Some(&bridge));
        assert_eq!(result.base_url, "https://proxy.example/p/9876/");
    }

    #[test]
    fn test_unavailable_proxy_keeps_url() {
        let bridge = Bridge(None);
        let result = apply_overrides(endpoint(), 9876, None, Some(&bridge));
        assert_eq!(result.base_url, "http://localhost:9876/");

        let result = apply_overrides(endpoint(), 9876, None, None);
        assert_eq!(result.base_url, "http://localhost:9876/");
    }

    #[test]
    fn test_override_keeps_token_and_params() {
        let mut resolved = endpoint();
        resolved.auth_token = "AQI=".to_string();
        resolved.extra_params.insert("authProvider", "parent");
        let result = apply_overrides(resolved, 1, Some("https://o.example"), None);
        assert_eq!(result.base_url, "https://o.example/");
        assert_eq!(result.auth_token, "AQI=");
        assert_eq!(result.extra_params.get("authProvider"), Some("parent"));
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(with_trailing_slash("http://h:1"), "http://h:1/");
        assert_eq!(with_trailing_slash("http://h:1/"), "http://h:1/");
        assert_eq!(with_trailing_slash("http://h:1//"), "http://h:1/");
    }
}
