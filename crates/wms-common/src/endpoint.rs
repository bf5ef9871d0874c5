//! WMS endpoint descriptor.

use serde::{Deserialize, Serialize};

/// Location of a WMS server: host, port and service path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsEndpoint {
    host: String,
    port: u16,
    path: String,
}

impl WmsEndpoint {
    /// Create an endpoint, normalizing the host (any `scheme://` prefix is
    /// stripped) and the path (a leading `/` is ensured).
    pub fn new(host: &str, port: u16, path: &str) -> Self {
        let host = match host.find("://") {
            Some(idx) => &host[idx + 3..],
            None => host,
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            host: host.to_string(),
            port,
            path,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Build the service URL for the given protocol.
    pub fn url(&self, protocol: &str) -> String {
        format!("{}://{}:{}{}", protocol, self.host, self.port, self.path)
    }

    /// The default (plain HTTP) service URL.
    pub fn http_url(&self) -> String {
        self.url("http")
    }
}

impl std::fmt::Display for WmsEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.http_url())
    }
}
