use anyhow::{Context, Result};

/// Identity of a per-server statistics record.
///
/// Stats are keyed by `(hostname, protocol)` so that e.g. HTTP and FTP
/// observations for the same host stay separate. The ordering (hostname
/// first, then protocol) lets the owning policy keep records in a sorted
/// collection indexed by identity alone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerKey {
    hostname: String,
    protocol: String,
}

impl ServerKey {
    pub fn new(hostname: &str, protocol: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            protocol: protocol.to_string(),
        }
    }

    /// Construct a server key from a URL string (host + scheme).
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed =
            url::Url::parse(url).with_context(|| format!("invalid URL for server stat: {url}"))?;
        let hostname = parsed
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL missing host for server stat: {url}"))?;
        Ok(Self::new(hostname, parsed.scheme()))
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }
}
