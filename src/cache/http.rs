//! Artifact retrieval over HTTP(S) or from the local filesystem
//!
//! All requests are blocking. Per-phase timeouts come from the environment
//! and are never retried here; callers own any retry policy.

use crate::cache::mirror::{redact_uri, scrub};
use crate::error::{PakError, PakResult};
use std::env;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Per-phase HTTP client timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientTimeouts {
    pub dialer: Duration,
    pub dialer_keep_alive: Duration,
    pub tls_handshake: Duration,
    pub response_header: Duration,
    pub expect_continue: Duration,
}

impl Default for HttpClientTimeouts {
    fn default() -> Self {
        Self {
            dialer: Duration::from_secs(6),
            dialer_keep_alive: Duration::from_secs(60),
            tls_handshake: Duration::from_secs(5),
            response_header: Duration::from_secs(5),
            expect_continue: Duration::from_secs(1),
        }
    }
}

impl HttpClientTimeouts {
    /// Defaults overridden by `$BP_DIALER_TIMEOUT`, `$BP_DIALER_KEEP_ALIVE`,
    /// `$BP_TLS_HANDSHAKE_TIMEOUT`, `$BP_RESPONSE_HEADER_TIMEOUT` and
    /// `$BP_EXPECT_CONTINUE_TIMEOUT` (whole seconds)
    pub fn from_env() -> PakResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            dialer: seconds_from_env("BP_DIALER_TIMEOUT", defaults.dialer)?,
            dialer_keep_alive: seconds_from_env("BP_DIALER_KEEP_ALIVE", defaults.dialer_keep_alive)?,
            tls_handshake: seconds_from_env("BP_TLS_HANDSHAKE_TIMEOUT", defaults.tls_handshake)?,
            response_header: seconds_from_env(
                "BP_RESPONSE_HEADER_TIMEOUT",
                defaults.response_header,
            )?,
            expect_continue: seconds_from_env(
                "BP_EXPECT_CONTINUE_TIMEOUT",
                defaults.expect_continue,
            )?,
        })
    }
}

fn seconds_from_env(name: &str, default: Duration) -> PakResult<Duration> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| PakError::InvalidTimeout {
                name: name.to_string(),
                value: raw,
            }),
        Err(_) => Ok(default),
    }
}

/// An outgoing download request, open to modification before it is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

impl DownloadRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: Vec::new(),
        }
    }

    /// Add or replace a header (names compare case-insensitively)
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Hook applied to every request, e.g. to add an `Authorization` header
pub type RequestModifier = Box<dyn Fn(&mut DownloadRequest) -> PakResult<()> + Send + Sync>;

/// Blocking artifact fetcher
pub struct Fetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl Fetcher {
    pub fn new(timeouts: HttpClientTimeouts, user_agent: impl Into<String>) -> Self {
        // ureq's connect phase includes the TLS handshake
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(timeouts.dialer + timeouts.tls_handshake))
            .timeout_recv_response(Some(timeouts.response_header))
            .timeout_await_100(Some(timeouts.expect_continue))
            .max_idle_age(timeouts.dialer_keep_alive)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            user_agent: user_agent.into(),
        }
    }

    /// Fetch `uri` into `destination`, choosing the transport by URI scheme
    pub fn fetch(
        &self,
        uri: &str,
        destination: &Path,
        modifiers: &[RequestModifier],
    ) -> PakResult<()> {
        let mut request = DownloadRequest::new(uri);
        request.set_header("User-Agent", self.user_agent.clone());
        for modify in modifiers {
            modify(&mut request)?;
        }

        let url = Url::parse(&request.uri).map_err(|e| PakError::InvalidUri {
            uri: redact_uri(&request.uri),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => self.fetch_http(&request, destination),
            "file" => copy_file(&url, &request.uri, destination),
            _ => Err(PakError::UnsupportedScheme {
                uri: redact_uri(&request.uri),
            }),
        }
    }

    fn fetch_http(&self, request: &DownloadRequest, destination: &Path) -> PakResult<()> {
        let uri = &request.uri;
        debug!("GET {}", redact_uri(uri));

        let mut builder = self.agent.get(uri.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.call().map_err(|e| PakError::Download {
            uri: redact_uri(uri),
            reason: scrub(&e.to_string(), uri),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PakError::HttpStatus {
                uri: redact_uri(uri),
                status: status.as_u16(),
            });
        }

        let mut reader = response.into_body().into_reader();
        let mut file = File::create(destination)
            .map_err(|e| PakError::io(format!("creating {}", destination.display()), e))?;
        io::copy(&mut reader, &mut file).map_err(|e| PakError::Download {
            uri: redact_uri(uri),
            reason: scrub(&e.to_string(), uri),
        })?;
        Ok(())
    }
}

fn copy_file(url: &Url, uri: &str, destination: &Path) -> PakResult<()> {
    let source = url.to_file_path().map_err(|_| PakError::InvalidUri {
        uri: redact_uri(uri),
        reason: "not a local file path".to_string(),
    })?;
    debug!("Copying {}", source.display());

    fs::copy(&source, destination).map_err(|e| PakError::Download {
        uri: redact_uri(uri),
        reason: e.to_string(),
    })?;
    Ok(())
}
