//! libcurl-backed `Transport`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

use crate::config::SegdlConfig;
use crate::error::FetchError;

use super::headers::{parse_probe_headers, ProbeResult};
use super::{is_success, Transport};

/// Timeouts and request decoration shared by every request.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Hard per-attempt timeout for one segment GET.
    pub segment_timeout: Duration,
    /// Timeout for playlist GET and HEAD probes.
    pub document_timeout: Duration,
    pub user_agent: Option<String>,
    pub headers: HashMap<String, String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            segment_timeout: Duration::from_secs(10),
            document_timeout: Duration::from_secs(30),
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

impl TransportOptions {
    pub fn from_config(cfg: &SegdlConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            segment_timeout: Duration::from_secs(cfg.segment_timeout_secs),
            user_agent: cfg.user_agent.clone(),
            headers: cfg.headers.clone().unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// One Easy handle per request; safe to share across worker threads.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: TransportOptions,
}

impl CurlTransport {
    pub fn new(opts: TransportOptions) -> Self {
        Self { opts }
    }

    fn easy(&self, url: &str, timeout: Duration) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.timeout(timeout)?;
        // Stalled transfers fail before the hard timeout.
        easy.low_speed_limit(1)?;
        easy.low_speed_time(timeout.min(self.opts.connect_timeout * 3))?;
        if let Some(ua) = &self.opts.user_agent {
            easy.useragent(ua)?;
        }

        let mut list = curl::easy::List::new();
        for (k, v) in &self.opts.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !self.opts.headers.is_empty() {
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl Transport for CurlTransport {
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let mut easy = self.easy(url, self.opts.document_timeout)?;
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !is_success(code) {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: code,
            });
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let storage_err = |source| FetchError::Storage {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = File::create(dest).map_err(storage_err)?;
        let mut easy = self.easy(url, self.opts.segment_timeout)?;

        let mut written = 0u64;
        let mut write_error: Option<std::io::Error> = None;
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    // Short count aborts the transfer.
                    Ok(0)
                }
            })?;
            transfer.perform()
        };

        if let Err(e) = perform_result {
            if let Some(io_err) = write_error.take() {
                return Err(storage_err(io_err));
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !is_success(code) {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: code,
            });
        }
        file.flush().map_err(storage_err)?;
        Ok(written)
    }

    fn probe(&self, url: &str) -> Result<ProbeResult, FetchError> {
        let mut lines: Vec<String> = Vec::new();
        let mut easy = self.easy(url, self.opts.document_timeout)?;
        easy.nobody(true)?;
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        Ok(parse_probe_headers(code, &lines))
    }
}
