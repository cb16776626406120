//! Chrome process lifecycle and the session factory handed to the coordinator.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use courtbook_core::{BookingError, BrowserSession, PageLayout, SessionFactory};

use crate::client::{CdpClient, fetch_version};
use crate::error::CdpError;
use crate::page::CdpBookingPage;

const STARTUP_POLL: Duration = Duration::from_millis(200);
const EXIT_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Chrome/Chromium binary. Searched in the usual places when unset.
    pub chrome_path: Option<PathBuf>,
    /// Remote debugging port for a launched browser; 0 picks a free one.
    pub debug_port: u16,
    pub headless: bool,
    /// Attach to an already running browser (e.g. `http://127.0.0.1:9222`)
    /// instead of launching one.
    pub endpoint: Option<String>,
    pub startup_timeout_secs: u64,
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            debug_port: 0,
            headless: true,
            endpoint: None,
            startup_timeout_secs: 15,
            extra_args: Vec::new(),
        }
    }
}

/// Find a Chrome-family executable in the standard install locations.
pub fn find_chrome() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    let paths: &[&str] = &[
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    #[cfg(target_os = "linux")]
    let paths: &[&str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    #[cfg(target_os = "windows")]
    let paths: &[&str] = &[
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ];

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    let paths: &[&str] = &[];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Command-line flags for a launched browser.
pub fn chrome_args(options: &BrowserOptions, port: u16, profile_dir: &Path) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={port}"),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-sync".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
    }
    args.extend(options.extra_args.iter().cloned());
    args.push("about:blank".to_string());
    args
}

fn free_port() -> Result<u16, CdpError> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| CdpError::LaunchFailed(format!("no free port: {e}")))?;
    listener
        .local_addr()
        .map(|a| a.port())
        .map_err(|e| CdpError::LaunchFailed(e.to_string()))
}

/// A browser process this run started. Dropping it kills the process and
/// removes the throw-away profile.
struct LaunchedChrome {
    child: Child,
    _profile: TempDir,
}

pub struct ChromeSessionFactory {
    options: BrowserOptions,
    layout: PageLayout,
}

impl ChromeSessionFactory {
    pub fn new(options: BrowserOptions, layout: PageLayout) -> Self {
        Self { options, layout }
    }

    async fn launch(&self) -> Result<(LaunchedChrome, String), CdpError> {
        let chrome = self
            .options
            .chrome_path
            .clone()
            .or_else(find_chrome)
            .ok_or(CdpError::ChromeNotFound)?;
        let profile = tempfile::Builder::new()
            .prefix("courtbook-chrome-")
            .tempdir()
            .map_err(|e| CdpError::LaunchFailed(format!("profile dir: {e}")))?;
        let port = match self.options.debug_port {
            0 => free_port()?,
            p => p,
        };

        let child = Command::new(&chrome)
            .args(chrome_args(&self.options, port, profile.path()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CdpError::LaunchFailed(format!("{}: {e}", chrome.display())))?;
        info!(chrome = %chrome.display(), pid = ?child.id(), port, headless = self.options.headless, "launched chrome");

        let launched = LaunchedChrome { child, _profile: profile };
        let endpoint = format!("http://127.0.0.1:{port}");
        self.wait_until_ready(&endpoint).await?;
        Ok((launched, endpoint))
    }

    async fn wait_until_ready(&self, endpoint: &str) -> Result<(), CdpError> {
        let deadline = Instant::now() + Duration::from_secs(self.options.startup_timeout_secs);
        loop {
            tokio::time::sleep(STARTUP_POLL).await;
            match fetch_version(endpoint).await {
                Ok(_) => return Ok(()),
                Err(e) if Instant::now() >= deadline => {
                    return Err(CdpError::LaunchFailed(format!("not ready after {}s: {e}", self.options.startup_timeout_secs)));
                }
                Err(_) => {}
            }
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    type Session = ChromeSession;

    async fn acquire(&self) -> Result<ChromeSession, BookingError> {
        let (launched, endpoint) = match &self.options.endpoint {
            Some(endpoint) => {
                info!(%endpoint, "attaching to running browser");
                (None, endpoint.clone())
            }
            None => {
                let (launched, endpoint) = self.launch().await?;
                (Some(launched), endpoint)
            }
        };

        let client = CdpClient::connect(&endpoint).await?;
        let page = client.new_page().await?;
        debug!(target_id = page.target_id(), "page session ready");

        Ok(ChromeSession {
            page: CdpBookingPage::new(page, self.layout.clone()),
            client,
            launched,
        })
    }
}

/// Field order matters on drop: page and client go before the process.
pub struct ChromeSession {
    page: CdpBookingPage,
    client: CdpClient,
    launched: Option<LaunchedChrome>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Page = CdpBookingPage;

    fn page(&self) -> &CdpBookingPage {
        &self.page
    }

    async fn release(self) -> Result<(), BookingError> {
        let ChromeSession { page, client, launched } = self;
        let target_id = page.session().target_id().to_string();

        let Some(mut launched) = launched else {
            // Someone else's browser: close our tab only.
            client.close_page(&target_id).await?;
            info!(endpoint = client.endpoint(), "closed page in attached browser");
            return Ok(());
        };

        if let Err(e) = client.close_browser().await {
            debug!(error = %e, "Browser.close failed, killing process");
        }
        drop(page);
        drop(client);

        match tokio::time::timeout(EXIT_WAIT, launched.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "chrome exited"),
            Ok(Err(e)) => warn!(error = %e, "waiting for chrome failed"),
            Err(_) => {
                warn!("chrome did not exit, killing");
                launched
                    .child
                    .kill()
                    .await
                    .map_err(|e| BookingError::Browser(format!("failed to kill chrome: {e}")))?;
            }
        }
        info!("browser released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_launch_flags() {
        let args = chrome_args(&BrowserOptions::default(), 9333, Path::new("/tmp/profile"));
        assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        for flag in ["--headless=new", "--no-sandbox", "--disable-dev-shm-usage"] {
            assert!(args.iter().any(|a| a == flag), "{flag}");
        }
        assert_eq!(args.last().map(String::as_str), Some("about:blank"));
    }

    #[test]
    fn headed_launch_omits_headless() {
        let options = BrowserOptions {
            headless: false,
            extra_args: vec!["--window-size=1280,900".into()],
            ..BrowserOptions::default()
        };
        let args = chrome_args(&options, 9222, Path::new("/tmp/p"));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--window-size=1280,900".to_string()));
    }

    #[test]
    fn free_port_is_nonzero() {
        assert_ne!(free_port().unwrap(), 0);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: BrowserOptions = serde_json::from_str(r#"{"endpoint":"http://127.0.0.1:9222"}"#).unwrap();
        assert_eq!(options.endpoint.as_deref(), Some("http://127.0.0.1:9222"));
        assert!(options.headless);
        assert_eq!(options.startup_timeout_secs, 15);
    }
}
