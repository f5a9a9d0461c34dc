//! # pwa-kit-browser-test
//!
//! Headless Chrome harness for checking how a site's service worker behaves
//! in a real browser, built on chromiumoxide.
//!
//! ## Architecture
//!
//! - **TestBrowser**: launches Chrome with a throwaway profile
//! - **Page**: a tab with console/exception capture and service worker probes
//! - **StaticSite**: serves a directory on an ephemeral localhost port
//! - **DevServer**: seam for running the same tests against another server
//! - **wait_for / wait_until**: polling with a deadline
//!
//! ## Example Usage
//!
//! ```ignore
//! use pwa_kit_browser_test::{StaticSite, TestBrowser, TestBrowserConfig, WaitConfig};
//!
//! let site = StaticSite::serve("dist").await?;
//! let browser = TestBrowser::launch(TestBrowserConfig::default()).await?;
//! let page = browser.new_page().await?;
//!
//! page.navigate_to(&site, "/").await?;
//! let registration = page.wait_for_service_worker(WaitConfig::default()).await?;
//! assert!(registration.scope.ends_with('/'));
//! assert!(page.exceptions().is_empty());
//!
//! browser.close().await?;
//! ```
//!
//! Browser tests need Chrome and are `#[ignore]`d; run them with
//! `cargo test -p pwa-kit-browser-test -- --ignored`.

pub mod browser;
pub mod console;
pub mod error;
pub mod page;
pub mod server;
pub mod wait;

pub use browser::{TestBrowser, TestBrowserConfig};
pub use console::{ConsoleCapture, ConsoleLevel, ConsoleMessage};
pub use error::{BrowserError, Result};
pub use page::{Page, RegistrationInfo};
pub use server::{DevServer, ExternalServer, StaticSite, StaticSiteBuilder};
pub use wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitConfig, wait_for, wait_until};
