//! Hash-based page routing.
//!
//! Dashboard pages are addressed as `#/<page>?<query>`, e.g.
//! `#/timedScalars?loadfile=dump.json`. The query may also sit in the
//! regular search string.
//!
//! # Example
//!
//! ```
//! use sysmon_view::browser::router::PageRoute;
//!
//! let route = PageRoute::parse("#/timedScalars?loadfile=dump.json", "");
//! assert_eq!(route.page, "timedScalars");
//! assert_eq!(route.params.loadfile(), Some("dump.json"));
//! ```

use sysmon_view_core::{QueryParams, SelectionMode};
#[cfg(not(target_arch = "wasm32"))]
use std::sync::Mutex;

/// A parsed page location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRoute {
    /// Page id (first hash path segment), empty for the landing page
    pub page: String,
    /// Query parameters
    pub params: QueryParams,
}

impl PageRoute {
    /// Parse a location hash and search string.
    ///
    /// Parameters in the hash take precedence; the search string is used
    /// only when the hash carries no query.
    #[must_use]
    pub fn parse(hash: &str, search: &str) -> Self {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        let (path, query) = match hash.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (hash, None),
        };
        let page = path
            .split('/')
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();
        let params = query.map_or_else(|| QueryParams::parse(search), QueryParams::parse);
        Self { page, params }
    }

    /// Selection mode implied by the `loadfile` parameter.
    #[must_use]
    pub fn selection_mode(&self) -> SelectionMode {
        SelectionMode::from_loadfile(self.params.loadfile())
    }
}

/// Router over the window location.
///
/// In WASM this reads and writes `window.location`.
/// In non-WASM (tests), this keeps the location in memory.
#[derive(Debug)]
pub struct BrowserRouter {
    #[cfg(not(target_arch = "wasm32"))]
    location: Mutex<(String, String)>,
}

impl Default for BrowserRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserRouter {
    /// Create a router at the landing page.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self {}
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self {
                location: Mutex::new((String::new(), String::new())),
            }
        }
    }

    /// Create an in-memory router at the given hash and search string.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn at(hash: &str, search: &str) -> Self {
        Self {
            location: Mutex::new((hash.to_string(), search.to_string())),
        }
    }

    /// Current hash, including the leading `#`.
    #[must_use]
    pub fn hash(&self) -> String {
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::window()
                .and_then(|w| w.location().hash().ok())
                .unwrap_or_default()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.location
                .lock()
                .map(|l| l.0.clone())
                .unwrap_or_default()
        }
    }

    /// Current search string, including the leading `?`.
    #[must_use]
    pub fn search(&self) -> String {
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::window()
                .and_then(|w| w.location().search().ok())
                .unwrap_or_default()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.location
                .lock()
                .map(|l| l.1.clone())
                .unwrap_or_default()
        }
    }

    /// Parsed current route.
    #[must_use]
    pub fn current_route(&self) -> PageRoute {
        PageRoute::parse(&self.hash(), &self.search())
    }

    /// Navigate to a hash route such as `#/timedScalars?loadfile=x`.
    pub fn navigate(&self, hash: &str) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(window) = web_sys::window() {
                if window.location().set_hash(hash).is_err() {
                    tracing::warn!(hash, "navigation failed");
                }
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Ok(mut location) = self.location.lock() {
                location.0 = hash.to_string();
            }
        }
    }
}
