//! sysmon-view: browser client for the n-sysmon dashboard.
//!
//! Pages are [`State`] machines driven by a [`Runtime`]; the `browser`
//! module wires them to the DOM, `fetch` and `setTimeout`.
//!
//! # Browser Usage (WASM)
//!
//! ```javascript
//! import init, { EnvVarApp } from './sysmon_view.js';
//!
//! async function main() {
//!     await init();
//!     const app = new EnvVarApp('theTree', 'errors', null);
//! }
//! ```

#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::new_without_default
)]

pub use sysmon_view_core::*;

pub mod browser;
pub mod datafiles_page;
pub mod env_page;
pub mod scalars_page;

pub use datafiles_page::{render_file_pages, DataFilesMessage, DataFilesPage};
pub use env_page::{EnvMessage, EnvPage, ENV_TITLE};
pub use scalars_page::{ScalarsMessage, ScalarsPage, DATA_FILES_NAMESPACE};

#[cfg(target_arch = "wasm32")]
pub use browser::{DataFilesApp, EnvVarApp, TimedScalarsApp};

pub use browser::{BrowserRouter, PageRoute};
