//! Browser bindings for the dashboard pages.
//!
//! Routing and the console log layer are cross-platform. The REST transport, timers, DOM view and the
//! exported page apps exist only on wasm32.

// WASM-only modules
#[cfg(target_arch = "wasm32")]
pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod rest;
#[cfg(target_arch = "wasm32")]
pub mod timers;

// Cross-platform modules
pub mod console;
pub mod router;

#[cfg(target_arch = "wasm32")]
pub use app::{DataFilesApp, EnvVarApp, TimedScalarsApp};
#[cfg(target_arch = "wasm32")]
pub use dom::DomView;
#[cfg(target_arch = "wasm32")]
pub use rest::RestFetchPort;
#[cfg(target_arch = "wasm32")]
pub use timers::BrowserTimers;
pub use console::ConsoleLayer;
pub use router::{BrowserRouter, PageRoute};
