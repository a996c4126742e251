//! WASM entry points for the dashboard pages.
//!
//! ```javascript
//! import init, { EnvVarApp, TimedScalarsApp } from './sysmon_view.js';
//!
//! await init();
//! const env = new EnvVarApp('theTree', 'errors', null);
//! const scalars = new TimedScalarsApp(data => chart.updateWithData(data), 'errors', null);
//! scalars.toggle('cpu-load');
//! scalars.set_auto_refresh(true);
//! ```

use super::dom::DomView;
use super::rest::RestFetchPort;
use super::router::BrowserRouter;
use super::timers::BrowserTimers;
use crate::datafiles_page::{DataFilesMessage, DataFilesPage};
use crate::env_page::{EnvMessage, EnvPage};
use crate::scalars_page::{ScalarsMessage, ScalarsPage, DATA_FILES_NAMESPACE};
use std::rc::Rc;
use sysmon_view_core::{DashboardConfig, Ports, Runtime};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};

/// REST namespace of the environment page.
pub const ENV_NAMESPACE: &str = "envvar";
/// REST namespace of the timed-scalars page.
pub const SCALARS_NAMESPACE: &str = "timedScalars";

fn load_config(config_toml: Option<String>) -> Result<DashboardConfig, JsValue> {
    config_toml.map_or_else(
        || Ok(DashboardConfig::default()),
        |toml| DashboardConfig::from_toml_str(&toml).map_err(|e| JsValue::from_str(&e.to_string())),
    )
}

fn browser_ports(config: &DashboardConfig, namespace: &str, view: DomView) -> Ports {
    Ports {
        fetch: Rc::new(RestFetchPort::new(config.rest_base.clone(), namespace)),
        timers: Rc::new(BrowserTimers),
        view: Rc::new(view),
    }
}

/// Environment tree page.
#[wasm_bindgen]
pub struct EnvVarApp {
    runtime: Runtime<EnvPage>,
    _click_callback: Closure<dyn FnMut(MouseEvent)>,
}

#[wasm_bindgen]
impl EnvVarApp {
    /// Attach to the tree container and load the tree.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: &str,
        error_id: Option<String>,
        config_toml: Option<String>,
    ) -> Result<EnvVarApp, JsValue> {
        let config = load_config(config_toml)?;
        let view = DomView::new(Some(container_id), error_id.as_deref(), None)?;
        let container = view.container().cloned().ok_or("No tree container")?;

        let runtime = Runtime::new(
            EnvPage::new(config.slide_ms),
            browser_ports(&config, ENV_NAMESPACE, view),
        );

        let handler = runtime.clone();
        let cb = Closure::new(move |e: MouseEvent| {
            if let Some(fqn) = clicked_fqn(&e) {
                handler.dispatch(EnvMessage::Toggle(fqn));
            }
        });
        container
            .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .ok();

        runtime.dispatch(EnvMessage::Start);
        Ok(Self {
            runtime,
            _click_callback: cb,
        })
    }

    /// Toggle a node by FQN.
    pub fn toggle(&self, fqn: &str) {
        self.runtime.dispatch(EnvMessage::Toggle(fqn.to_string()));
    }

    /// Number of nodes in the current tree.
    pub fn node_count(&self) -> usize {
        self.runtime
            .with_state(|page| page.forest().map_or(0, sysmon_view_core::Forest::len))
    }
}

/// FQN of the row with children that a click landed in.
fn clicked_fqn(event: &MouseEvent) -> Option<String> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let row = target.closest(".data-row.with-children").ok()??;
    row.query_selector(".fqn-holder").ok()??.text_content()
}

/// Timed-scalars chart page.
#[wasm_bindgen]
pub struct TimedScalarsApp {
    runtime: Runtime<ScalarsPage>,
}

#[wasm_bindgen]
impl TimedScalarsApp {
    /// Create the page; `chart` is called with the series array on redraw.
    ///
    /// The mode follows the `loadfile` parameter of the current location.
    #[wasm_bindgen(constructor)]
    pub fn new(
        chart: js_sys::Function,
        error_id: Option<String>,
        config_toml: Option<String>,
    ) -> Result<TimedScalarsApp, JsValue> {
        let config = load_config(config_toml)?;
        let mode = BrowserRouter::new().current_route().selection_mode();
        let page = ScalarsPage::new(mode, &config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let view = DomView::new(None, error_id.as_deref(), Some(chart))?;

        let runtime = Runtime::new(page, browser_ports(&config, SCALARS_NAMESPACE, view));
        runtime.dispatch(ScalarsMessage::Start);
        Ok(Self { runtime })
    }

    /// Toggle a series.
    pub fn toggle(&self, key: &str) {
        self.runtime.dispatch(ScalarsMessage::Toggle(key.to_string()));
    }

    /// Refresh now.
    pub fn refresh(&self) {
        self.runtime.dispatch(ScalarsMessage::Refresh);
    }

    /// Switch auto-refresh on or off.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.runtime.dispatch(ScalarsMessage::SetAutoRefresh(enabled));
    }

    /// Change the auto-refresh interval.
    pub fn set_interval_seconds(&self, seconds: u32) {
        self.runtime.dispatch(ScalarsMessage::SetInterval(seconds));
    }

    /// Whether the page polls the server.
    pub fn is_live(&self) -> bool {
        self.runtime
            .with_state(|page| page.selection().mode().is_live())
    }

    /// Whether `key` is toggled on.
    pub fn is_selected(&self, key: &str) -> bool {
        self.runtime
            .with_state(|page| page.selection().is_selected(key))
    }

    /// Known series keys as JSON.
    pub fn series_keys_json(&self) -> String {
        self.runtime.with_state(|page| {
            let keys: Vec<&String> = page
                .selection()
                .catalog()
                .map(|c| c.keys().collect())
                .unwrap_or_default();
            serde_json::to_string(&keys).unwrap_or_default()
        })
    }

    /// Chart options as JSON, for setting up the host chart.
    pub fn chart_options_json(&self) -> String {
        self.runtime
            .with_state(|page| serde_json::to_string(page.chart_options()).unwrap_or_default())
    }
}

/// Data-files page.
#[wasm_bindgen]
pub struct DataFilesApp {
    runtime: Runtime<DataFilesPage>,
}

#[wasm_bindgen]
impl DataFilesApp {
    /// Attach to the list container and load the file list.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: &str,
        error_id: Option<String>,
        config_toml: Option<String>,
    ) -> Result<DataFilesApp, JsValue> {
        let config = load_config(config_toml)?;
        let view = DomView::new(Some(container_id), error_id.as_deref(), None)?;
        let runtime = Runtime::new(
            DataFilesPage::new(),
            browser_ports(&config, DATA_FILES_NAMESPACE, view),
        );
        runtime.dispatch(DataFilesMessage::Refresh);
        Ok(Self { runtime })
    }

    /// Reload the file list.
    pub fn refresh(&self) {
        self.runtime.dispatch(DataFilesMessage::Refresh);
    }
}

/// Initialize the panic hook and route `tracing` events to the console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    super::console::install(tracing::Level::DEBUG);
}

/// Log to browser console.
#[wasm_bindgen]
pub fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}
