//! REST transport over `window.fetch`.

use sysmon_view_core::{FetchCallback, FetchPort, FetchRequest};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

/// Fetch port calling `<base>/<namespace>/<operation>` and decoding JSON.
///
/// Failed calls are logged to the console and dropped.
#[derive(Debug, Clone)]
pub struct RestFetchPort {
    base: String,
    namespace: String,
}

impl RestFetchPort {
    /// Create a port for the page owning `namespace`.
    pub fn new(base: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            namespace: namespace.into(),
        }
    }

    fn url(&self, request: &FetchRequest) -> String {
        format!("{}/{}", self.base, request.path(&self.namespace))
    }
}

impl FetchPort for RestFetchPort {
    fn call(&self, request: FetchRequest, on_response: FetchCallback) {
        let url = self.url(&request);
        let Some(window) = web_sys::window() else {
            tracing::warn!(%url, "no window; fetch dropped");
            return;
        };
        let promise = window.fetch_with_str(&url);
        wasm_bindgen_futures::spawn_local(async move {
            match fetch_json(promise).await {
                Ok(payload) => on_response(payload),
                Err(err) => {
                    tracing::warn!(%url, ?err, "fetch failed");
                    super::app::log(&format!("fetch {url} failed: {err:?}"));
                }
            }
        });
    }
}

async fn fetch_json(promise: js_sys::Promise) -> Result<serde_json::Value, JsValue> {
    let response: Response = JsFuture::from(promise).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let json = JsFuture::from(response.json()?).await?;
    let text = String::from(js_sys::JSON::stringify(&json)?);
    serde_json::from_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}
