//! View port writing into the page DOM.

use crate::datafiles_page::render_file_pages;
use sysmon_view_core::{FilePage, GraphSeries, IconClass, NodePatch, ViewPort};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

/// Applies view effects to DOM elements.
///
/// `container` receives tree markup and file lists, `error` receives error
/// text, and `chart` is called with the series array on every redraw.
#[derive(Debug)]
pub struct DomView {
    document: Document,
    container: Option<Element>,
    error: Option<Element>,
    chart: Option<js_sys::Function>,
}

impl DomView {
    /// Look up the target elements by id.
    pub fn new(
        container_id: Option<&str>,
        error_id: Option<&str>,
        chart: Option<js_sys::Function>,
    ) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .ok_or("No window")?
            .document()
            .ok_or("No document")?;
        let lookup = |id: Option<&str>| -> Result<Option<Element>, JsValue> {
            id.map(|id| {
                document
                    .get_element_by_id(id)
                    .ok_or_else(|| JsValue::from_str(&format!("Element '{id}' not found")))
            })
            .transpose()
        };
        let container = lookup(container_id)?;
        let error = lookup(error_id)?;
        Ok(Self {
            document,
            container,
            error,
            chart,
        })
    }

    /// The markup container, if any.
    pub fn container(&self) -> Option<&Element> {
        self.container.as_ref()
    }

    /// Find the data row whose FQN holder carries `fqn`.
    fn row_for(&self, fqn: &str) -> Option<Element> {
        let holders = self
            .container
            .as_ref()?
            .query_selector_all(".data-row > .fqn-holder")
            .ok()?;
        (0..holders.length())
            .filter_map(|i| holders.item(i))
            .find(|holder| holder.text_content().as_deref() == Some(fqn))
            .and_then(|holder| holder.parent_element())
    }
}

impl ViewPort for DomView {
    fn update_chart(&self, series: &[GraphSeries]) {
        let Some(chart) = &self.chart else {
            return;
        };
        let data = serde_json::to_string(series)
            .map_err(|e| JsValue::from_str(&e.to_string()))
            .and_then(|json| js_sys::JSON::parse(&json));
        match data {
            Ok(data) => {
                if let Err(err) = chart.call1(&JsValue::NULL, &data) {
                    tracing::warn!(?err, "chart update failed");
                }
            }
            Err(err) => tracing::warn!(?err, "chart data not serializable"),
        }
    }

    fn replace_markup(&self, html: &str) {
        if let Some(container) = &self.container {
            container.set_inner_html(html);
        }
    }

    /// Show or hide the children block and swap the icon class.
    ///
    /// The block is shown or hidden at once; `animate_ms` only delays the
    /// icon commit, which arrives as a second patch. Leaf rows have no
    /// children block and only get the icon.
    fn apply_patch(&self, patch: &NodePatch) {
        let Some(row) = self.row_for(&patch.fqn) else {
            tracing::debug!(fqn = %patch.fqn, "patch target not in DOM");
            return;
        };
        if let Some(children) = row
            .next_element_sibling()
            .filter(|e| e.class_list().contains("children"))
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        {
            let display = if patch.children_visible { "block" } else { "none" };
            let _ = children.style().set_property("display", display);
        }
        if let Ok(Some(icon)) = row.query_selector(".node-icon") {
            let classes = icon.class_list();
            for class in IconClass::ALL {
                let _ = classes.remove_1(class.css_class());
            }
            let _ = classes.add_1(patch.icon.css_class());
        }
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn show_error(&self, message: &str) {
        match &self.error {
            Some(error) => error.set_text_content(Some(message)),
            None => super::app::log(message),
        }
    }

    fn set_file_pages(&self, pages: &[FilePage]) {
        self.replace_markup(&render_file_pages(pages));
    }
}
