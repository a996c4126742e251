//! Data-files page: lists the data files stored on the server.

use sysmon_view_core::{
    decode_file_pages, escape_html, Command, FetchRequest, FilePage, State, ViewError,
};
use std::fmt::Write as _;

/// Render the file list, one table per page.
///
/// File names link into their page when the page is known.
#[must_use]
pub fn render_file_pages(pages: &[FilePage]) -> String {
    let mut out = String::new();
    for page in pages {
        let _ = write!(
            out,
            r#"<div class="data-file-page"><h4>{}</h4><table class="data-files">"#,
            escape_html(&page.page)
        );
        for file in &page.files {
            let name = escape_html(&file.name);
            let cell = match file.load_link() {
                Some(link) => format!(r#"<a href="{}">{name}</a>"#, escape_html(&link)),
                None => name,
            };
            let _ = write!(
                out,
                r#"<tr><td class="file-name">{cell}</td><td class="file-size">{}</td></tr>"#,
                file.size
            );
        }
        out.push_str("</table></div>");
    }
    out
}

/// Messages of the data-files page.
#[derive(Debug, Clone, PartialEq)]
pub enum DataFilesMessage {
    /// Page opened or refresh button
    Refresh,
    /// `getFiles` answered
    Loaded(serde_json::Value),
}

/// State of the data-files page.
#[derive(Debug, Clone, Default)]
pub struct DataFilesPage {
    pages: Vec<FilePage>,
}

impl DataFilesPage {
    /// Create an empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files grouped by page, as last loaded.
    #[must_use]
    pub fn pages(&self) -> &[FilePage] {
        &self.pages
    }
}

impl State for DataFilesPage {
    type Message = DataFilesMessage;

    fn update(&mut self, msg: Self::Message) -> Command<Self::Message> {
        match msg {
            DataFilesMessage::Refresh => {
                Command::fetch(FetchRequest::local("getFiles"), DataFilesMessage::Loaded)
            }
            DataFilesMessage::Loaded(payload) => match decode_file_pages(payload) {
                Ok(pages) => {
                    tracing::debug!(pages = pages.len(), "data files listed");
                    self.pages = pages;
                    Command::FilePages(self.pages.clone())
                }
                Err(err) => Command::Error(ViewError::from(err).to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_fetches_files() {
        let mut page = DataFilesPage::new();
        let Command::Fetch { request, .. } = page.update(DataFilesMessage::Refresh) else {
            panic!("Expected Fetch command");
        };
        assert_eq!(request, FetchRequest::local("getFiles"));
    }

    #[test]
    fn test_loaded_lists_pages() {
        let mut page = DataFilesPage::new();
        let cmd = page.update(DataFilesMessage::Loaded(serde_json::json!({
            "pages": [{"page": "timedScalars", "files": [{"name": "a.json", "processor": "timedScalars", "size": 12}]}]
        })));
        assert!(matches!(cmd, Command::FilePages(ref p) if p.len() == 1));
        assert_eq!(
            page.pages()[0].files[0].load_link().as_deref(),
            Some("#/timedScalars?loadfile=a.json")
        );
    }

    #[test]
    fn test_render_file_pages() {
        let pages = decode_file_pages(serde_json::json!([{
            "page": "timedScalars",
            "files": [
                {"name": "<b>.json", "processor": "timedScalars", "size": 3},
                {"name": "raw.bin", "size": 9}
            ]
        }]))
        .unwrap();
        let html = render_file_pages(&pages);
        assert!(html.contains("<h4>timedScalars</h4>"));
        assert!(html.contains(r##"<a href="#/timedScalars?loadfile=%3Cb%3E.json">&lt;b&gt;.json</a>"##));
        assert!(html.contains(r#"<td class="file-name">raw.bin</td><td class="file-size">9</td>"#));
        assert_eq!(render_file_pages(&[]), "");
    }

    #[test]
    fn test_malformed_keeps_previous_list() {
        let mut page = DataFilesPage::new();
        page.update(DataFilesMessage::Loaded(serde_json::json!([{"page": "p"}])));
        let cmd = page.update(DataFilesMessage::Loaded(serde_json::json!(42)));
        assert!(matches!(cmd, Command::Error(_)));
        assert_eq!(page.pages().len(), 1);
    }
}
