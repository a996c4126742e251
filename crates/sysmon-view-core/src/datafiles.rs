//! Loadable data files stored on the server.
//!
//! The server groups dumped data files by the page that produced them. A
//! file whose page is known can be reopened in that page's file-loaded mode.

use crate::error::PayloadError;
use crate::query::LOADFILE_PARAM;
use serde::{Deserialize, Serialize};

/// One data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    /// File name
    pub name: String,
    /// Id of the page able to display the file
    #[serde(default)]
    pub processor: Option<String>,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

impl DataFile {
    /// Route that opens this file in its page, e.g. `#/timedScalars?loadfile=f.json`.
    #[must_use]
    pub fn load_link(&self) -> Option<String> {
        self.processor.as_ref().map(|page| {
            format!(
                "#/{page}?{LOADFILE_PARAM}={}",
                urlencoding::encode(&self.name)
            )
        })
    }
}

/// Files produced by one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePage {
    /// Page id
    pub page: String,
    /// Files of that page
    #[serde(default)]
    pub files: Vec<DataFile>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilesRepr {
    Wrapped { pages: Vec<FilePage> },
    Bare(Vec<FilePage>),
}

/// Decode the `getFiles` response, bare or wrapped in `{ pages }`.
pub fn decode_file_pages(value: serde_json::Value) -> Result<Vec<FilePage>, PayloadError> {
    let repr: FilesRepr = serde_json::from_value(value).map_err(|source| PayloadError::Decode {
        what: "data files",
        source,
    })?;
    let mut pages = match repr {
        FilesRepr::Wrapped { pages } | FilesRepr::Bare(pages) => pages,
    };
    pages.sort_by(|a, b| a.page.cmp(&b.page));
    for page in &mut pages {
        page.files.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(pages)
}
