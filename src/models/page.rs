use serde_json::Value;
use serde_this_or_that::as_u64;

#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    pub total_pages: u64,
    pub links: PageLinks,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLinks {
    pub next_api_params: String,
}

const DEFAULT_TOTAL_PAGES: u64 = 1;

impl Default for PageMetadata {
    fn default() -> Self {
        PageMetadata {
            total_pages: DEFAULT_TOTAL_PAGES,
            links: PageLinks::default(),
        }
    }
}

impl PageMetadata {
    /// Reads the `metadata` object of a page payload. Each field falls back
    /// on its own: an unreadable `totalPages` means one page, an unreadable
    /// `links.nextApiParams` means no next link.
    pub fn from_payload(payload: &Value) -> PageMetadata {
        let metadata = payload.get("metadata");

        let total_pages = metadata
            .and_then(|m| m.get("totalPages"))
            .and_then(|total| as_u64(total).ok())
            .unwrap_or(DEFAULT_TOTAL_PAGES);

        let next_api_params = metadata
            .and_then(|m| m.get("links"))
            .and_then(|links| links.get("nextApiParams"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        PageMetadata {
            total_pages,
            links: PageLinks { next_api_params },
        }
    }
}
