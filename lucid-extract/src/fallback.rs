use crate::text::html_to_text;
use lucid_common::{ExtractionCandidate, Strategy};

/// Title reported when no strategy produced one.
pub const FALLBACK_TITLE: &str = "Title extraction failed";

/// Every visible line of the page. Never fails; may be empty.
pub fn fallback_text(html: &str) -> ExtractionCandidate {
    ExtractionCandidate::new(FALLBACK_TITLE, html_to_text(html), Strategy::FallbackText)
}
