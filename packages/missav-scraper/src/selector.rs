//! Best-match selection among cached detail pages.

use tracing::debug;

use crate::error::ParseError;
use crate::extract::{clean_identifier, Document};
use crate::identifier::comparison_form;

/// A cached page, or the reason it could not be parsed.
pub struct Candidate {
    pub name: String,
    pub document: Result<Document, ParseError>,
}

impl Candidate {
    pub fn parsed(name: impl Into<String>, document: Document) -> Self {
        Self {
            name: name.into(),
            document: Ok(document),
        }
    }

    pub fn unparsable(name: impl Into<String>, error: ParseError) -> Self {
        Self {
            name: name.into(),
            document: Err(error),
        }
    }
}

/// The chosen page and whether its identifier matched the target.
pub struct Selection {
    pub name: String,
    pub document: Document,
    pub exact: bool,
}

/// Comparison key of the identifier printed on a cached page.
pub fn candidate_key(doc: &Document) -> String {
    comparison_form(&clean_identifier(&doc.raw_identifier()))
}

/// Pick the page to extract from.
///
/// The first candidate whose identifier equals `target_key` wins and later
/// candidates are not examined. Without an exact match the first parsable
/// candidate is returned even though it is for a different identifier: a
/// mismatched page is preferred over no data. Unparsable candidates are
/// skipped.
pub fn select_best(
    candidates: impl IntoIterator<Item = Candidate>,
    target_key: &str,
) -> Option<Selection> {
    let mut fallback: Option<Selection> = None;

    for candidate in candidates {
        let document = match candidate.document {
            Ok(document) => document,
            Err(e) => {
                debug!(candidate = %candidate.name, error = %e, "Skipping unparsable snapshot");
                continue;
            }
        };

        let key = candidate_key(&document);
        if key == target_key {
            debug!(candidate = %candidate.name, key = %key, "Exact snapshot match");
            return Some(Selection {
                name: candidate.name,
                document,
                exact: true,
            });
        }

        debug!(candidate = %candidate.name, key = %key, target = %target_key, "Snapshot identifier differs");
        if fallback.is_none() {
            fallback = Some(Selection {
                name: candidate.name,
                document,
                exact: false,
            });
        }
    }

    fallback
}
