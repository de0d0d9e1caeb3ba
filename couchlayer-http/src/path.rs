//! URL construction for database resources.
//!
//! Path segments are percent-encoded one by one, so a database named `a/b`
//! becomes the single segment `a%2Fb`. Query pairs are form-encoded.

use url::Url;

use couchlayer_core::error::{DatabaseError, DatabaseResult};

/// Returns `base` with `path` appended as escaped segments and `query`
/// appended as form-encoded pairs.
///
/// # Errors
///
/// Returns [`DatabaseError::Initialization`] if `base` cannot carry a path
/// (e.g. `mailto:` URLs).
pub(crate) fn build_url(base: &Url, path: &[String], query: &[(String, String)]) -> DatabaseResult<Url> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|()| DatabaseError::Initialization(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(path);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}
