//! Report tag and release-name derivation. Tag names are the dedup key of the
//! report store, so everything here is a pure function of its inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::ProductConfig;
use crate::types::ReleaseNames;

const FALLBACK_PREFIX: &str = "release";
const FALLBACK_DISPLAY: &str = "Release";
const VERSION: &str = "v0.0.0";

/// Names for a per-repository report: `<prefix>-v0.0.0-<sha>`.
pub fn release_names(
    repo_name: &str,
    sha: &str,
    products: &BTreeMap<String, ProductConfig>,
) -> ReleaseNames {
    let (prefix, display) = products.get(repo_name).map_or(
        (FALLBACK_PREFIX, FALLBACK_DISPLAY),
        |p| (p.prefix.as_str(), p.display_name.as_str()),
    );
    ReleaseNames {
        tag_name: format!("{prefix}-{VERSION}-{sha}"),
        release_name: format!("{display} {VERSION}-{sha}"),
    }
}

/// Names for a multi-repository report, keyed by run time instead of a sha.
pub fn aggregate_names(owner: &str, now: DateTime<Utc>) -> ReleaseNames {
    ReleaseNames {
        tag_name: format!("{owner}-aggregated-{}", now.format("%Y%m%d%H%M%S")),
        release_name: format!(
            "Aggregated Release - {owner} - {}",
            now.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    }
}

/// External release page for a known product, with `{tag}` filled in.
pub fn release_link(
    repo_name: &str,
    tag_name: &str,
    products: &BTreeMap<String, ProductConfig>,
) -> Option<String> {
    products
        .get(repo_name)
        .and_then(|p| p.release_link.as_deref())
        .map(|template| template.replace("{tag}", tag_name))
}
