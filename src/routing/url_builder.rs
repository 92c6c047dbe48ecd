//! # Upstream URL Builder
//!
//! Pure functions producing the exact upstream URL for each sub-resource:
//!
//! ```text
//! metadata  {base}/api/{scope}/{repo}
//! listing   {base}/api/{scope}/{repo}/tree/{revision}?{params}
//! raw       {base}/{repo}/resolve/{revision}/{path}
//! space     https://{slug}.{domain}/{path}[?query]
//! ```
//!
//! `{base}` is expected without a trailing slash. Repository ids and paths go
//! through [`encode_path`](crate::routing::encoding::encode_path); the
//! revision is encoded as a single component so a ref such as `refs/pr/1`
//! cannot add path segments.
//!
//! Raw and space URLs carry caller-supplied paths. Those paths may not contain
//! dot segments, and the finished URL must still parse to a path under the
//! repository prefix.

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{RepoScope, RepositoryConfig};
use crate::routing::encoding::{
    encode_file_path, encode_repo_id, encode_segment, has_dot_segment,
};
use url::{form_urlencoded, Url};

/// Query parameter selecting the listing directory
pub const PATH_PARAM: &str = "path";

/// Query parameter selecting a recursive listing
pub const RECURSIVE_PARAM: &str = "recursive";

/// Metadata URL; carries no query parameters
pub fn build_info_url(base: &str, config: &RepositoryConfig) -> String {
    format!(
        "{}/api/{}/{}",
        base,
        config.scope,
        encode_repo_id(&config.repo_id)
    )
}

/// Listing URL with normalized query parameters
///
/// `recursive=1` is appended unless `params` already sets `recursive`, and any
/// leading slashes are stripped from a `path` value. A `path` that is empty
/// after stripping is dropped.
pub fn build_listing_url(
    base: &str,
    config: &RepositoryConfig,
    params: &[(String, String)],
) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut has_recursive = false;

    for (key, value) in params {
        match key.as_str() {
            PATH_PARAM => {
                let path = value.trim_start_matches('/');
                if !path.is_empty() {
                    query.append_pair(key, path);
                }
            }
            RECURSIVE_PARAM => {
                has_recursive = true;
                query.append_pair(key, value);
            }
            _ => {
                query.append_pair(key, value);
            }
        }
    }

    if !has_recursive {
        query.append_pair(RECURSIVE_PARAM, "1");
    }

    format!(
        "{}/api/{}/{}/tree/{}?{}",
        base,
        config.scope,
        encode_repo_id(&config.repo_id),
        encode_segment(&config.revision),
        query.finish()
    )
}

/// Raw content URL; the path must contain at least one non-empty segment
pub fn build_raw_url(base: &str, config: &RepositoryConfig, path: &str) -> GatewayResult<String> {
    let encoded_path = encode_file_path(path)?;
    if encoded_path.is_empty() {
        return Err(GatewayError::invalid_argument("file path is required"));
    }
    if has_dot_segment(&config.repo_id) || has_dot_segment(&config.revision) {
        return Err(GatewayError::config(
            "repository id or revision contains a dot segment",
        ));
    }

    let prefix = format!(
        "{}/{}/resolve/{}/",
        base,
        encode_repo_id(&config.repo_id),
        encode_segment(&config.revision)
    );
    let url = format!("{}{}", prefix, encoded_path);
    ensure_within(&prefix, url)
}

/// Application host URL of a Space
pub fn build_space_url(
    config: &RepositoryConfig,
    domain: &str,
    path: &str,
    query: Option<&str>,
) -> GatewayResult<String> {
    if config.scope != RepoScope::Spaces {
        return Err(GatewayError::invalid_argument(format!(
            "space route requires a space repository, this alias is a {}",
            config.label()
        )));
    }

    let prefix = format!("https://{}.{}/", space_slug(&config.repo_id), domain);
    let mut url = format!("{}{}", prefix, encode_file_path(path)?);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    ensure_within(&prefix, url)
}

/// Check that `url` still parses to the origin and path of `prefix`
fn ensure_within(prefix: &str, url: String) -> GatewayResult<String> {
    let root = Url::parse(prefix)
        .map_err(|e| crate::config_error!("invalid upstream URL '{}': {}", prefix, e))?;
    let escapes = || GatewayError::invalid_argument("path escapes the repository");
    let parsed = Url::parse(&url).map_err(|_| escapes())?;

    if parsed.origin() == root.origin() && parsed.path().starts_with(root.path()) {
        Ok(url)
    } else {
        Err(escapes())
    }
}

/// Host label of a Space: `Owner/My_App` becomes `owner-my-app`
pub fn space_slug(repo_id: &str) -> String {
    repo_id
        .chars()
        .map(|c| match c {
            '/' | '_' | '.' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Listing parameters with the path inferred from trailing route segments
///
/// An explicit `path` query parameter always wins over the inferred one.
pub fn listing_params(
    query: Vec<(String, String)>,
    inferred_path: Option<&str>,
) -> Vec<(String, String)> {
    let mut params = query;
    if let Some(inferred) = inferred_path {
        if !params.iter().any(|(key, _)| key == PATH_PARAM) {
            params.insert(0, (PATH_PARAM.to_string(), inferred.to_string()));
        }
    }
    params
}

/// Append form-encoded pairs to a URL that has no query yet
pub fn append_query(url: String, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return url;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{}?{}", url, query)
}
