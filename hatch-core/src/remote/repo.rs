//! Repository identifiers derived from hosting URLs

use std::sync::LazyLock;

use regex::Regex;

static GITHUB_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([^?#\s]+)").expect("static regex is valid")
});

/// Derive `owner/repo` from a repository URL.
///
/// Accepts `https://github.com/owner/repo`, `www.` hosts, a trailing `.git`,
/// and a trailing slash. The host must start the URL, and any query or
/// fragment is dropped. Returns `None` when the URL has no path under the
/// host or a path segment is empty, `.` or `..`.
pub fn repo_identifier(url: &str) -> Option<String> {
    let captures = GITHUB_REPO.captures(url)?;
    let rest = captures.get(1)?.as_str().trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let valid = !rest.is_empty()
        && rest
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    valid.then(|| rest.to_string())
}

/// Repository URL without query, fragment, trailing slash or `.git` suffix
pub fn repository_base(url: &str) -> &str {
    let path_end = url.find(['?', '#']).unwrap_or(url.len());
    let trimmed = url[..path_end].trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed)
}
