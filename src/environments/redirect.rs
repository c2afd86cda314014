//! Same-host check for user-supplied redirect targets

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme regex"));

/// True if `target` is safe to redirect to from a page served on `host`.
///
/// Relative paths are safe. Absolute and protocol-relative URLs are safe only
/// when they use http(s) and point at `host` (including the port, if any).
pub fn is_safe_url(target: &str, host: &str) -> bool {
    let target = target.trim();
    if target.is_empty() || target.chars().any(char::is_control) {
        return false;
    }

    // Browsers treat backslashes as slashes, so "\\evil.com" is "//evil.com"
    let target = target.replace('\\', "/");

    if let Some(rest) = target.strip_prefix("//") {
        return points_at_host(&format!("http://{}", rest), host);
    }

    if SCHEME_RE.is_match(&target) {
        return points_at_host(&target, host);
    }

    true
}

fn points_at_host(absolute: &str, host: &str) -> bool {
    let Ok(url) = Url::parse(absolute) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let Some(url_host) = url.host_str() else {
        return false;
    };
    let authority = match url.port() {
        Some(port) => format!("{}:{}", url_host, port),
        None => url_host.to_string(),
    };
    authority.eq_ignore_ascii_case(host)
}

/// `target` if it is safe for `host`, else `default`
pub fn safe_redirect(target: Option<&str>, host: &str, default: &str) -> String {
    match target {
        Some(target) if is_safe_url(target, host) => target.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_are_safe() {
        assert!(is_safe_url("/catalog", "dash.local"));
        assert!(is_safe_url("catalog/index?page=2", "dash.local"));
    }

    #[test]
    fn test_empty_is_unsafe() {
        assert!(!is_safe_url("", "dash.local"));
        assert!(!is_safe_url("   ", "dash.local"));
    }

    #[test]
    fn test_same_host_absolute_is_safe() {
        assert!(is_safe_url("http://dash.local/catalog", "dash.local"));
        assert!(is_safe_url("https://DASH.local/catalog", "dash.local"));
        assert!(is_safe_url("http://dash.local:8080/x", "dash.local:8080"));
    }

    #[test]
    fn test_other_hosts_are_unsafe() {
        assert!(!is_safe_url("http://evil.com/", "dash.local"));
        assert!(!is_safe_url("//evil.com/path", "dash.local"));
        assert!(!is_safe_url("\\\\evil.com", "dash.local"));
        assert!(!is_safe_url("http://dash.local:9999/", "dash.local"));
        assert!(!is_safe_url("http://dash.local@evil.com/", "dash.local"));
    }

    #[test]
    fn test_non_http_schemes_are_unsafe() {
        assert!(!is_safe_url("javascript:alert(1)", "dash.local"));
        assert!(!is_safe_url("ftp://dash.local/file", "dash.local"));
    }

    #[test]
    fn test_safe_redirect_falls_back() {
        assert_eq!(safe_redirect(Some("/envs"), "dash.local", "/"), "/envs");
        assert_eq!(
            safe_redirect(Some("https://evil.com"), "dash.local", "/"),
            "/"
        );
        assert_eq!(safe_redirect(None, "dash.local", "/home"), "/home");
    }
}
