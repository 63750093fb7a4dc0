use super::*;

#[test]
fn normalize_url_prepends_https_to_bare_hosts() {
    let url = normalize_url("acme.example/services").unwrap();
    assert_eq!(url.as_str(), "https://acme.example/services");
}

#[test]
fn normalize_url_keeps_explicit_http() {
    let url = normalize_url("  http://acme.example ").unwrap();
    assert_eq!(url.as_str(), "http://acme.example/");
}

#[test]
fn normalize_url_rejects_other_schemes() {
    let err = normalize_url("ftp://acme.example").unwrap_err();
    assert!(
        matches!(err, FetchError::InvalidUrl { ref reason, .. } if reason.contains("ftp")),
        "got: {err:?}"
    );
}

#[test]
fn normalize_url_rejects_empty_input() {
    assert!(matches!(
        normalize_url("   "),
        Err(FetchError::InvalidUrl { .. })
    ));
}

#[test]
fn site_origin_drops_path() {
    let url = normalize_url("https://acme.example:8443/a/b?c=d").unwrap();
    assert_eq!(site_origin(&url), "https://acme.example:8443");
}

#[test]
fn collect_headers_lowercases_and_joins_duplicates() {
    let mut map = header::HeaderMap::new();
    map.append("X-Frame-Options", "DENY".parse().unwrap());
    map.append("Set-Cookie", "a=1".parse().unwrap());
    map.append("Set-Cookie", "b=2".parse().unwrap());
    let collected = collect_headers(&map);
    assert_eq!(collected.get("x-frame-options").map(String::as_str), Some("DENY"));
    assert_eq!(collected.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
}

#[test]
fn probe_response_success_range() {
    let ok = ProbeResponse {
        status: 204,
        final_url: String::new(),
        body: String::new(),
    };
    let missing = ProbeResponse {
        status: 404,
        ..ok.clone()
    };
    assert!(ok.is_success());
    assert!(!missing.is_success());
}
