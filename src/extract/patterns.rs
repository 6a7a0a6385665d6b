use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

pub static M3U8_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https://[^'"\s]+\.m3u8"#).unwrap());

pub static HTTPS_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https://[^'"\s]+"#).unwrap());

pub static STRING_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'((?:[^'\\\n]|\\.)*)'|"((?:[^"\\\n]|\\.)*)""#).unwrap()
});

pub static FUNCTION_BODY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)function\s*\([^)]*\)\s*\{(.*)\}").unwrap());

pub static DECODE_CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:atob|base64_decode|Base64\.decode)\(\s*["']([A-Za-z0-9+/=_-]+)["']\s*\)"#)
        .unwrap()
});

/// Strict `https://...m3u8` matches
pub fn m3u8_urls(text: &str) -> Vec<String> {
    dedup(M3U8_URL_REGEX.find_iter(text).map(|m| m.as_str().to_string()))
}

/// Any `https://` prefixed run of non-quote, non-space characters
pub fn https_urls(text: &str) -> Vec<String> {
    dedup(HTTPS_URL_REGEX.find_iter(text).map(|m| m.as_str().to_string()))
}

/// Contents of quoted string literals mentioning both `http` and `.m3u8`
///
/// Escaped slashes (`https:\/\/`) are unescaped.
pub fn m3u8_literals(text: &str) -> Vec<String> {
    dedup(
        STRING_LITERAL_REGEX
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().replace(r"\/", "/"))
            .filter(|literal| literal.contains("http") && literal.contains(".m3u8")),
    )
}

/// Strict m3u8 URLs, falling back to any https URL and then to m3u8 string literals
pub fn layered_urls(text: &str) -> Vec<String> {
    let urls = m3u8_urls(text);
    if !urls.is_empty() {
        return urls;
    }

    let urls = https_urls(text);
    if !urls.is_empty() {
        return urls;
    }

    m3u8_literals(text)
}

/// Body of the outermost `function(...) { ... }`, spanning to the last closing brace
pub fn function_body(text: &str) -> Option<&str> {
    FUNCTION_BODY_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Arguments of `atob('...')` style decode calls
pub fn decode_call_payloads(text: &str) -> Vec<&str> {
    DECODE_CALL_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
