//! Parsing of RFC 7239 `Forwarded` headers from a trusted reverse proxy.
//!
//! A proxy proves itself by adding `secret=<shared secret>` (or
//! `by=<shared secret>`) to the element it appends. Elements are scanned from
//! the right; the first one carrying the secret is used and everything else
//! in the header is ignored, since it may have been forged by the client.
use std::net::Ipv6Addr;

use percent_encoding::percent_decode_str;

/// Normalized parameters of the trusted `Forwarded` element.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ForwardedInfo {
    pub for_addr: Option<String>,
    pub by: Option<String>,
    pub proto: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
}

/// Find the rightmost element carrying `secret` across all header values.
/// Returns `None` when the secret is empty or no element matches.
pub fn parse_forwarded<'a, I>(values: I, secret: &str) -> Option<ForwardedInfo>
where
    I: IntoIterator<Item = &'a str>,
{
    if secret.is_empty() {
        return None;
    }

    let header = values.into_iter().collect::<Vec<_>>().join(",");
    if !header.contains(secret) {
        return None;
    }

    split_unquoted(&header, ',')
        .into_iter()
        .rev()
        .map(parse_element)
        .find(|pairs| {
            pairs
                .iter()
                .any(|(key, value)| (key == "secret" || key == "by") && value == secret)
        })
        .map(normalize)
}

/// Split on `sep`, ignoring separators inside quoted strings.
fn split_unquoted(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&input[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// `key=value` pairs of one element, keys lowercased and values unquoted.
fn parse_element(element: &str) -> Vec<(String, String)> {
    split_unquoted(element, ';')
        .into_iter()
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return None;
            }
            Some((key, unquote(value.trim())))
        })
        .collect()
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn normalize(pairs: Vec<(String, String)>) -> ForwardedInfo {
    let mut info = ForwardedInfo::default();

    for (key, value) in pairs {
        match key.as_str() {
            "for" => info.for_addr = normalize_address(&value),
            "by" => info.by = normalize_address(&value),
            "proto" => info.proto = Some(value.to_ascii_lowercase()),
            "host" => info.host = Some(value.to_ascii_lowercase()),
            "port" => info.port = value.parse().ok(),
            "path" => {
                info.path = Some(percent_decode_str(&value).decode_utf8_lossy().into_owned())
            }
            _ => {}
        }
    }

    info
}

/// Bracket bare IPv6 addresses and lowercase the rest. Obfuscated
/// identifiers (`_foo`) keep their case and `unknown` is dropped.
fn normalize_address(addr: &str) -> Option<String> {
    if addr.is_empty() || addr.eq_ignore_ascii_case("unknown") {
        return None;
    }
    if addr.parse::<Ipv6Addr>().is_ok() {
        return Some(format!("[{}]", addr.to_ascii_lowercase()));
    }
    if addr.starts_with('_') {
        return Some(addr.to_string());
    }
    Some(addr.to_ascii_lowercase())
}
