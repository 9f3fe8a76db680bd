//! URL helpers for ArcGIS REST services

use crate::tiles::params::ParameterSet;
use url::form_urlencoded;

const MAP_SERVER: &str = "MapServer";
const IMAGE_SERVER: &str = "ImageServer";

/// Points a service root at its export operation.
///
/// `.../MapServer` becomes `.../MapServer/export` and `.../ImageServer`
/// becomes `.../ImageServer/exportImage`, with or without a trailing slash.
/// Only the path is inspected, an existing query string is carried over.
/// Anything else is returned unchanged.
pub fn export_endpoint(url: &str) -> String {
    let (path, query) = split_query(url);
    let trimmed = path.strip_suffix('/').unwrap_or(path);

    let mut rewritten = if trimmed.ends_with(MAP_SERVER) {
        format!("{}/export", trimmed)
    } else if trimmed.ends_with(IMAGE_SERVER) {
        format!("{}/exportImage", trimmed)
    } else {
        path.to_string()
    };

    if let Some(query) = query {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    rewritten
}

/// Appends `params` to `url` as an encoded query string.
///
/// If `url` already has a query the parameters are merged into it: pairs
/// whose key matches one of `params` (ignoring ASCII case, as the REST API
/// does) are dropped, the rest are kept verbatim.
///
/// Values are `application/x-www-form-urlencoded`, so a space is written as
/// `+` rather than `%20`. The REST API decodes both.
pub fn append_params(url: &str, params: &ParameterSet) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let (base, existing) = split_query(url);
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter() {
        serializer.append_pair(key, &value.to_string());
    }
    let appended = serializer.finish();

    let kept: Vec<&str> = existing
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = form_urlencoded::parse(pair.as_bytes())
                .next()
                .map(|(key, _)| key.into_owned())
                .unwrap_or_default();
            !params.iter().any(|(k, _)| k.eq_ignore_ascii_case(&key))
        })
        .collect();

    if kept.is_empty() {
        format!("{}?{}", base, appended)
    } else {
        format!("{}?{}&{}", base, kept.join("&"), appended)
    }
}

fn split_query(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}
