use url::Url;

/// Fallback when the URL has nothing usable to name the output after.
const FALLBACK_NAME: &str = "stream";

/// Derive the output base name from a manifest URL.
///
/// Manifests usually live at `.../<title>/index.m3u8`, so the directory holding
/// the manifest names the recording. Encoded spaces become underscores.
///
/// ```
/// use tsgrab_engine::pipeline::derive_base_name;
/// use url::Url;
///
/// let url = Url::parse("https://host/audio/1967.09.22%20NEW%20YORK/index.m3u8").unwrap();
/// assert_eq!(derive_base_name(&url), "1967.09.22_NEW_YORK");
/// ```
pub fn derive_base_name(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    let raw = match segments.as_slice() {
        [.., parent, _last] => *parent,
        [only] => file_stem(only),
        [] => "",
    };

    normalize_base_name(raw)
}

/// Make `raw` safe to use as a file name stem inside the work and output
/// directories. Separators and other path-hostile characters become `_`,
/// leading and trailing dots are dropped and an empty result becomes `stream`.
///
/// ```
/// use tsgrab_engine::pipeline::normalize_base_name;
///
/// assert_eq!(normalize_base_name("../shows/ep 1"), "_shows_ep_1");
/// assert_eq!(normalize_base_name(".."), "stream");
/// ```
pub fn normalize_base_name(raw: &str) -> String {
    let name = sanitize(raw);
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}

fn sanitize(raw: &str) -> String {
    raw.replace("%20", "_")
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
