use url::Url;

/// Parses `input` as an absolute URL that names both a scheme and a host.
pub fn parse_absolute_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = Url::parse(trimmed).ok()?;
    if url.scheme().is_empty() || url.host_str().is_none_or(str::is_empty) {
        return None;
    }
    Some(url)
}
