/// Join URL segments into a single URL.
///
/// A bare `"/"` segment is dropped when the previously kept segment already
/// ends with a slash, so `["a/", "/", "b"]` joins to `a/b` rather than
/// `a//b`. The remaining segments go through [`join_url_parts`].
pub fn join_url<S: AsRef<str>>(parts: &[S]) -> String {
    let mut kept: Vec<&str> = Vec::with_capacity(parts.len());
    for (idx, part) in parts.iter().enumerate() {
        let part = part.as_ref();
        let redundant_root =
            idx > 0 && part == "/" && kept.last().is_some_and(|prev| prev.ends_with('/'));
        if !redundant_root {
            kept.push(part);
        }
    }
    join_url_parts(&kept)
}

/// Concatenate URL parts with exactly one `/` between them.
///
/// Behaves like the `url-join` package: a leading bare protocol part is
/// folded into the next part, protocol slashes are normalized, and query
/// strings spread over several parts are merged into one. Parts that are
/// empty or made only of slashes add no segment, so the result never has a
/// doubled separator; a trailing slash on the last part is kept as one `/`.
pub fn join_url_parts<S: AsRef<str>>(parts: &[S]) -> String {
    let mut parts: Vec<String> = parts.iter().map(|p| p.as_ref().to_string()).collect();
    if parts.is_empty() {
        return String::new();
    }

    if parts.len() > 1 && is_bare_protocol(&parts[0]) {
        let protocol = parts.remove(0);
        parts[0] = protocol + &parts[0];
    }
    parts[0] = normalize_protocol(&parts[0]);

    let last = parts.len() - 1;
    let mut components: Vec<&str> = Vec::with_capacity(parts.len());
    let mut leading_root = false;
    let mut trailing_slash = false;
    for (idx, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if idx == last {
            trailing_slash = part.ends_with('/');
        }

        let mut component = part.as_str();
        if idx > 0 {
            component = component.trim_start_matches('/');
        }

        // A part made only of slashes adds no segment of its own
        let trimmed = component.trim_end_matches('/');
        if trimmed.is_empty() {
            leading_root |= idx == 0;
            continue;
        }
        components.push(trimmed);
    }

    let mut joined = components.join("/");
    if leading_root {
        joined.insert(0, '/');
    }
    if trailing_slash && !joined.ends_with('/') {
        joined.push('/');
    }

    let joined = strip_slash_before_query(&joined);
    merge_query_marks(&joined)
}

/// `scheme:` optionally followed by slashes and nothing else.
fn is_bare_protocol(part: &str) -> bool {
    match part.split_once(':') {
        Some((scheme, rest)) => {
            !scheme.is_empty() && !scheme.contains('/') && rest.chars().all(|c| c == '/')
        }
        None => false,
    }
}

fn normalize_protocol(first: &str) -> String {
    let Some((scheme, rest)) = first.split_once(':') else {
        return first.to_string();
    };
    if scheme.is_empty() || scheme.contains('/') {
        return first.to_string();
    }

    let slashes = if first.starts_with("file:///") { "///" } else { "//" };
    format!("{scheme}:{slashes}{}", rest.trim_start_matches('/'))
}

/// Drops a `/` that directly precedes `?`, `&`, or a `#` fragment (except
/// `#!` hash-bang routes).
fn strip_slash_before_query(url: &str) -> String {
    let chars: Vec<char> = url.chars().collect();
    let mut output = String::with_capacity(url.len());
    let mut idx = 0;

    while idx < chars.len() {
        let current = chars[idx];
        if current == '/' {
            match (chars.get(idx + 1), chars.get(idx + 2)) {
                (Some('?' | '&'), _) => {
                    output.push(chars[idx + 1]);
                    idx += 2;
                    continue;
                }
                (Some('#'), Some(next)) if *next != '!' => {
                    output.push('#');
                    output.push(*next);
                    idx += 3;
                    continue;
                }
                _ => {}
            }
        }
        output.push(current);
        idx += 1;
    }

    output
}

/// Keeps the first `?` and turns every later one into `&`.
fn merge_query_marks(url: &str) -> String {
    let mut pieces = url.split('?');
    let mut output = pieces.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = pieces.collect();
    if !rest.is_empty() {
        output.push('?');
        output.push_str(&rest.join("&"));
    }
    output
}
