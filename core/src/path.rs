/// Encode a filesystem-style path for use in a WebDAV URL.
///
/// Every `/` and every backslash pair (`\\`) is kept literally; the text
/// between them is encoded with URI-component rules. A lone backslash is
/// not a separator and is encoded as `%5C`.
pub fn encode_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut output = String::with_capacity(path.len());
    let mut segment_start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let separator_len = match bytes[idx] {
            b'/' => 1,
            b'\\' if bytes.get(idx + 1) == Some(&b'\\') => 2,
            _ => 0,
        };

        if separator_len == 0 {
            idx += 1;
            continue;
        }

        output.push_str(&encode_uri_component(&path[segment_start..idx]));
        output.push_str(&path[idx..idx + separator_len]);
        idx += separator_len;
        segment_start = idx;
    }

    output.push_str(&encode_uri_component(&path[segment_start..]));
    output
}

/// Percent-encode a single path segment.
///
/// Leaves `A-Z a-z 0-9 - _ . ! ~ * ' ( )` untouched, matching the
/// URI-component set used by browsers and Node.
pub fn encode_uri_component(segment: &str) -> String {
    let encoded = urlencoding::encode(segment);
    if !encoded.contains('%') {
        return encoded.into_owned();
    }

    // urlencoding also escapes the sub-delimiters `!'()*`; a literal `%` is
    // always emitted as `%25`, so these sequences can only come from them.
    encoded
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}
