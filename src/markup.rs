//! Tolerant HTML/XML tag scanning
//!
//! String-level markup primitives shared by signposting discovery (HTML
//! head links, meta tags, embedded JSON-LD scripts) and the re3data XML
//! parser. Tag names match case-insensitively and with or without a
//! namespace prefix, so `<description>` and `<r3d:description>` both
//! answer to the local name "description". Malformed markup degrades to
//! fewer matches, never to a panic.

/// Lower-case ASCII characters only, leaving multi-byte characters alone
/// so byte positions stay valid on the original string.
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Case-insensitive substring search returning a byte offset.
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    to_lower(haystack).find(&to_lower(needle))
}

/// A single element occurrence: raw attribute segment plus inner text.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub attrs: String,
    pub inner: String,
}

/// Find every occurrence of an element with the given local name,
/// anywhere in the document. Void and self-closing elements yield an
/// empty inner text; nested same-name elements are not supported (the
/// first close tag wins).
pub fn elements(doc: &str, local_name: &str) -> Vec<Element> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(open_rel) = doc[pos..].find('<') {
        let name_start = pos + open_rel + 1;
        match doc.as_bytes().get(name_start) {
            Some(b'/') | Some(b'!') | Some(b'?') | None => {
                pos = name_start;
                continue;
            }
            _ => {}
        }

        let rest = &doc[name_start..];
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        let local = name.rsplit(':').next().unwrap_or(name);
        if !local.eq_ignore_ascii_case(local_name) {
            pos = name_start;
            continue;
        }

        let Some(gt_rel) = rest.find('>') else { break };
        if gt_rel < name_len {
            pos = name_start;
            continue;
        }
        let open_end = name_start + gt_rel + 1;
        let attr_seg = &rest[name_len..gt_rel];
        let self_closing = attr_seg.trim_end().ends_with('/');
        let attrs = attr_seg.trim_matches('/').trim().to_string();

        if self_closing {
            found.push(Element {
                attrs,
                inner: String::new(),
            });
            pos = open_end;
            continue;
        }

        let close_tag = format!("</{}>", name);
        match find_ci(&doc[open_end..], &close_tag) {
            Some(close_rel) => {
                found.push(Element {
                    attrs,
                    inner: doc[open_end..open_end + close_rel].to_string(),
                });
                pos = open_end + close_rel + close_tag.len();
            }
            None => {
                // void element such as <link> or <meta>
                found.push(Element {
                    attrs,
                    inner: String::new(),
                });
                pos = open_end;
            }
        }
    }

    found
}

/// Trimmed, entity-decoded text content of every matching element,
/// empty texts dropped.
pub fn element_texts(doc: &str, local_name: &str) -> Vec<String> {
    elements(doc, local_name)
        .into_iter()
        .filter_map(|e| {
            let text = unescape(e.inner.trim());
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect()
}

/// Text content of the first matching non-empty element.
pub fn first_element_text(doc: &str, local_name: &str) -> Option<String> {
    element_texts(doc, local_name).into_iter().next()
}

/// Extract a named attribute from a raw attribute segment. Names match
/// case-insensitively; double-quoted, single-quoted, and bare values are
/// accepted; entity references in the value are decoded.
pub fn attr(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }

        let key_len = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = &rest[..key_len];
        rest = rest[key_len..].trim_start();

        if !rest.starts_with('=') {
            // bare attribute with no value
            if key.eq_ignore_ascii_case(name) {
                return Some(String::new());
            }
            continue;
        }
        rest = rest[1..].trim_start();

        let (value, consumed) = if let Some(quoted) = rest.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], end + 2),
                None => (quoted, rest.len()),
            }
        } else if let Some(quoted) = rest.strip_prefix('\'') {
            match quoted.find('\'') {
                Some(end) => (&quoted[..end], end + 2),
                None => (quoted, rest.len()),
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            (&rest[..end], end)
        };

        if key.eq_ignore_ascii_case(name) {
            return Some(unescape(value));
        }
        rest = &rest[consumed..];
    }
}

/// Inner markup of the document's `<head>` element.
pub fn head_slice(html: &str) -> Option<&str> {
    let lc = to_lower(html);
    let start = lc.find("<head")?;
    let open_end = html[start..].find('>')? + start + 1;
    let close = lc[open_end..].find("</head")? + open_end;
    Some(&html[open_end..close])
}

/// Decode the predefined XML/HTML entities and numeric character
/// references; unknown entities pass through untouched.
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(end) if end <= 8 => {
                let entity = &tail[1..end];
                match entity {
                    "amp" => out.push('&'),
                    "lt" => out.push('<'),
                    "gt" => out.push('>'),
                    "quot" => out.push('"'),
                    "apos" => out.push('\''),
                    _ if entity.starts_with('#') => {
                        let code = if let Some(hex) = entity[1..]
                            .strip_prefix('x')
                            .or_else(|| entity[1..].strip_prefix('X'))
                        {
                            u32::from_str_radix(hex, 16).ok()
                        } else {
                            entity[1..].parse::<u32>().ok()
                        };
                        match code.and_then(char::from_u32) {
                            Some(c) => out.push(c),
                            None => out.push_str(&tail[..end + 1]),
                        }
                    }
                    _ => out.push_str(&tail[..end + 1]),
                }
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
