//! Plain-text extraction from charger status pages.
//!
//! Status pages are simple HTML documents whose visible text consists of
//! `Key: value` lines. [`visible_text`] flattens the `<body>` into one text
//! node per line and [`parse_key_values`] turns those lines into a map.

use std::collections::BTreeMap;

/// Elements whose contents never count as visible text.
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "head"];

/// Extracted `key -> value` pairs of one status page.
pub type StatusData = BTreeMap<String, String>;

/// Visible text of the document body: every text node trimmed, empty nodes
/// dropped, joined with `\n`. Falls back to the whole document when there is
/// no `<body>` element.
pub fn visible_text(html: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lc = html.to_ascii_lowercase();
    let (start, end) = body_bounds(html, &lc);
    let body = &html[start..end];
    let lower = &lc[start..end];

    let mut nodes = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = body[pos..].find('<') {
        let lt = pos + offset;
        if !opens_markup(body.as_bytes().get(lt + 1).copied()) {
            // A bare `<` such as in `Load: < 50%` is text
            pos = lt + 1;
            continue;
        }

        push_text_node(&mut nodes, &body[text_start..lt]);

        if lower[lt..].starts_with("<!--") {
            pos = lower[lt + 4..]
                .find("-->")
                .map(|e| lt + 4 + e + 3)
                .unwrap_or(body.len());
        } else {
            let Some(close) = tag_end(lower, lt) else {
                // Unterminated tag, nothing visible follows
                text_start = body.len();
                break;
            };

            let tag = &lower[lt + 1..close];
            pos = close + 1;

            let name = tag_name(tag);
            if !tag.starts_with('/') && HIDDEN_ELEMENTS.contains(&name) {
                pos = skip_element(lower, pos, name);
            }
        }
        text_start = pos;
    }
    push_text_node(&mut nodes, &body[text_start..]);

    nodes.join("\n")
}

/// Parse `key: value` lines. Only the first `:` splits, both sides are
/// trimmed, lines without a colon are dropped and a repeated key keeps the
/// value of its last line.
pub fn parse_key_values(text: &str) -> StatusData {
    let mut data = StatusData::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            data.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    data
}

/// [`visible_text`] followed by [`parse_key_values`].
pub fn extract_status(html: &str) -> StatusData {
    parse_key_values(&visible_text(html))
}

fn body_bounds(html: &str, lc: &str) -> (usize, usize) {
    let Some(open) = lc.find("<body") else {
        return (0, html.len());
    };
    let Some(start) = tag_end(lc, open).map(|e| e + 1) else {
        return (html.len(), html.len());
    };
    let end = lc[start..]
        .find("</body")
        .map(|e| start + e)
        .unwrap_or(html.len());
    (start, end)
}

/// Only `<` followed by a letter, `/`, `!` or `?` starts markup.
fn opens_markup(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

/// Index of the `>` closing the tag that opens at `s[open] == '<'`. Quotes
/// only delimit an attribute value when they follow `=`, so a stray
/// apostrophe in an unquoted value does not swallow the rest of the page.
fn tag_end(s: &str, open: usize) -> Option<usize> {
    let b = s.as_bytes();
    let mut i = open + 1;
    while i < b.len() {
        match b[i] {
            b'>' => return Some(i),
            b'=' => {
                i += 1;
                while i < b.len() && b[i].is_ascii_whitespace() {
                    i += 1;
                }
                if let Some(&quote) = b.get(i).filter(|&&q| q == b'"' || q == b'\'') {
                    let close = s[i + 1..].find(quote as char)?;
                    i += close + 2;
                }
            }
            _ => i += 1,
        }
    }
    None
}

fn tag_name(tag: &str) -> &str {
    let tag = tag.trim_start_matches('/');
    let len = tag
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(tag.len());
    &tag[..len]
}

/// Position just past the closing tag of `name`, searching from `from`.
fn skip_element(lower: &str, from: usize, name: &str) -> usize {
    let close = format!("</{}", name);
    lower[from..]
        .find(&close)
        .and_then(|at| tag_end(lower, from + at))
        .map(|end| end + 1)
        .unwrap_or(lower.len())
}

fn push_text_node(nodes: &mut Vec<String>, raw: &str) {
    let text = decode_entities(raw);
    let text = text.trim();
    if !text.is_empty() {
        nodes.push(text.to_string());
    }
}

/// Longest entity name looked at, excluding `&` and `;`.
const MAX_ENTITY_LEN: usize = 10;

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .bytes()
            .skip(1)
            .take(MAX_ENTITY_LEN + 1)
            .position(|b| b == b';')
            .and_then(|semi| decode_entity(&rest[1..semi + 1]).map(|c| (c, semi + 2)));

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    let named = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "deg" => '\u{b0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "middot" => '\u{b7}',
        "micro" => '\u{b5}',
        "times" => '\u{d7}',
        "plusmn" => '\u{b1}',
        "euro" => '\u{20ac}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            // NUL, surrogates and out-of-range points become the replacement character
            return Some(
                char::from_u32(code)
                    .filter(|&c| c != '\0')
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            );
        }
    };
    Some(named)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_key_values_last_duplicate_wins() {
        let data = parse_key_values("Power: 7kW\nStatus: Idle\nNotAField\nPower: 11kW");

        let expected: StatusData = [("Power", "11kW"), ("Status", "Idle")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_parse_key_values_splits_on_first_colon_only() {
        let data = parse_key_values("UpdatedAt: 2024-05-01 12:30:45\n  Label :  a:b:c  ");

        assert_eq!(data["UpdatedAt"], "2024-05-01 12:30:45");
        assert_eq!(data["Label"], "a:b:c");
    }

    #[test]
    fn test_parse_key_values_empty_input() {
        assert!(parse_key_values("").is_empty());
        assert!(parse_key_values("no colons here\nnor here").is_empty());
    }

    #[test]
    fn test_visible_text_uses_body_only() {
        let html = r#"<html><head><title>Title: ignored</title></head>
            <body><h1>Charger</h1><p>Status: Charging</p><p>Power: 7.2 kW</p></body></html>"#;

        assert_eq!(visible_text(html), "Charger\nStatus: Charging\nPower: 7.2 kW");
    }

    #[test]
    fn test_visible_text_tags_are_node_boundaries() {
        let html = "<body><div><b>Connector</b>: 1</div></body>";

        // "Connector" and ": 1" are separate text nodes
        assert_eq!(visible_text(html), "Connector\n: 1");
    }

    #[test]
    fn test_visible_text_skips_scripts_styles_and_comments() {
        let html = r#"<BODY>
            <script type="text/javascript">var x = "Key: nope";</script>
            <style>p { color: red; }</style>
            <!-- Hidden: yes -->
            <p class="a>b">Status: Idle</p>
        </BODY>"#;

        assert_eq!(visible_text(html), "Status: Idle");
    }

    #[test]
    fn test_visible_text_without_body_element() {
        let html = "<head><style>x{}</style></head>Status: Faulted<br>Error: &lt;none&gt;";

        assert_eq!(visible_text(html), "Status: Faulted\nError: <none>");
    }

    #[test]
    fn test_visible_text_bare_less_than_is_text() {
        let html = "<body><p>Load: < 50%</p><p>Temp <3 hot</p><p>Status: Idle</p></body>";

        assert_eq!(visible_text(html), "Load: < 50%\nTemp <3 hot\nStatus: Idle");

        let data = extract_status(html);
        assert_eq!(data["Load"], "< 50%");
        assert_eq!(data["Status"], "Idle");
    }

    #[test]
    fn test_visible_text_apostrophe_in_unquoted_attribute() {
        let html = "<body><p>Note: don't</p><img alt=it's><p>Status: Idle</p></body>";

        assert_eq!(visible_text(html), "Note: don't\nStatus: Idle");
    }

    #[test]
    fn test_tag_end_quotes_only_after_equals() {
        assert_eq!(tag_end(r#"<a title="x>y" b='>'>"#, 0), Some(20));
        assert_eq!(tag_end("<img alt = 'a>b'>", 0), Some(16));
        assert_eq!(tag_end("<p it's>", 0), Some(7));
        assert_eq!(tag_end("<a href=\"never closed>", 0), None);
    }

    #[test]
    fn test_visible_text_long_page_with_many_scripts() {
        let mut html = String::from("<body>");
        for i in 0..2_000 {
            html.push_str(&format!("<script>var a{} = 1;</script><p>Key{}: &amp;{}</p>", i, i, i));
        }
        html.push_str("</body>");

        let data = extract_status(&html);
        assert_eq!(data.len(), 2_000);
        assert_eq!(data["Key1999"], "&1999");
    }

    #[test]
    fn test_decode_common_named_entities() {
        assert_eq!(decode_entities("Temp: 21&deg;C"), "Temp: 21\u{b0}C");
        assert_eq!(decode_entities("10&ndash;20 &mdash; wait&hellip;"), "10\u{2013}20 \u{2014} wait\u{2026}");
    }

    #[test]
    fn test_decode_invalid_code_points() {
        assert_eq!(decode_entities("a&#0;b"), "a\u{fffd}b");
        assert_eq!(decode_entities("&#xD800;"), "\u{fffd}");
        assert_eq!(decode_entities("&#99999999;"), "\u{fffd}");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#65;&#x42;&quot;"), "AB\"");
        assert_eq!(decode_entities("AT&T &unknown; &"), "AT&T &unknown; &");
    }

    #[test]
    fn test_extract_status() {
        let html = "<html><body><pre>Serial: SN1\nStatus: Available\nUpdatedAt: 10:00</pre></body></html>";
        let data = extract_status(html);

        assert_eq!(data.len(), 3);
        assert_eq!(data["Serial"], "SN1");
        assert_eq!(data["Status"], "Available");
        assert_eq!(data["UpdatedAt"], "10:00");
    }
}
