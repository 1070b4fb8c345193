//! Header clean-up applied before structural parsing.
//!
//! Some exporters wrap every header in doubled or stray quotes. The first
//! line is rebuilt so each surviving header is wrapped in exactly one pair of
//! quotes; everything after it is passed through untouched.

const BOM: char = '\u{feff}';

/// Rewrite the header line of `content`.
pub fn sanitize_header_line(content: &str) -> String {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let (header, rest) = match content.find('\n') {
        Some(idx) => content.split_at(idx),
        None => (content, ""),
    };
    let header = header.strip_suffix('\r').unwrap_or(header);

    let cleaned = header
        .split(',')
        .map(clean_header)
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\""))
        .collect::<Vec<_>>()
        .join(",");

    let mut out = String::with_capacity(content.len() + 2);
    out.push_str(&cleaned);
    out.push_str(rest);
    out
}

/// Strip wrapping quotes, embedded quotes and whitespace from one header token.
pub(crate) fn clean_header(token: &str) -> String {
    token
        .trim()
        .trim_matches('"')
        .replace('"', "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_and_bare_headers_normalize_alike() {
        let quoted = sanitize_header_line("\"Name\",\"Platform\"\nA,B\n");
        let bare = sanitize_header_line("Name,Platform\nA,B\n");
        assert_eq!(quoted, bare);
        assert_eq!(bare, "\"Name\",\"Platform\"\nA,B\n");
    }

    #[test]
    fn stray_and_doubled_quotes_are_removed() {
        let out = sanitize_header_line("\"\"name\"\", \"plat\"form\" ,,\"\"\r\n\"x\",\"y\"");
        assert_eq!(out, "\"name\",\"platform\"\n\"x\",\"y\"");
    }

    #[test]
    fn byte_order_mark_and_single_line_input() {
        assert_eq!(sanitize_header_line("\u{feff}title"), "\"title\"");
        assert_eq!(sanitize_header_line(""), "");
    }

    #[test]
    fn data_lines_are_untouched() {
        let out = sanitize_header_line("a,b\n\"\"odd\"\",  spaced  \n");
        assert!(out.ends_with("\n\"\"odd\"\",  spaced  \n"));
    }
}
