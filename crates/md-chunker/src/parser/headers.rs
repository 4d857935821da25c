use super::LineInfo;
use crate::types::Header;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6}) +(.+?)\s*#*\s*$").unwrap());

/// Detect ATX headers outside any fenced block. Setext headers are not
/// recognized.
pub(crate) fn scan_headers(lines: &[LineInfo<'_>], outside: &[bool]) -> Vec<Header> {
    let mut headers = Vec::new();
    for (idx, li) in lines.iter().enumerate() {
        if !outside[idx] {
            continue;
        }
        if let Some(caps) = HEADER_RE.captures(li.line) {
            let level = caps[1].len() as u8;
            let text = caps[2].trim().to_string();
            headers.push(Header {
                level,
                text,
                line: idx + 1,
                offset: li.start_offset,
            });
        }
    }
    headers
}
