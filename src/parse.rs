use regex::Regex;
use std::sync::OnceLock;

/// Page delimiter emitted by `pdftotext`.
pub const PAGE_DELIMITER: char = '\x0c';

/// Splits page-delimited text into pages, page 1 first. A trailing delimiter
/// after the last page does not produce an extra empty page.
pub fn split_pages(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    let mut pages: Vec<String> = normalized
        .split(PAGE_DELIMITER)
        .map(str::to_string)
        .collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }
    if pages.len() == 1 && pages[0].is_empty() {
        pages.clear();
    }
    pages
}

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| {
        Regex::new(r"\AINSTRUCTION SET REFERENCE, [A-Z]-[A-Z]\r?\n\r?\n([[:alnum:]/]+)[ \t]*[—–-]")
            .expect("static heading pattern")
    })
}

/// Returns the mnemonic group of an instruction reference page, e.g.
/// `ADD/ADC` for a page starting with
/// `INSTRUCTION SET REFERENCE, A-L\n\nADD/ADC —`.
pub fn heading_group(page: &str) -> Option<&str> {
    heading_regex()
        .captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|g| g.chars().any(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pages_drops_trailing_delimiter() {
        let pages = split_pages("one\x0ctwo\x0cthree\x0c");
        assert_eq!(pages, vec!["one", "two", "three"]);
    }

    #[test]
    fn split_pages_keeps_interior_empty_pages() {
        let pages = split_pages("one\x0c\x0cthree");
        assert_eq!(pages, vec!["one", "", "three"]);
    }

    #[test]
    fn split_pages_of_empty_text_is_empty() {
        assert!(split_pages("").is_empty());
    }

    #[test]
    fn heading_group_captures_slash_separated_group() {
        let page = "INSTRUCTION SET REFERENCE, A-L\n\nCMOVcc—Conditional Move\n\nOpcode ...";
        assert_eq!(heading_group(page), Some("CMOVcc"));

        let page = "INSTRUCTION SET REFERENCE, A-B\n\nADD/ADC —\n...";
        assert_eq!(heading_group(page), Some("ADD/ADC"));
    }

    #[test]
    fn heading_group_requires_heading_at_page_start() {
        let page = "Vol. 2A\nINSTRUCTION SET REFERENCE, A-L\n\nADD—Add\n";
        assert_eq!(heading_group(page), None);

        let page = "INSTRUCTION SET REFERENCE, A-L\nADD—Add\n";
        assert_eq!(heading_group(page), None);

        let page = "INSTRUCTION SET REFERENCE, A-L\n\nThe following table lists\n";
        assert_eq!(heading_group(page), None);
    }
}
