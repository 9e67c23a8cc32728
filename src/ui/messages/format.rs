//! Splits message bodies into plain text, links and inline images.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("URL regex pattern is valid"));

static IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(jpeg|jpg|gif|png|webp)$").expect("image suffix regex is valid")
});

/// A run of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Link(&'a str),
    Image(&'a str),
}

/// Whether a URL should render as an inline image.
pub fn is_image_url(url: &str) -> bool {
    IMAGE_RE.is_match(url)
}

/// One pass over `text`: every bare `http(s)://` URL becomes a `Link` or
/// `Image` (by file-extension suffix); everything between is `Text`.
pub fn parse_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in URL_RE.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Text(&text[last..m.start()]));
        }
        let url = m.as_str();
        segments.push(if is_image_url(url) {
            Segment::Image(url)
        } else {
            Segment::Link(url)
        });
        last = m.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_between_text() {
        assert_eq!(
            parse_segments("check http://x.com/pic.png out"),
            vec![
                Segment::Text("check "),
                Segment::Image("http://x.com/pic.png"),
                Segment::Text(" out"),
            ]
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_segments("just words"), vec![Segment::Text("just words")]);
        assert!(parse_segments("").is_empty());
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            parse_segments("https://example.com and https://cdn.io/a.JPEG"),
            vec![
                Segment::Link("https://example.com"),
                Segment::Text(" and "),
                Segment::Image("https://cdn.io/a.JPEG"),
            ]
        );
    }

    #[test]
    fn test_suffix_must_end_url() {
        // Query strings defeat the suffix check, same as any other tail
        assert_eq!(
            parse_segments("https://x.com/a.png?size=2"),
            vec![Segment::Link("https://x.com/a.png?size=2")]
        );
        assert!(!is_image_url("https://x.com/png"));
        assert!(is_image_url("https://x.com/anim.GIF"));
        assert!(is_image_url("https://x.com/pic.webp"));
    }

    #[test]
    fn test_url_runs_to_whitespace() {
        // Trailing punctuation is part of the URL; only whitespace ends it
        assert_eq!(
            parse_segments("see http://a.b/c.png, ok"),
            vec![
                Segment::Text("see "),
                Segment::Link("http://a.b/c.png,"),
                Segment::Text(" ok"),
            ]
        );
    }

    #[test]
    fn test_non_http_schemes_are_text() {
        assert_eq!(
            parse_segments("ftp://x.com/a.png"),
            vec![Segment::Text("ftp://x.com/a.png")]
        );
    }

    #[test]
    fn test_adjacent_urls_split_by_newline() {
        assert_eq!(
            parse_segments("http://a.com\nhttp://b.com/i.gif"),
            vec![
                Segment::Link("http://a.com"),
                Segment::Text("\n"),
                Segment::Image("http://b.com/i.gif"),
            ]
        );
    }
}
