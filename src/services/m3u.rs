//! Extended M3U playlist parsing.

use crate::models::NewChannelRecord;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const EXTINF: &str = "#EXTINF:";
const EXTGRP: &str = "#EXTGRP:";

/// One playable entry of an M3U playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct M3uEntry {
    pub title: String,
    pub url: String,
    /// Seconds as declared by `#EXTINF`; `-1` conventionally means a live stream.
    pub duration: Option<f64>,
    /// `key="value"` attributes such as `tvg-id`, `tvg-logo`, `group-title`.
    pub attributes: BTreeMap<String, String>,
    pub group: Option<String>,
}

impl M3uEntry {
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn to_record(&self) -> NewChannelRecord {
        NewChannelRecord::new(self.title.clone(), self.url.clone())
    }
}

#[derive(Default)]
struct PendingInfo {
    title: String,
    duration: Option<f64>,
    attributes: BTreeMap<String, String>,
    group: Option<String>,
}

fn attribute_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([A-Za-z0-9_-]+)="([^"]*)""#).ok())
        .as_ref()
}

/// Parses extended or plain M3U text.
///
/// Unknown directives are ignored. A URL without a preceding `#EXTINF` is
/// named after itself. A trailing `#EXTINF` with no URL is dropped.
#[must_use]
pub fn parse_playlist(text: &str) -> Vec<M3uEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingInfo> = None;

    for line in text.lines() {
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(EXTINF) {
            pending = Some(parse_extinf(rest));
            continue;
        }

        if let Some(group) = line.strip_prefix(EXTGRP) {
            if let Some(info) = pending.as_mut() {
                let group = group.trim();
                if !group.is_empty() {
                    info.group = Some(group.to_string());
                }
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let info = pending.take().unwrap_or_default();
        let title = if info.title.is_empty() {
            info.attributes
                .get("tvg-name")
                .filter(|name| !name.trim().is_empty())
                .map_or_else(|| line.to_string(), |name| name.trim().to_string())
        } else {
            info.title
        };
        let group = info
            .group
            .or_else(|| info.attributes.get("group-title").cloned())
            .filter(|g| !g.is_empty());

        entries.push(M3uEntry {
            title,
            url: line.to_string(),
            duration: info.duration,
            attributes: info.attributes,
            group,
        });
    }

    entries
}

fn parse_extinf(rest: &str) -> PendingInfo {
    let (header, title) = split_title(rest);

    let duration = header
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok());

    let attributes = attribute_regex()
        .map(|re| {
            re.captures_iter(header)
                .map(|caps| (caps[1].to_ascii_lowercase(), caps[2].trim().to_string()))
                .collect()
        })
        .unwrap_or_default();

    PendingInfo {
        title: title.trim().to_string(),
        duration,
        attributes,
        group: None,
    }
}

/// Splits `#EXTINF` content at the first comma outside a quoted attribute value.
fn split_title(rest: &str) -> (&str, &str) {
    let mut in_quotes = false;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&rest[..idx], &rest[idx + 1..]),
            _ => {}
        }
    }
    (rest, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"#EXTM3U x-tvg-url="http://epg.example/guide.xml"
#EXTINF:-1 tvg-id="news.us" tvg-name="News HD" tvg-logo="http://logo/news.png" group-title="News",News Channel
http://stream.example/news.m3u8

#EXTINF:-1 tvg-name="Sports, Live" group-title="Sports",
#EXTVLCOPT:http-user-agent=Mozilla
http://stream.example/sports.ts
#EXTINF:120,Movie Trailer
#EXTGRP:Movies
http://stream.example/trailer.mp4
rtmp://plain.example/live
"#;

    #[test]
    fn parses_extended_entries() {
        let entries = parse_playlist(SAMPLE);
        assert_eq!(entries.len(), 4);

        let news = &entries[0];
        assert_eq!(news.title, "News Channel");
        assert_eq!(news.url, "http://stream.example/news.m3u8");
        assert_eq!(news.duration, Some(-1.0));
        assert_eq!(news.attribute("tvg-id"), Some("news.us"));
        assert_eq!(news.group.as_deref(), Some("News"));
    }

    #[test]
    fn title_falls_back_to_tvg_name_with_quoted_comma() {
        let entries = parse_playlist(SAMPLE);
        assert_eq!(entries[1].title, "Sports, Live");
        assert_eq!(entries[1].url, "http://stream.example/sports.ts");
        assert_eq!(entries[1].group.as_deref(), Some("Sports"));
    }

    #[test]
    fn extgrp_sets_group() {
        let entries = parse_playlist(SAMPLE);
        assert_eq!(entries[2].title, "Movie Trailer");
        assert_eq!(entries[2].duration, Some(120.0));
        assert_eq!(entries[2].group.as_deref(), Some("Movies"));
    }

    #[test]
    fn bare_url_is_named_after_itself() {
        let entries = parse_playlist(SAMPLE);
        assert_eq!(entries[3].title, "rtmp://plain.example/live");
        assert!(entries[3].attributes.is_empty());
        assert_eq!(entries[3].duration, None);
    }

    #[test]
    fn dangling_extinf_is_dropped() {
        let entries = parse_playlist("#EXTM3U\n#EXTINF:-1,Orphan\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn handles_crlf_and_bom() {
        let text = "\u{feff}#EXTM3U\r\n#EXTINF:-1,One\r\nhttp://a/1\r\n";
        let entries = parse_playlist(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "One");
        assert_eq!(entries[0].url, "http://a/1");
    }

    #[test]
    fn record_conversion_keeps_title_and_url() {
        let entries = parse_playlist("#EXTINF:-1,One\nhttp://a/1\n");
        let record = entries[0].to_record();
        assert_eq!(record.name, "One");
        assert_eq!(record.url, "http://a/1");
        assert_eq!(record.status, None);
    }
}
