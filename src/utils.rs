//! Formatting helpers shared by the playlist and guide builders.

use chrono::{Local, TimeZone, Utc};

/// Formats a Unix timestamp as a human-readable local time,
/// e.g. `7 August 2026 at 14:05`.
pub fn timestamp_to_string(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%-d %B %Y at %H:%M").to_string(),
        None => "unknown time".to_string(),
    }
}

/// Formats a Unix timestamp in the compact XMLTV UTC form,
/// e.g. `20260807120500 +0000`.
pub fn xmltv_timestamp(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => format!("{} +0000", dt.format("%Y%m%d%H%M%S")),
        None => "19700101000000 +0000".to_string(),
    }
}

/// Escapes the five reserved XML characters. Ampersand goes first so the
/// entities introduced by the later passes survive intact.
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unescape_xml(input: &str) -> String {
        input
            .replace("&#39;", "'")
            .replace("&quot;", "\"")
            .replace("&gt;", ">")
            .replace("&lt;", "<")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_escape_xml() {
        let input = "Mortal Kombat & \"Friends\" <live> 'finale'";
        let escaped = escape_xml(input);
        assert_eq!(
            escaped,
            "Mortal Kombat &amp; &quot;Friends&quot; &lt;live&gt; &#39;finale&#39;"
        );
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        assert_eq!(unescape_xml(&escaped), input);
    }

    #[test]
    fn test_escape_xml_plain_text_untouched() {
        assert_eq!(escape_xml("UFC 300: Main Card"), "UFC 300: Main Card");
    }

    #[test]
    fn test_xmltv_timestamp() {
        assert_eq!(xmltv_timestamp(0), "19700101000000 +0000");
        assert_eq!(xmltv_timestamp(1_700_000_000), "20231114221320 +0000");
    }

    #[test]
    fn test_xmltv_timestamp_out_of_range() {
        assert_eq!(xmltv_timestamp(i64::MAX), "19700101000000 +0000");
    }

    #[test]
    fn test_timestamp_to_string_shape() {
        // Rendered in local time, so assert structure rather than the
        // exact wall clock: "<day> <Month> <year> at <HH>:<MM>".
        let formatted = timestamp_to_string(1_700_000_000);
        let (date_part, clock) = formatted.split_once(" at ").expect("missing ' at '");
        let fields: Vec<&str> = date_part.split(' ').collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].parse::<u32>().is_ok());
        assert!(fields[2].parse::<i32>().is_ok());
        assert_eq!(clock.len(), 5);
        assert_eq!(clock.as_bytes()[2], b':');
    }

    #[test]
    fn test_timestamp_to_string_out_of_range() {
        assert_eq!(timestamp_to_string(i64::MAX), "unknown time");
    }
}
