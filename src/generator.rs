//! Catalog-to-playlist generation. One ordered pass over the catalog
//! produces an m3u playlist and its matching XMLTV guide; the two
//! documents are linked by shared `ppv-<id>` identifiers and never
//! diverge.

use std::time::Instant;

use chrono::Utc;
use log::{info, warn};

use crate::api::{PpvClient, StreamStub};
use crate::errors::FetchError;
use crate::utils::{escape_xml, timestamp_to_string, xmltv_timestamp};

/// The 30-day window separating scheduled events from long-running 24/7
/// channels.
const MONTH_SECS: i64 = 30 * 86400;

/// Output variants, each filtering the catalog by when streams started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Every stream in the catalog.
    Full,
    /// Streams that started over thirty days ago, treated as permanently
    /// live 24/7 channels.
    AlwaysOn,
    /// Streams starting within the last thirty days or in the future.
    Event,
}

impl Variant {
    /// Generation order for a run.
    pub const ALL: [Variant; 3] = [Variant::Full, Variant::AlwaysOn, Variant::Event];

    /// File stem shared by the `.m3u` and `.xml` outputs of this variant.
    pub fn file_stem(self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::AlwaysOn => "24-7",
            Variant::Event => "event",
        }
    }

    /// Whether `stream` belongs in this variant, judged at `now`. The
    /// comparisons are strict, so a stream starting exactly thirty days
    /// ago falls into neither time-filtered variant.
    pub fn admits(self, stream: &StreamStub, now: i64) -> bool {
        let month_ago = now - MONTH_SECS;
        match self {
            Variant::Full => true,
            Variant::AlwaysOn => month_ago > stream.starts_at,
            Variant::Event => month_ago < stream.starts_at,
        }
    }
}

/// The generated document pair. Every playlist entry has a matching
/// channel and programme block in the guide, in the same order.
#[derive(Debug, Clone)]
pub struct PlaylistBundle {
    pub m3u: String,
    pub epg: String,
}

/// Generates the document pair for `variant`, judging stream ages against
/// the current time.
pub async fn generate(client: &PpvClient, variant: Variant) -> Result<PlaylistBundle, FetchError> {
    generate_at(client, variant, Utc::now().timestamp()).await
}

/// Generates the document pair for `variant`, judging stream ages against
/// a caller-supplied instant. One catalog fetch, then one pass: category
/// order as received, streams within a category by descending start time.
/// A stream that fails to resolve is logged and skipped; a stream that
/// fails validation is skipped silently. Neither aborts the pass.
pub async fn generate_at(
    client: &PpvClient,
    variant: Variant,
    now: i64,
) -> Result<PlaylistBundle, FetchError> {
    let started = Instant::now();
    let categories = client.get_streams().await?;
    let month_ago = now - MONTH_SECS;

    let mut m3u = String::from("#EXTM3U\n");
    let mut epg = String::from("<tv>\n");
    let mut admitted = 0usize;

    for category in &categories {
        for stream in &category.streams {
            if !variant.admits(stream, now) {
                continue;
            }

            let manifest = match client.get_video_url(stream).await {
                Ok(url) => url,
                Err(err) => {
                    warn!("skipping {} ({}): {err}", stream.name, stream.category_name);
                    continue;
                }
            };

            if !client.is_stream_valid(stream, &manifest).await {
                continue;
            }

            let title = stream_title(stream, month_ago);
            let channel_id = format!("ppv-{}", stream.id);

            m3u.push_str(&format!(
                "#EXTINF:-1 tvg-id=\"{channel_id}\" tvg-name=\"{title}\" tvg-epgid=\"{}\" tvg-logo=\"{}\",{title}\n",
                stream.id, stream.poster
            ));
            m3u.push_str(&manifest);
            m3u.push('\n');

            push_channel(&mut epg, &channel_id, stream);
            push_programme(&mut epg, &channel_id, stream);
            admitted += 1;
        }
    }

    info!(
        "Variant \"{}\": {admitted} streams admitted in {:.1}s",
        variant.file_stem(),
        started.elapsed().as_secs_f32()
    );

    if admitted == 0 {
        return Err(FetchError::NoValidStreams);
    }

    epg.push_str("</tv>\n");
    Ok(PlaylistBundle { m3u, epg })
}

/// Long-running streams keep their bare name; anything newer gets the
/// scheduled start appended so players can tell recurring listings apart.
fn stream_title(stream: &StreamStub, month_ago: i64) -> String {
    if month_ago > stream.starts_at {
        stream.name.clone()
    } else {
        format!("{} ({})", stream.name, timestamp_to_string(stream.starts_at))
    }
}

fn push_channel(epg: &mut String, channel_id: &str, stream: &StreamStub) {
    epg.push_str(&format!("  <channel id=\"{}\">\n", escape_xml(channel_id)));
    epg.push_str(&format!(
        "    <display-name>{}</display-name>\n",
        escape_xml(&stream.name)
    ));
    epg.push_str("  </channel>\n");
}

fn push_programme(epg: &mut String, channel_id: &str, stream: &StreamStub) {
    epg.push_str(&format!(
        "  <programme start=\"{}\" stop=\"{}\" channel=\"{}\">\n",
        xmltv_timestamp(stream.starts_at),
        xmltv_timestamp(stream.ends_at),
        escape_xml(channel_id)
    ));
    epg.push_str(&format!(
        "    <title lang=\"en\">{}</title>\n",
        escape_xml(&stream.name)
    ));
    epg.push_str(&format!(
        "    <sub-title>{}</sub-title>\n",
        escape_xml(&stream.category_name)
    ));
    epg.push_str("    <video>\n      <present>yes</present>\n      <colour>yes</colour>\n    </video>\n");
    epg.push_str("    <audio>\n      <present>yes</present>\n      <stereo>stereo</stereo>\n    </audio>\n");
    epg.push_str(&format!(
        "    <category>{}</category>\n",
        escape_xml(&stream.category_name)
    ));
    epg.push_str(&format!("    <icon src=\"{}\" />\n", escape_xml(&stream.poster)));
    epg.push_str("  </programme>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000;

    fn stub(id: u64, starts_at: i64) -> StreamStub {
        StreamStub {
            id,
            name: format!("Stream {id}"),
            tag: String::new(),
            poster: String::new(),
            uri_name: String::new(),
            starts_at,
            ends_at: starts_at + 7200,
            always_live: 0,
            category_name: "Sports".to_string(),
            viewers: "0".to_string(),
        }
    }

    #[test]
    fn test_file_stems() {
        assert_eq!(Variant::Full.file_stem(), "full");
        assert_eq!(Variant::AlwaysOn.file_stem(), "24-7");
        assert_eq!(Variant::Event.file_stem(), "event");
    }

    #[test]
    fn test_full_admits_everything() {
        assert!(Variant::Full.admits(&stub(1, 0), NOW));
        assert!(Variant::Full.admits(&stub(2, NOW + 86400), NOW));
    }

    #[test]
    fn test_always_on_and_event_partition_around_month() {
        let old = stub(1, NOW - 40 * 86400);
        let fresh = stub(2, NOW - 86400);
        let upcoming = stub(3, NOW + 2 * 86400);

        assert!(Variant::AlwaysOn.admits(&old, NOW));
        assert!(!Variant::AlwaysOn.admits(&fresh, NOW));
        assert!(!Variant::AlwaysOn.admits(&upcoming, NOW));

        assert!(!Variant::Event.admits(&old, NOW));
        assert!(Variant::Event.admits(&fresh, NOW));
        assert!(Variant::Event.admits(&upcoming, NOW));
    }

    #[test]
    fn test_month_boundary_is_strict() {
        // Exactly thirty days ago: excluded from both filtered variants.
        let boundary = stub(1, NOW - MONTH_SECS);
        assert!(!Variant::AlwaysOn.admits(&boundary, NOW));
        assert!(!Variant::Event.admits(&boundary, NOW));
        assert!(Variant::Full.admits(&boundary, NOW));

        // One second older tips it into the 24/7 bucket.
        let just_over = stub(2, NOW - MONTH_SECS - 1);
        assert!(Variant::AlwaysOn.admits(&just_over, NOW));
        assert!(!Variant::Event.admits(&just_over, NOW));
    }

    #[test]
    fn test_stream_title_boundary() {
        let month_ago = NOW - MONTH_SECS;

        // Exactly thirty days old still counts as an event: dated title.
        let boundary = stub(1, month_ago);
        let title = stream_title(&boundary, month_ago);
        assert!(title.starts_with("Stream 1 ("));
        assert!(title.ends_with(')'));

        let just_over = stub(2, month_ago - 1);
        assert_eq!(stream_title(&just_over, month_ago), "Stream 2");
    }
}
