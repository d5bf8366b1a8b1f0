//! Build-time configuration. There is no runtime configuration surface:
//! the mirror list, request identity, and output layout are all fixed
//! when the binary is built.

/// Candidate mirrors, tried in order until one answers the liveness probe.
pub const MIRRORS: [&str; 4] = [
    "https://ppv.land",
    "https://freeppv.fun",
    "https://ppv.wtf",
    "https://ppvs.su",
];

/// Browser user agent. The upstream serves errors or different content to
/// requests that do not look like they come from a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36";

/// Directory the playlist files are written to.
pub const M3U_DIR: &str = "m3u";

/// Directory the EPG files are written to.
pub const EPG_DIR: &str = "xml";
