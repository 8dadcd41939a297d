use anyhow::Result;
use url::Url;

use crate::ExtractError;

/// A canonical YouTube video identifier.
///
/// Derived once from the raw input URL; every downstream operation addresses
/// the video through this id (and the canonical watch URL built from it),
/// never through the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(String);

const YOUTUBE_HOSTS: &[&str] = &["www.youtube.com", "youtube.com", "m.youtube.com"];

impl VideoId {
    /// Extract a video id from any supported YouTube URL shape.
    ///
    /// Accepts watch links (including the mobile subdomain), `/shorts/` and
    /// `/embed/` paths, and `youtu.be` short links. Bare 11-character ids are
    /// deliberately not accepted as input.
    pub fn parse(input: &str) -> Result<Self> {
        Self::try_parse(input).ok_or_else(|| ExtractError::UnparseableUrl(input.to_string()).into())
    }

    fn try_parse(input: &str) -> Option<Self> {
        let parsed = Url::parse(input).ok()?;
        let host = parsed.host_str()?;

        if YOUTUBE_HOSTS.contains(&host) {
            if parsed.path() == "/watch" {
                let id = parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())?;
                return Some(VideoId(id));
            }
            for prefix in ["/shorts/", "/embed/"] {
                if let Some(rest) = parsed.path().strip_prefix(prefix) {
                    return Self::first_segment(rest);
                }
            }
            return None;
        }

        if host == "youtu.be" {
            return Self::first_segment(parsed.path().trim_start_matches('/'));
        }

        None
    }

    fn first_segment(path: &str) -> Option<Self> {
        let id = path.split('/').next().unwrap_or("");
        if id.is_empty() {
            None
        } else {
            Some(VideoId(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized watch URL used for all browser operations.
    pub fn canonical_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(input: &str) -> String {
        VideoId::parse(input).unwrap().as_str().to_string()
    }

    #[test]
    fn standard_watch_url() {
        assert_eq!(id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn watch_url_with_extra_params() {
        assert_eq!(id("https://www.youtube.com/watch?v=abc123XYZ_-&t=120"), "abc123XYZ_-");
    }

    #[test]
    fn short_url() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn short_url_with_params() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ?t=30"), "dQw4w9WgXcQ");
    }

    #[test]
    fn shorts_url() {
        assert_eq!(id("https://www.youtube.com/shorts/abcdefghijk"), "abcdefghijk");
    }

    #[test]
    fn shorts_url_with_trailing_path() {
        assert_eq!(id("https://www.youtube.com/shorts/abcdefghijk/extra"), "abcdefghijk");
    }

    #[test]
    fn embed_url() {
        assert_eq!(id("https://www.youtube.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn mobile_url() {
        assert_eq!(id("https://m.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn plain_youtube_domain() {
        assert_eq!(id("https://youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn invalid_url() {
        assert!(VideoId::parse("https://example.com/page").is_err());
    }

    #[test]
    fn no_video_id_in_query() {
        assert!(VideoId::parse("https://www.youtube.com/watch?list=PLxyz").is_err());
    }

    #[test]
    fn empty_string() {
        assert!(VideoId::parse("").is_err());
    }

    #[test]
    fn random_string() {
        assert!(VideoId::parse("not a url at all").is_err());
    }

    #[test]
    fn bare_video_id_rejected() {
        assert!(VideoId::parse("dQw4w9WgXcQ").is_err());
    }

    #[test]
    fn canonical_url_round_trip() {
        let from_short = VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let from_watch = VideoId::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(from_short.canonical_url(), from_watch.canonical_url());
        assert_eq!(
            from_short.canonical_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn parse_error_message_names_input() {
        let err = VideoId::parse("https://example.com/page").unwrap_err();
        assert!(err.to_string().contains("Could not parse video ID"));
    }
}
