use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::extractor::ExtractionResult;

/// Sanitize a filename component for cross-platform safety.
pub fn sanitize_filename(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "untitled".to_string()
    } else {
        collapsed
    }
}

/// Expand a leading `~` component into the user's home directory. Shells do
/// this for interactive use, but scripted callers often pass the path quoted.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Save a successful transcript to `<channel> - <title> [<video id>].txt`
/// under `output_dir`, creating the directory as needed.
pub fn save_transcript(result: &ExtractionResult, output_dir: &Path) -> Result<PathBuf> {
    fs_err::create_dir_all(output_dir)?;

    let channel = if result.channel.is_empty() {
        "unknown-channel".to_string()
    } else {
        sanitize_filename(&result.channel)
    };
    let title = sanitize_filename(&result.title);
    let video_id = if result.video_id.is_empty() {
        "video".to_string()
    } else {
        sanitize_filename(&result.video_id)
    };

    let path = output_dir.join(format!("{} - {} [{}].txt", channel, title, video_id));
    fs_err::write(&path, &result.transcript)?;
    Ok(path)
}

/// Render a successful result as plain text: title, channel, separator,
/// transcript body, and the saved-file path when one was written.
pub fn print_plain(result: &ExtractionResult, saved_to: Option<&Path>) {
    if !result.title.is_empty() {
        println!("Title: {}", result.title);
    }
    if !result.channel.is_empty() {
        println!("Channel: {}", result.channel);
    }
    if !result.title.is_empty() || !result.channel.is_empty() {
        println!("{}", "=".repeat(50));
    }
    println!("{}", result.transcript);
    if let Some(path) = saved_to {
        println!("{}", "=".repeat(50));
        println!("Saved: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractionMethod;

    fn result(channel: &str, title: &str, video_id: &str, transcript: &str) -> ExtractionResult {
        ExtractionResult {
            success: true,
            video_id: video_id.to_string(),
            title: title.to_string(),
            channel: channel.to_string(),
            url: String::new(),
            transcript: transcript.to_string(),
            language: "en".to_string(),
            method: Some(ExtractionMethod::Dom),
            error: String::new(),
        }
    }

    #[test]
    fn sanitize_replaces_special_chars() {
        let out = sanitize_filename("file:name*\"test\"<>|");
        for ch in [':', '*', '"', '<', '>', '|'] {
            assert!(!out.contains(ch));
        }
        assert!(!sanitize_filename("a/b\\c").contains(['/', '\\']));
    }

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize_filename("  a   b  "), "a b");
    }

    #[test]
    fn sanitize_empty_returns_untitled() {
        assert_eq!(sanitize_filename(""), "untitled");
    }

    #[test]
    fn sanitize_preserves_normal_and_unicode() {
        assert_eq!(sanitize_filename("My Video Title"), "My Video Title");
        assert_eq!(sanitize_filename("日本語タイトル"), "日本語タイトル");
    }

    #[test]
    fn expand_home_resolves_tilde_prefix() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(
            expand_home(Path::new("~/transcripts")),
            home.join("transcripts")
        );
    }

    #[test]
    fn expand_home_leaves_other_paths_alone() {
        assert_eq!(expand_home(Path::new("/tmp/out")), PathBuf::from("/tmp/out"));
        assert_eq!(expand_home(Path::new("relative")), PathBuf::from("relative"));
        // Only a whole `~` component counts
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[test]
    fn save_writes_expected_filename_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_transcript(
            &result("MyChannel", "MyTitle", "xyz789", "Hello world transcript"),
            dir.path(),
        )
        .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "MyChannel - MyTitle [xyz789].txt"
        );
        assert_eq!(
            fs_err::read_to_string(&path).unwrap(),
            "Hello world transcript"
        );
    }

    #[test]
    fn save_uses_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_transcript(&result("", "", "", "text"), dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "unknown-channel - untitled [video].txt"
        );
    }

    #[test]
    fn save_creates_nested_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        let path = save_transcript(&result("Ch", "T", "id", "t"), &nested).unwrap();
        assert!(path.is_file());
    }
}
