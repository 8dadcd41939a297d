use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "yt-transcript",
    about = "Extract YouTube video transcripts via the Chrome DevTools Protocol",
    version,
    long_about = "Opens the video's watch page in a real Chrome instance, clicks \
\"Show transcript\", and scrapes the text from the DOM, falling back to the \
caption-track API when the panel is unavailable."
)]
pub struct Cli {
    /// YouTube video URL
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Read the URL from the first line of stdin
    #[arg(long)]
    pub stdin: bool,

    /// Output the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Chrome CDP port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory to save the transcript into (enables saving)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip saving the transcript to disk
    #[arg(long)]
    pub no_save: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
