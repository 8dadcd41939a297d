use anyhow::Result;
use clap::Parser;
use std::io::BufRead;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript::{output, Cli, Config, TranscriptExtractor};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "yt_transcript=debug"
    } else {
        "yt_transcript=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let url = if cli.stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim().to_string()
    } else {
        cli.url.clone().unwrap_or_default()
    };

    if url.is_empty() {
        eprintln!("Error: No URL provided. Pass a URL or use --stdin.");
        std::process::exit(2);
    }

    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let extractor = TranscriptExtractor::new(config);
    let result = extractor.extract(&url).await;

    let saved_to = if result.success && !cli.no_save {
        match cli.output_dir.as_deref() {
            Some(dir) => Some(output::save_transcript(&result, &output::expand_home(dir))?),
            None => None,
        }
    } else {
        None
    };

    if cli.json {
        let mut doc = serde_json::to_value(&result)?;
        if let (Some(path), Some(obj)) = (&saved_to, doc.as_object_mut()) {
            obj.insert(
                "output_file".to_string(),
                serde_json::Value::String(path.display().to_string()),
            );
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
        if !result.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    if result.success {
        output::print_plain(&result, saved_to.as_deref());
    } else {
        eprintln!("Error: {}", result.error);
        std::process::exit(1);
    }

    Ok(())
}
