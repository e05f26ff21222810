//! Transcript command implementation.

use crate::chunking::TextChunker;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{TranscriptSource, YoutubeTranscriptSource};
use crate::video::VideoRef;
use anyhow::Result;

/// Fetch a transcript and print or save it.
pub async fn run_transcript(
    url: &str,
    output: Option<String>,
    show_chunks: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let video = match VideoRef::parse(url) {
        Ok(v) => v,
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    let source = YoutubeTranscriptSource::new(settings.transcript.preserve_formatting)?;

    let spinner = Output::spinner("Fetching transcript...");
    let fetched = source.fetch(&video.id, &settings.transcript.languages).await;
    spinner.finish_and_clear();

    let transcript = match fetched {
        Ok(t) => t,
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    let text = if show_chunks {
        let chunker = TextChunker::from_settings(&settings.chunking)?;
        chunker
            .chunk(&transcript)
            .iter()
            .map(|c| format!("[{}] @ {}\n{}", c.order, c.format_timestamp(), c.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        transcript.text.clone()
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &text)?;
            Output::success(&format!(
                "Saved transcript of {} ({}) to {}",
                video.id, transcript.language_code, path
            ));
        }
        None => println!("{}", text),
    }

    Ok(())
}
