//! CLI output formatting utilities.

use crate::rag::RagResponse;
use crate::session::VideoSummary;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print details of a processed video.
    pub fn video_summary(summary: &VideoSummary) {
        Output::kv("Video", &summary.watch_url);
        Output::kv(
            "Transcript",
            &format!(
                "{}{}",
                summary.language,
                if summary.is_generated { " (auto-generated)" } else { "" }
            ),
        );
        Output::kv("Duration", &format_duration(summary.duration_seconds));
        Output::kv("Chunks", &summary.chunk_count.to_string());
    }

    /// Print an answer and its sources.
    pub fn answer(response: &RagResponse) {
        println!("\n{}\n", response.answer);

        if !response.sources.is_empty() {
            println!("{}", style("Sources").dim().underlined());
            for source in &response.sources {
                println!(
                    "  {} @ {} (score: {:.2})",
                    style("*").cyan(),
                    style(&source.timestamp).cyan(),
                    source.score
                );
                println!("    {}", style(content_preview(&source.content, 120)).dim());
                if let Some(url) = &source.url {
                    println!("    {}", style(url).dim());
                }
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate content with ellipsis, on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_content_preview_multibyte() {
        let text = "héllo wörld ".repeat(20);
        let preview = content_preview(&text, 10);
        assert_eq!(preview, "héllo wörl...");
    }
}
