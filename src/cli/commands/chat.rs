//! Interactive terminal session.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::session::{ChatSession, ProcessOutcome};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Inputs that end the question loop.
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

/// Run the interactive chat command.
pub async fn run_chat(url: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let mut session = ChatSession::new(Pipeline::new(settings, None)?);

    println!("\n{}", style("Tubechat").bold().red());
    println!("{}\n", style("Ask questions about any YouTube video.").dim());

    let url = match url {
        Some(u) => u,
        None => match prompt("Enter YouTube video URL or ID:")? {
            Some(u) if !u.is_empty() => u,
            _ => {
                Output::warning("Please enter a YouTube video URL");
                return Ok(());
            }
        },
    };

    let spinner = Output::spinner("Processing video transcript...");
    let outcome = session.process(&url).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(ProcessOutcome::Processed(summary)) | Ok(ProcessOutcome::AlreadyProcessed(summary)) => {
            Output::success("Video processed successfully! You can now ask questions.");
            Output::video_summary(&summary);
        }
        Err(e) => {
            Output::error(&e.user_message());
            return Err(e.into());
        }
    }

    println!(
        "\n{}",
        style("Type your questions, or 'exit' to quit.").dim()
    );

    loop {
        let Some(question) = prompt(&format!("{}", style("\nQuestion:").green().bold()))? else {
            break;
        };

        if question.is_empty() {
            continue;
        }
        if is_exit(&question) {
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let result = session.ask(&question).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => Output::answer(&response),
            // Keep the session alive; the next question may succeed.
            Err(e) => Output::error(&e.user_message()),
        }
    }

    Output::info("Goodbye!");
    Ok(())
}

/// Print a prompt and read one trimmed line. None on end of input.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{} ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}
