//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::session::ChatSession;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    url: &str,
    question: &str,
    top_k: Option<usize>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(k) = top_k {
        settings.retrieval.k = k;
    }
    if let Some(model) = model {
        settings.rag.model = model;
    }

    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let mut session = ChatSession::new(Pipeline::new(settings, None)?);

    let spinner = Output::spinner("Processing video transcript...");
    let outcome = session.process(url).await;
    spinner.finish_and_clear();

    if let Err(e) = outcome {
        Output::error(&e.user_message());
        return Err(e.into());
    }

    let spinner = Output::spinner("Thinking...");
    let answer = session.ask(question).await;
    spinner.finish_and_clear();

    match answer {
        Ok(response) => {
            Output::answer(&response);
            Ok(())
        }
        Err(e) => {
            Output::error(&e.user_message());
            Err(e.into())
        }
    }
}
