// src/cli/ask.rs — `notebook ask`: one-shot or interactive documentation Q&A

use std::io::{BufRead, IsTerminal};
use std::sync::Arc;

use super::index::database_path;
use super::AskArgs;
use crate::infra::config::Config;
use crate::infra::errors::NotebookError;
use crate::provider::openai::OpenAIProvider;
use crate::rag::assistant::{Answer, Assistant, AssistantConfig};
use crate::rag::DocumentIndex;

/// Words that end the interactive loop.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit" | "/quit")
}

pub fn format_answer(answer: &Answer) -> String {
    if answer.pages.is_empty() {
        return answer.text.clone();
    }
    let pages: Vec<String> = answer.pages.iter().map(|p| p.to_string()).collect();
    format!("{}\n\n[pages: {}]", answer.text, pages.join(", "))
}

/// Next question, or `None` on EOF / cancel. Uses an inquire prompt on a
/// terminal and plain line reads otherwise.
fn read_question() -> anyhow::Result<Option<String>> {
    if std::io::stdin().is_terminal() {
        return match inquire::Text::new("You:").prompt() {
            Ok(line) => Ok(Some(line)),
            Err(
                inquire::InquireError::OperationCanceled
                | inquire::InquireError::OperationInterrupted,
            ) => Ok(None),
            Err(e) => Err(e.into()),
        };
    }

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    Ok((read > 0).then_some(line))
}

pub async fn run_ask(args: AskArgs, config: &Config) -> anyhow::Result<()> {
    let provider = Arc::new(OpenAIProvider::from_env(&config.model.provider_url)?);
    let db_path = database_path(args.database.as_ref(), config);
    let index = DocumentIndex::open(&db_path, provider.clone(), &config.model.embedding_model)?;
    if !index.collection_exists(&args.collection)? {
        return Err(NotebookError::CollectionNotFound {
            name: args.collection.clone(),
        }
        .into());
    }

    let mut assistant = Assistant::new(
        provider,
        Arc::new(index),
        AssistantConfig {
            model: config.rag.agent_model.clone(),
            collection: args.collection.clone(),
            n_results: args.n_results.unwrap_or(config.rag.n_results),
            use_tools: args.tools,
            max_tokens: config.model.max_tokens,
            temperature: config.model.temperature,
        },
    )?;

    if !args.question.is_empty() {
        let answer = assistant.ask(&args.question.join(" ")).await?;
        println!("{}", format_answer(&answer));
        return Ok(());
    }

    eprintln!(
        "Asking about '{}'. Type 'exit' or 'quit' to leave.",
        args.collection
    );
    while let Some(line) = read_question()? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            break;
        }
        match assistant.ask(question).await {
            Ok(answer) => println!("{}\n", format_answer(&answer)),
            // Keep the session alive; the failed turn is not recorded.
            Err(e) => eprintln!("error: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT "));
        assert!(!is_exit_command("exit code 3?"));
    }

    #[test]
    fn test_format_answer_lists_pages() {
        let answer = Answer {
            text: "Use fix nve.".into(),
            pages: vec![12, 40],
        };
        assert_eq!(format_answer(&answer), "Use fix nve.\n\n[pages: 12, 40]");
    }

    #[test]
    fn test_format_answer_without_pages() {
        let answer = Answer {
            text: "Not covered.".into(),
            pages: vec![],
        };
        assert_eq!(format_answer(&answer), "Not covered.");
    }
}
