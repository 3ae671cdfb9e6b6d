//! Interactive chat command over the `!` command bot.

use super::{build_assistant, refresh_with_spinner};
use crate::bot::Bot;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::interaction_log::{Feedback, SqliteInteractionLog};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let assistant = Arc::new(build_assistant(Operation::Answer, &settings)?);
    let log = Arc::new(SqliteInteractionLog::new(
        &settings.interaction_log_path(),
        settings.interaction_log.utc_offset_hours,
    )?);

    // A failed startup load leaves an empty cache; `!refresh` can retry.
    if refresh_with_spinner(&assistant).await.is_err() {
        Output::warning("Starting with an empty knowledge base. Use !refresh to retry.");
    }

    let bot = Bot::new(assistant, log);

    println!("\n{}", style("Deskbot Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask a question, or use !help for commands. Type 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        let reply = match bot.handle_message(input).await {
            Some(reply) => reply,
            None => {
                let spinner = Output::spinner("Thinking...");
                let reply = bot.ask(input).await;
                spinner.finish_and_clear();
                reply
            }
        };

        println!("\n{} {}\n", style("Deskbot:").cyan().bold(), reply.content);

        if reply.feedback_controls {
            if let Some(feedback) = prompt_feedback(&stdin, &mut stdout)? {
                let thanks = bot.handle_feedback(&reply.content, feedback).await;
                println!("{}\n", style(thanks).dim());
            }
        }
    }

    Ok(())
}

/// Ask for optional feedback on the last answer.
fn prompt_feedback(stdin: &io::Stdin, stdout: &mut io::Stdout) -> Result<Option<Feedback>> {
    print!(
        "{} ",
        style("Feedback? [a] accurate  [n] not accurate  [i] can be improved  (Enter to skip):").dim()
    );
    stdout.flush()?;

    let mut input = String::new();
    stdin.lock().read_line(&mut input)?;
    Ok(parse_feedback_shortcut(&input))
}

fn parse_feedback_shortcut(input: &str) -> Option<Feedback> {
    match input.trim().to_lowercase().as_str() {
        "a" => Some(Feedback::Accurate),
        "n" => Some(Feedback::NotAccurate),
        "i" => Some(Feedback::CanImprove),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_shortcuts() {
        assert_eq!(parse_feedback_shortcut("a\n"), Some(Feedback::Accurate));
        assert_eq!(parse_feedback_shortcut("N"), Some(Feedback::NotAccurate));
        assert_eq!(parse_feedback_shortcut("can_improve"), Some(Feedback::CanImprove));
        assert_eq!(parse_feedback_shortcut(""), None);
        assert_eq!(parse_feedback_shortcut("maybe"), None);
    }
}
