//! Turns chat commands into replies.

use super::router::{self, Command};
use crate::assistant::{Answer, Assistant};
use crate::error::DeskbotError;
use crate::helpdesk::FolderVisibility;
use crate::interaction_log::{Feedback, InteractionLog};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tracing::{info, instrument, warn};

static QUESTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Question: (.*)$").expect("Invalid regex"));

/// Placeholder used when a message carries no `Question: ` line.
pub const QUESTION_NOT_FOUND: &str = "Question not found";

/// A message to send back to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub content: String,
    /// Whether the accurate / not accurate / can improve controls go with it.
    pub feedback_controls: bool,
}

impl Reply {
    fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            feedback_controls: false,
        }
    }
}

/// Chat front end over the assistant and interaction log.
pub struct Bot {
    assistant: Arc<Assistant>,
    log: Arc<dyn InteractionLog>,
}

impl Bot {
    pub fn new(assistant: Arc<Assistant>, log: Arc<dyn InteractionLog>) -> Self {
        Self { assistant, log }
    }

    pub fn assistant(&self) -> &Arc<Assistant> {
        &self.assistant
    }

    /// Handle one chat message. Returns `None` if it is not a command.
    #[instrument(skip(self))]
    pub async fn handle_message(&self, message: &str) -> Option<Reply> {
        let command = match router::parse(message)? {
            Ok(command) => command,
            Err(usage) => return Some(Reply::text(usage.0)),
        };

        let reply = match command {
            Command::Ask(question) => self.ask(&question).await,
            Command::Help => Reply::text(self.help_text()),
            Command::Refresh => Reply::text(self.refresh().await),
            Command::Diagnose => Reply::text(self.diagnose().await),
            Command::DiagnoseKb => Reply::text(self.assistant.diagnose_cache().render()),
            Command::CheckArticle(id) => Reply::text(self.check_article(id).await),
            Command::Visibility { folder_id, level } => {
                Reply::text(self.visibility(folder_id, level).await)
            }
            Command::Test => Reply::text("Bot is working!"),
        };

        Some(reply)
    }

    /// Answer a question and log the interaction.
    pub async fn ask(&self, question: &str) -> Reply {
        self.answer(question).await.0
    }

    /// Like [`Bot::ask`], also returning the answer with its sources.
    pub async fn answer(&self, question: &str) -> (Reply, Answer) {
        let answer = self.assistant.ask(question).await;

        if let Err(e) = self.log.log_interaction(question, &answer.text).await {
            warn!("Failed to log interaction: {}", e);
        }

        let reply = Reply {
            content: format!("Question: {}\n\n{}", question, answer.text),
            feedback_controls: true,
        };
        (reply, answer)
    }

    /// Record feedback given on a previous answer message.
    #[instrument(skip(self, message_content))]
    pub async fn handle_feedback(&self, message_content: &str, feedback: Feedback) -> String {
        let question = extract_question(message_content);

        match self.log.update_feedback(&question, feedback).await {
            Ok(true) => info!("Feedback recorded"),
            Ok(false) => warn!("No logged interaction for question: {}", question),
            Err(e) => warn!("Failed to record feedback: {}", e),
        }

        feedback.thanks().to_string()
    }

    pub fn help_text(&self) -> String {
        let categories: String = self
            .assistant
            .knowledge_base()
            .allowed_categories()
            .names()
            .iter()
            .map(|name| format!("• {}\n", name))
            .collect();

        format!(
            "**Available Commands:**\n\
             `!ask <your question>` - Ask me anything about our knowledge base\n\
             `!help` - Show this help message\n\
             `!diagnose` - Run diagnostic on Freshdesk folders\n\
             `!diagnose_kb` - Summarize the cached knowledge base\n\
             `!check_article <article_id>` - Look up a single article\n\
             `!visibility <folder_id> [level]` - Check and update folder visibility\n\
             `!refresh` - Manually refresh the knowledge base to fetch new articles\n\n\
             **Available Categories:**\n\
             {}\n\
             **Example Questions:**\n\
             • `!ask How do I process a corporate gift order?`\n\
             • `!ask What's included in the customer success training?`\n\
             • `!ask Tell me about our product specifications`\n\n\
             **Note:**\n\
             After each answer, you can provide feedback using the buttons below the response.\n\
             To check a folder's visibility, first use `!diagnose` to get folder IDs, then use `!visibility <folder_id>`",
            categories
        )
    }

    async fn refresh(&self) -> String {
        match self.assistant.refresh().await {
            Ok(report) => format!(
                "✅ Knowledge base refreshed successfully! Total articles in cache: {}",
                report.articles_cached
            ),
            Err(e) => format!("❌ Error refreshing knowledge base: {}", e),
        }
    }

    async fn diagnose(&self) -> String {
        match self.assistant.diagnose().await {
            Ok(report) => report.render(),
            Err(DeskbotError::Unauthorized) => {
                "❌ Authentication failed. Please check your Freshdesk API key.".to_string()
            }
            Err(e) => format!("❌ API access error: {}", e),
        }
    }

    async fn check_article(&self, article_id: u64) -> String {
        match self.assistant.check_article(article_id).await {
            Ok(check) => check.render(),
            Err(DeskbotError::NotFound(_)) => format!("❌ Article {} not found", article_id),
            Err(e) => format!("❌ Error checking article: {}", e),
        }
    }

    async fn visibility(&self, folder_id: u64, level: Option<FolderVisibility>) -> String {
        let level = level.unwrap_or(FolderVisibility::LoggedInUsers);
        match self.assistant.set_folder_visibility(folder_id, level).await {
            Ok(change) => format!("✅ Updated folder visibility\n{}", change.render()),
            Err(DeskbotError::NotFound(_)) => format!("❌ Folder {} not found", folder_id),
            Err(e) => format!("❌ Error updating visibility: {}", e),
        }
    }
}

/// Recover the question from an answer message's `Question: ` line.
pub fn extract_question(message_content: &str) -> String {
    QUESTION_LINE
        .captures(message_content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('\r').to_string())
        .unwrap_or_else(|| QUESTION_NOT_FOUND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::assistant_with;
    use crate::interaction_log::{InteractionStatus, SqliteInteractionLog};
    use crate::test_support::FakeCompleter;

    fn bot(answer: &str) -> (Bot, Arc<SqliteInteractionLog>) {
        let log = Arc::new(SqliteInteractionLog::in_memory(8).unwrap());
        let assistant = Arc::new(assistant_with(Arc::new(FakeCompleter::answering(answer))));
        (Bot::new(assistant, log.clone()), log)
    }

    #[test]
    fn test_extract_question() {
        assert_eq!(extract_question("Question: Where is my order?\n\nIt shipped."), "Where is my order?");
        assert_eq!(extract_question("No header here"), QUESTION_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_plain_chat_is_ignored() {
        let (bot, _) = bot("unused");
        assert_eq!(bot.handle_message("good morning").await, None);
    }

    #[tokio::test]
    async fn test_ask_replies_with_question_header_and_logs() {
        let (bot, log) = bot("Within 30 days.");
        bot.handle_message("!refresh").await.unwrap();

        let reply = bot.handle_message("!ask How long does a refund take?").await.unwrap();
        assert!(reply.feedback_controls);
        assert!(reply.content.starts_with("Question: How long does a refund take?\n\nWithin 30 days."));

        let logged = log.recent(1).await.unwrap();
        assert_eq!(logged[0].question, "How long does a refund take?");
        assert_eq!(logged[0].status, InteractionStatus::New);
    }

    #[tokio::test]
    async fn test_feedback_round_trip() {
        let (bot, log) = bot("Within 30 days.");
        let reply = bot.handle_message("!ask refund?").await.unwrap();

        let thanks = bot.handle_feedback(&reply.content, Feedback::CanImprove).await;
        assert_eq!(thanks, Feedback::CanImprove.thanks());

        let logged = log.recent(1).await.unwrap();
        assert_eq!(logged[0].status, InteractionStatus::ReviewNeeded);
        assert_eq!(logged[0].feedback, Some(Feedback::CanImprove));
    }

    #[tokio::test]
    async fn test_feedback_without_question_still_thanks() {
        let (bot, _) = bot("unused");
        let thanks = bot.handle_feedback("something else", Feedback::Accurate).await;
        assert_eq!(thanks, Feedback::Accurate.thanks());
    }

    #[tokio::test]
    async fn test_refresh_reports_cache_size() {
        let (bot, _) = bot("unused");
        let reply = bot.handle_message("!refresh").await.unwrap();
        assert_eq!(
            reply.content,
            "✅ Knowledge base refreshed successfully! Total articles in cache: 2"
        );
    }

    #[tokio::test]
    async fn test_help_lists_categories() {
        let (bot, _) = bot("unused");
        let reply = bot.handle_message("!help").await.unwrap();
        assert!(reply.content.contains("**Available Categories:**\n• Workflow\n"));
        assert!(!reply.feedback_controls);
    }

    #[tokio::test]
    async fn test_usage_errors_and_test_command() {
        let (bot, _) = bot("unused");
        assert_eq!(bot.handle_message("!test").await.unwrap().content, "Bot is working!");
        assert!(bot
            .handle_message("!check_article nope")
            .await
            .unwrap()
            .content
            .starts_with("Usage:"));
        assert_eq!(
            bot.handle_message("!check_article 999").await.unwrap().content,
            "❌ Article 999 not found"
        );
    }

    #[tokio::test]
    async fn test_visibility_defaults_to_logged_in_users() {
        let (bot, _) = bot("unused");
        let reply = bot.handle_message("!visibility 10").await.unwrap();
        assert!(reply.content.contains("all users -> logged-in users"));
    }
}
