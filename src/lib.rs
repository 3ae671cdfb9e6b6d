//! Deskbot - a support-desk assistant over a Freshdesk knowledge base
//!
//! Published articles from an allow-list of solution categories are cached
//! together with their embeddings. Questions are embedded, matched against the
//! cache by cosine similarity, and answered by a chat model grounded on the
//! best matches, with the source articles listed below the answer.
//!
//! # Architecture
//!
//! - `helpdesk` - Freshdesk solutions API client
//! - `embedding` - Embedding generation
//! - `knowledge_base` - Article cache, refresh and similarity search
//! - `rag` - Answer composition
//! - `assistant` - Knowledge base plus composer, wired from settings
//! - `interaction_log` - Question/answer log with feedback
//! - `bot` - `!command` chat front end
//! - `diagnostics` - Helpdesk and cache inspection
//!
//! # Example
//!
//! ```rust,no_run
//! use deskbot::assistant::Assistant;
//! use deskbot::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let assistant = Assistant::from_settings(&settings)?;
//!
//!     let report = assistant.refresh().await?;
//!     println!("Cached {} articles", report.articles_cached);
//!
//!     let answer = assistant.ask("How do I process a corporate gift order?").await;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod bot;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod embedding;
pub mod error;
pub mod helpdesk;
pub mod interaction_log;
pub mod knowledge_base;
pub mod openai;
pub mod rag;

#[cfg(test)]
mod test_support;

pub use error::{DeskbotError, Result};
