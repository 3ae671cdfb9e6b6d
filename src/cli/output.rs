//! CLI output formatting utilities.

use crate::knowledge_base::{RefreshReport, RelevantArticle};
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

    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a retrieved article.
    pub fn article(article: &RelevantArticle) {
        println!(
            "\n{} {} ({} > {}, score: {:.2})",
            style(">>").green(),
            style(&article.title).bold(),
            article.category,
            article.folder,
            article.score
        );
        println!("   {}", content_preview(&article.content, 200));
        println!("   {}", style(&article.url).dim());
    }

    /// Print the counters of a refresh.
    pub fn refresh_report(report: &RefreshReport) {
        Output::kv("Articles cached", &report.articles_cached.to_string());
        Output::kv("Categories visited", &report.categories_visited.to_string());
        Output::kv("Categories skipped", &report.categories_skipped.to_string());
        Output::kv("Folders visited", &report.folders_visited.to_string());
        Output::kv("Unpublished skipped", &report.unpublished_skipped.to_string());
        Output::kv("Duplicates skipped", &report.duplicates_skipped.to_string());
        if report.failures > 0 {
            Output::warning(&format!(
                "{} folder or article request(s) failed; see logs with -v",
                report.failures
            ));
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

/// Collapse newlines and truncate with an ellipsis on a char boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
