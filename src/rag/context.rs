//! Grounding context and source formatting for answers.

use crate::knowledge_base::RelevantArticle;

/// Format relevant articles as the knowledge base block of a prompt.
pub fn format_context_for_prompt(articles: &[RelevantArticle]) -> String {
    let mut context = String::from("Information from our knowledge base:\n\n");
    for article in articles {
        context.push_str(&format!("Article: {}\n", article.title));
        context.push_str(&format!("Category: {} > {}\n", article.category, article.folder));
        context.push_str(&format!("Content: {}\n\n", article.content));
    }
    context
}

/// Markdown footer linking every source article, in the given order.
pub fn format_sources(articles: &[RelevantArticle]) -> String {
    let mut footer = String::from("\n\n**Sources:**\n");
    for article in articles {
        footer.push_str(&format!(
            "• [{}]({}) - {}\n",
            article.title, article.url, article.category
        ));
    }
    footer
}

/// Reply used when no article clears the relevance floor.
pub fn no_information_message(categories: &[String]) -> String {
    let mut message = String::from(
        "I couldn't find any relevant information in our knowledge base. Please try:\n\
         • Rephrasing your question\n\
         • Being more specific\n\
         • Asking about a different topic\n\n\
         Available categories:",
    );
    for category in categories {
        message.push_str(&format!("\n• {}", category));
    }
    message
}
