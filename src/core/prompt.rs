use crate::config::TextbookSettings;
use crate::domain::model::{ChatMessage, TextbookPage};

pub const SYSTEM_PROMPT: &str = "You are helpful and accurate.";

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    title: String,
    subject: String,
}

impl PromptBuilder {
    pub fn new(settings: &TextbookSettings) -> Self {
        Self {
            title: settings.title.clone(),
            subject: settings.subject.clone(),
        }
    }

    /// Asks the model for a passage that reads like it came from the textbook.
    pub fn hypothetical_passage(&self, query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Respond with something that sounds like it could be found within the {} textbook \"{}\" that would answer the following question:\n\n{}",
                self.subject, self.title, query
            )),
        ]
    }

    pub fn answer(&self, query: &str, pages: &[TextbookPage]) -> Vec<ChatMessage> {
        let context = pages
            .iter()
            .map(|page| format!("Page number: {}\nContent: {}", page.page_number, page.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Some relevant information from the {subject} textbook \"{title}\":\n\n{context}\n\nUse this information to answer a question in depth that a user has just asked you:\n\n{query}\n\nCite specific pages from the textbook. Be very specific in order to help the user achieve a comprehensive understanding of {subject}.",
                subject = self.subject,
                title = self.title,
                context = context,
                query = query,
            )),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(&TextbookSettings::default())
    }

    #[test]
    fn test_hypothetical_passage_prompt() {
        let messages = builder().hypothetical_passage("What is a z-score?");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert!(messages[1].content.starts_with(
            "Respond with something that sounds like it could be found within the statistics / sociology textbook \"Social Statistics for a Diverse Society\""
        ));
        assert!(messages[1].content.ends_with("question:\n\nWhat is a z-score?"));
    }

    #[test]
    fn test_answer_prompt_renders_pages_in_order() {
        let pages = vec![
            TextbookPage {
                page_number: 212,
                word_count: 2,
                text: "Confidence level".to_string(),
            },
            TextbookPage {
                page_number: 97,
                word_count: 2,
                text: "Sampling distribution".to_string(),
            },
        ];

        let messages = builder().answer("Why 95%?", &pages);
        let content = &messages[1].content;

        assert!(content.contains(
            "Page number: 212\nContent: Confidence level\n\nPage number: 97\nContent: Sampling distribution"
        ));
        assert!(content.contains("has just asked you:\n\nWhy 95%?\n\nCite specific pages"));
        assert!(content.ends_with("comprehensive understanding of statistics / sociology."));
    }
}
