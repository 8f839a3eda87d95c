use crate::extractor::extract_relevant_info;
use crate::models::Post;

/// Input limit for the summarization model, in characters
pub const MAX_INPUT_CHARS: usize = 4096;

#[derive(Debug, Clone)]
pub struct Aggregated {
    pub text: String,
    pub truncated: bool,
}

/// Join every post's extracted text in fetch order, hard-cut to `max_chars` characters
pub fn aggregate(posts: &[Post], max_chars: usize) -> Aggregated {
    let all_text = posts
        .iter()
        .map(extract_relevant_info)
        .collect::<Vec<_>>()
        .join("\n");

    match truncate_chars(&all_text, max_chars) {
        Some(cut) => {
            eprintln!("⚠️ Text too long, truncating...");
            Aggregated {
                text: cut.to_string(),
                truncated: true,
            }
        }
        None => Aggregated {
            text: all_text,
            truncated: false,
        },
    }
}

/// Prefix of `text` holding exactly `max_chars` characters, or None if it already fits
fn truncate_chars(text: &str, max_chars: usize) -> Option<&str> {
    text.char_indices()
        .nth(max_chars)
        .map(|(byte_index, _)| &text[..byte_index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryEntry;

    fn post(id: &str, question: &str) -> Post {
        Post {
            id: id.to_string(),
            history: Some(vec![HistoryEntry {
                content: question.to_string(),
                subject: None,
            }]),
            ..Default::default()
        }
    }

    fn unbounded(posts: &[Post]) -> String {
        aggregate(posts, usize::MAX).text
    }

    #[test]
    fn test_short_text_is_unchanged() {
        let posts = vec![post("a", "When is lab due?"), post("b", "Is lecture recorded?")];

        let result = aggregate(&posts, MAX_INPUT_CHARS);

        assert!(!result.truncated);
        assert_eq!(
            result.text,
            "Question: When is lab due?\nAnswers: \n\n\nQuestion: Is lecture recorded?\nAnswers: \n\n"
        );
    }

    #[test]
    fn test_long_text_is_cut_to_exact_prefix() {
        let posts: Vec<Post> = (0..40)
            .map(|i| post(&i.to_string(), &"word ".repeat(30)))
            .collect();
        let full = unbounded(&posts);
        assert!(full.chars().count() > MAX_INPUT_CHARS);

        let result = aggregate(&posts, MAX_INPUT_CHARS);

        assert!(result.truncated);
        assert_eq!(result.text.chars().count(), MAX_INPUT_CHARS);
        assert!(full.starts_with(&result.text));
    }

    #[test]
    fn test_exactly_at_limit_is_not_truncated() {
        let posts = vec![post("a", "abc")];
        let full = unbounded(&posts);
        let limit = full.chars().count();

        let result = aggregate(&posts, limit);

        assert!(!result.truncated);
        assert_eq!(result.text, full);
    }

    #[test]
    fn test_truncation_respects_multibyte_characters() {
        assert_eq!(truncate_chars("héllo wörld", 7), Some("héllo w"));
        assert_eq!(truncate_chars("日本語", 2), Some("日本"));
        assert_eq!(truncate_chars("日本語", 3), None);
    }

    #[test]
    fn test_no_posts_yields_empty_text() {
        let result = aggregate(&[], MAX_INPUT_CHARS);
        assert!(result.text.is_empty());
        assert!(!result.truncated);
    }
}
