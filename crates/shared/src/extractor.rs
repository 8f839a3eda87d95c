use crate::models::Post;

/// Format a post's question and its instructor/good/endorsed answers
pub fn extract_relevant_info(post: &Post) -> String {
    let question = post.question().unwrap_or_default();

    let answers: Vec<&str> = post
        .replies()
        .iter()
        .filter(|reply| reply.is_relevant())
        .filter_map(|reply| reply.content())
        .collect();

    format!("Question: {}\nAnswers: {}\n\n", question, answers.join(" "))
}
