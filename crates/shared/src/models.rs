use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One revision of a post or reply. Piazza returns these newest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// A reply attached to a post (student/instructor answer or followup)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub tag_good: Option<Value>,
    #[serde(default)]
    pub tag_good_arr: Option<Value>,
    #[serde(default)]
    pub tag_endorse: Option<Value>,
}

impl Reply {
    pub fn is_instructor(&self) -> bool {
        matches!(self.kind.as_str(), "i" | "i_answer")
    }

    pub fn is_good(&self) -> bool {
        self.tag_good.as_ref().is_some_and(is_truthy)
            || self.tag_good_arr.as_ref().is_some_and(is_truthy)
    }

    pub fn is_endorsed(&self) -> bool {
        self.tag_endorse.as_ref().is_some_and(is_truthy)
    }

    /// Instructor-authored, tagged good, or endorsed
    pub fn is_relevant(&self) -> bool {
        self.is_instructor() || self.is_good() || self.is_endorsed()
    }

    pub fn content(&self) -> Option<&str> {
        self.history.first().map(|h| h.content.as_str())
    }
}

/// A top-level question thread
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub nr: Option<u64>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub children: Option<Vec<Reply>>,
}

impl Post {
    /// Content of the first history entry, if the post has one
    pub fn question(&self) -> Option<&str> {
        self.history
            .as_ref()
            .and_then(|h| h.first())
            .map(|h| h.content.as_str())
    }

    pub fn replies(&self) -> &[Reply] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Entry in a network's feed; only the id is needed to fetch the full post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub feed: Vec<FeedItem>,
}

// Tags arrive as arrays of users, ids, or occasionally booleans
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
