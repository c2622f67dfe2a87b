//! Comment classifier: decides whether a comment body is an endorsement or
//! disapproval vote. Anything that is neither never reaches the store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteKind {
    Good,
    Bad,
}

impl VoteKind {
    /// Single-char code used in the votes table.
    pub fn code(&self) -> &'static str {
        match self {
            VoteKind::Good => "G",
            VoteKind::Bad => "B",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "G" => Some(VoteKind::Good),
            "B" => Some(VoteKind::Bad),
            _ => None,
        }
    }
}

/// Classify a comment body. The phrase must appear at the very start of the
/// text, case-insensitive; trailing text is ignored ("good bot!!" counts,
/// "what a good bot" does not).
pub fn classify(body: &str) -> Option<VoteKind> {
    let head: String = body.chars().take(8).collect::<String>().to_lowercase();
    if head.starts_with("good bot") {
        Some(VoteKind::Good)
    } else if head.starts_with("bad bot") {
        Some(VoteKind::Bad)
    } else {
        None
    }
}
