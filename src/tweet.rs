use serde::{Deserialize, Serialize};

/// Longest message the composition form accepts, in characters.
pub const MAX_TWEET_LEN: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// A message as shown in the feed, assembled from raw contract records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: String,
    pub content: String,
    pub author: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments: Vec<Comment>,
}

impl Tweet {
    /// Two-letter avatar initials taken from the address body (`0xAB...` -> `AB`).
    pub fn initials(&self) -> String {
        self.author.chars().skip(2).take(2).collect::<String>().to_uppercase()
    }

    /// Palette slot for the avatar; non-numeric ids fall back to slot 0.
    pub fn avatar_slot(&self) -> usize {
        self.id.parse::<u64>().map(|n| (n % 4) as usize).unwrap_or(0)
    }
}

/// `0x1234...abcd` form used by the navbar and tweet cards.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Whether `content` may be submitted as a message or comment body.
pub fn is_valid_content(content: &str) -> bool {
    !content.trim().is_empty() && content.chars().count() <= MAX_TWEET_LEN
}
