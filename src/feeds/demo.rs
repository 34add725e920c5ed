//! Sample says served when no contract is deployed (zero address configured).

use crate::tweet::{Comment, Tweet};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Three example messages timestamped relative to `now_ms`. Messages "1" and
/// "3" are attributed to `viewer` when a wallet is connected.
pub fn sample_tweets(viewer: Option<&str>, now_ms: i64) -> Vec<Tweet> {
    let own = viewer.unwrap_or("0x1234...5678").to_string();

    vec![
        Tweet {
            id: "1".to_string(),
            content: "Just deployed my first smart contract! #blockchain #ethereum".to_string(),
            author: own.clone(),
            timestamp: now_ms - HOUR_MS,
            likes: 5,
            dislikes: 1,
            comments: vec![Comment {
                id: "1".to_string(),
                content: "Congrats!".to_string(),
                author: "0xabcd...efgh".to_string(),
                timestamp: now_ms - 30 * MINUTE_MS,
            }],
        },
        Tweet {
            id: "2".to_string(),
            content: "Web3 is the future of the internet. Decentralization will change everything."
                .to_string(),
            author: "0x8765...4321".to_string(),
            timestamp: now_ms - DAY_MS,
            likes: 10,
            dislikes: 2,
            comments: Vec::new(),
        },
        Tweet {
            id: "3".to_string(),
            content:
                "Learning Solidity has been a great experience so far. Any resources you'd recommend?"
                    .to_string(),
            author: own,
            timestamp: now_ms - 7 * DAY_MS,
            likes: 8,
            dislikes: 0,
            comments: vec![Comment {
                id: "2".to_string(),
                content: "Check out CryptoZombies!".to_string(),
                author: "0x9876...5432".to_string(),
                timestamp: now_ms - 6 * DAY_MS,
            }],
        },
    ]
}
