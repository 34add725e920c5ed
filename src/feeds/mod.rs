pub mod assembler;
pub mod demo;
pub mod filter;

use crate::contract::{TweetContract, TweetPage};
use crate::error::{Result, SaysError};
use crate::tweet::Tweet;
use std::sync::Arc;

pub use assembler::FeedAssembler;
pub use filter::{SortOrder, TimeWindow};

/// Where the feed's records come from.
#[derive(Clone)]
pub enum FeedSource {
    /// Zero address configured: sample data, local-only writes.
    Demo,
    /// A contract is configured but no gateway exists yet (no wallet).
    Pending,
    Contract(Arc<dyn TweetContract>),
}

impl FeedSource {
    pub fn is_demo(&self) -> bool {
        matches!(self, FeedSource::Demo)
    }

    /// One page from the contract, or `None` in demo mode where the records
    /// live only in memory.
    pub async fn fetch(&self, batch_size: u64) -> Result<Option<Vec<Tweet>>> {
        match self {
            FeedSource::Demo => Ok(None),
            FeedSource::Pending => Err(SaysError::ContractUninitialized),
            FeedSource::Contract(contract) => {
                let page = contract.fetch_page(0, batch_size).await?;
                Ok(Some(build_tweets(page)))
            }
        }
    }

    /// Sends a write to the contract and waits for confirmation. Demo mode
    /// accepts every write without leaving the process.
    pub async fn submit(&self, write: &Write) -> Result<()> {
        let contract = match self {
            FeedSource::Demo => return Ok(()),
            FeedSource::Pending => return Err(SaysError::ContractUninitialized),
            FeedSource::Contract(contract) => contract,
        };
        match write {
            Write::Create(content) => contract.create(content).await?,
            Write::Like(id) => contract.like(id).await?,
            Write::Dislike(id) => contract.dislike(id).await?,
            Write::Comment { tweet_id, content } => contract.add_comment(tweet_id, content).await?,
        };
        Ok(())
    }
}

/// A user action that changes contract state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Create(String),
    Like(String),
    Dislike(String),
    Comment { tweet_id: String, content: String },
}

impl Write {
    /// Toast description once the write went through.
    pub fn success_message(&self) -> &'static str {
        match self {
            Write::Create(_) => "Your say has been posted to the blockchain!",
            Write::Like(_) => "You liked the say!",
            Write::Dislike(_) => "You disliked the say!",
            Write::Comment { .. } => "Your comment has been posted!",
        }
    }

    /// Toast shown while waiting on the wallet, for writes that announce themselves.
    pub fn pending_message(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Write::Create(_) => Some((
                "Posting Say",
                "Please confirm the transaction in your wallet...",
            )),
            Write::Comment { .. } => Some((
                "Posting Comment",
                "Please confirm the transaction in your wallet...",
            )),
            Write::Like(_) | Write::Dislike(_) => None,
        }
    }
}

/// How the feed catches up after a confirmed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Local state already reflects the write.
    Done,
    /// Structure changed; reload to pick up contract-assigned ids.
    Refresh,
}

/// Zips the parallel page arrays into view-model entities.
pub fn build_tweets(page: TweetPage) -> Vec<Tweet> {
    let TweetPage {
        ids,
        authors,
        contents,
        timestamps,
        likes,
        dislikes,
        comments,
    } = page;

    ids.into_iter()
        .zip(authors)
        .zip(contents)
        .zip(timestamps)
        .zip(likes.into_iter().zip(dislikes))
        .zip(comments)
        .map(
            |(((((id, author), content), timestamp), (likes, dislikes)), comments)| Tweet {
                id,
                content,
                author,
                timestamp,
                likes,
                dislikes,
                comments,
            },
        )
        .collect()
}
