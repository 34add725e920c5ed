//! Typed gateway to the saysome contract.

pub mod abi;
pub mod events;

use crate::error::{Result, SaysError};
use crate::tweet::Comment;
use crate::wallet::provider::ProviderHandle;
use crate::wallet::Connection;
use abi::ISaysome;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use events::{EventCallback, EventSubscription};
use futures::future::try_join_all;
use std::time::Duration;

/// One page of messages as parallel arrays, the shape `getTweets` returns.
/// `comments[i]` belongs to `ids[i]`. Timestamps are milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TweetPage {
    pub ids: Vec<String>,
    pub authors: Vec<String>,
    pub contents: Vec<String>,
    pub timestamps: Vec<i64>,
    pub likes: Vec<u64>,
    pub dislikes: Vec<u64>,
    pub comments: Vec<Vec<Comment>>,
}

impl TweetPage {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All arrays must describe the same number of messages.
    pub fn is_consistent(&self) -> bool {
        let n = self.ids.len();
        self.authors.len() == n
            && self.contents.len() == n
            && self.timestamps.len() == n
            && self.likes.len() == n
            && self.dislikes.len() == n
            && self.comments.len() == n
    }
}

/// What the feed needs from the contract. Writes return once the
/// transaction is confirmed.
#[async_trait]
pub trait TweetContract: Send + Sync {
    async fn tweet_count(&self) -> Result<u64>;

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<TweetPage>;

    async fn create(&self, content: &str) -> Result<B256>;

    async fn like(&self, id: &str) -> Result<B256>;

    async fn dislike(&self, id: &str) -> Result<B256>;

    async fn add_comment(&self, id: &str, content: &str) -> Result<B256>;
}

/// Parses a configured contract address. Mixed-case input must carry a valid
/// EIP-55 checksum.
pub fn parse_contract_address(raw: &str) -> Result<Address> {
    let s = raw.trim();
    let invalid = || SaysError::InvalidContractAddress(raw.to_string());

    let body = s.strip_prefix("0x").ok_or_else(invalid)?;
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());

    if has_upper && has_lower {
        Address::parse_checksummed(s, None).map_err(|_| invalid())
    } else {
        s.parse::<Address>().map_err(|_| invalid())
    }
}

pub fn is_zero_address(raw: &str) -> bool {
    matches!(parse_contract_address(raw), Ok(a) if a == Address::ZERO)
}

fn parse_tweet_id(id: &str) -> Result<U256> {
    id.parse::<U256>()
        .map_err(|_| SaysError::TransactionFailed(format!("invalid tweet id '{id}'")))
}

fn to_u64(v: U256) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

/// Contract timestamps are seconds.
fn to_millis(secs: U256) -> i64 {
    i64::try_from(to_u64(secs))
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}

pub struct ContractGateway {
    provider: ProviderHandle,
    signer: Address,
    address: Address,
    confirmation_poll: Duration,
}

impl ContractGateway {
    /// Binds the contract at `configured` to the connected account. Calling it
    /// again for the same connection yields an equivalent gateway.
    pub fn connect(
        connection: &Connection,
        configured: &str,
        confirmation_poll: Duration,
    ) -> Result<Self> {
        let address = parse_contract_address(configured)?;
        log::info!(
            "contract gateway bound to {} for signer {}",
            address,
            connection.address
        );
        Ok(Self {
            provider: connection.provider.clone(),
            signer: connection.address,
            address,
            confirmation_poll,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    /// Starts delivering the four contract events to `on_event`.
    pub fn subscribe(&self, interval: Duration, on_event: EventCallback) -> EventSubscription {
        EventSubscription::spawn(self.provider.clone(), self.address, interval, on_event)
    }

    async fn read<C: SolCall + Send>(&self, call: C) -> Result<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let out = self
            .provider
            .call(self.address, data)
            .await
            .map_err(SaysError::into_read)?;
        C::abi_decode_returns(&out, true)
            .map_err(|e| SaysError::ReadFailed(format!("{}: {}", C::SIGNATURE, e)))
    }

    /// Submits and waits for the receipt. There is no timeout: a transaction
    /// that never lands keeps the caller waiting.
    async fn write<C: SolCall + Send>(&self, call: C) -> Result<B256> {
        let data = Bytes::from(call.abi_encode());
        let hash = self
            .provider
            .send_transaction(self.signer, self.address, data)
            .await
            .map_err(SaysError::into_transaction)?;
        log::info!("{} submitted: {}", C::SIGNATURE, hash);

        loop {
            let receipt = self
                .provider
                .transaction_receipt(hash)
                .await
                .map_err(SaysError::into_transaction)?;
            match receipt {
                Some(r) if r.succeeded() => {
                    log::info!("{} confirmed: {}", C::SIGNATURE, hash);
                    return Ok(hash);
                }
                Some(_) => {
                    log::warn!("{} reverted: {}", C::SIGNATURE, hash);
                    return Err(SaysError::TransactionFailed(format!(
                        "transaction {hash} reverted"
                    )));
                }
                None => tokio::time::sleep(self.confirmation_poll).await,
            }
        }
    }

    async fn comments_for(&self, tweet_id: U256) -> Result<Vec<Comment>> {
        let ids = self
            .read(ISaysome::getTweetCommentsCall { tweetId: tweet_id })
            .await?
            ._0;

        let reads = ids.into_iter().map(|comment_id| async move {
            let c = self
                .read(ISaysome::getCommentCall {
                    commentId: comment_id,
                })
                .await?;
            Ok::<_, SaysError>(Comment {
                id: c.id.to_string(),
                content: c.content,
                author: c.author.to_checksum(None),
                timestamp: to_millis(c.timestamp),
            })
        });
        // Results come back in the order the contract lists the ids.
        try_join_all(reads).await
    }
}

#[async_trait]
impl TweetContract for ContractGateway {
    async fn tweet_count(&self) -> Result<u64> {
        let count = self.read(ISaysome::getTweetCountCall {}).await?._0;
        Ok(to_u64(count))
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<TweetPage> {
        let raw = self
            .read(ISaysome::getTweetsCall {
                offset: U256::from(offset),
                limit: U256::from(limit),
            })
            .await?;

        let comments = try_join_all(raw.ids.iter().map(|id| self.comments_for(*id))).await?;

        let page = TweetPage {
            ids: raw.ids.iter().map(|id| id.to_string()).collect(),
            authors: raw.authors.iter().map(|a| a.to_checksum(None)).collect(),
            contents: raw.contents,
            timestamps: raw.timestamps.into_iter().map(to_millis).collect(),
            likes: raw.likes.into_iter().map(to_u64).collect(),
            dislikes: raw.dislikes.into_iter().map(to_u64).collect(),
            comments,
        };
        if !page.is_consistent() {
            return Err(SaysError::ReadFailed(
                "getTweets returned arrays of different lengths".to_string(),
            ));
        }
        log::debug!("fetched {} tweets at offset {}", page.len(), offset);
        Ok(page)
    }

    async fn create(&self, content: &str) -> Result<B256> {
        self.write(ISaysome::createTweetCall {
            content: content.to_string(),
        })
        .await
    }

    async fn like(&self, id: &str) -> Result<B256> {
        let tweet_id = parse_tweet_id(id)?;
        self.write(ISaysome::likeTweetCall { tweetId: tweet_id }).await
    }

    async fn dislike(&self, id: &str) -> Result<B256> {
        let tweet_id = parse_tweet_id(id)?;
        self.write(ISaysome::dislikeTweetCall { tweetId: tweet_id })
            .await
    }

    async fn add_comment(&self, id: &str, content: &str) -> Result<B256> {
        let tweet_id = parse_tweet_id(id)?;
        self.write(ISaysome::addCommentCall {
            tweetId: tweet_id,
            content: content.to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::provider::{Log, LogFilter, TransactionReceipt, WalletProvider};
    use alloy_primitives::U64;
    use alloy_sol_types::SolValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Answers contract reads from fixed data and records submitted writes.
    #[derive(Default)]
    struct ChainDouble {
        sent: Mutex<Vec<Bytes>>,
        receipt_polls: AtomicUsize,
        revert: bool,
    }

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[async_trait]
    impl WalletProvider for ChainDouble {
        async fn request_accounts(&self) -> Result<Vec<Address>> {
            Ok(vec![addr(0xa1)])
        }
        async fn accounts(&self) -> Result<Vec<Address>> {
            Ok(vec![addr(0xa1)])
        }
        async fn chain_id(&self) -> Result<u64> {
            Ok(31337)
        }
        async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
            let selector: [u8; 4] = data[..4].try_into().unwrap();
            let encoded = if selector == ISaysome::getTweetsCall::SELECTOR {
                (
                    vec![U256::from(1), U256::from(2)],
                    vec![addr(0x11), addr(0x22)],
                    vec!["first".to_string(), "second".to_string()],
                    vec![U256::from(1_700_000_000u64), U256::from(1_700_000_060u64)],
                    vec![U256::from(3), U256::from(0)],
                    vec![U256::from(1), U256::from(2)],
                )
                    .abi_encode_params()
            } else if selector == ISaysome::getTweetCommentsCall::SELECTOR {
                let call = ISaysome::getTweetCommentsCall::abi_decode(&data, true).unwrap();
                if call.tweetId == U256::from(1) {
                    vec![U256::from(7)].abi_encode()
                } else {
                    Vec::<U256>::new().abi_encode()
                }
            } else if selector == ISaysome::getCommentCall::SELECTOR {
                (
                    U256::from(7),
                    addr(0x33),
                    "nice".to_string(),
                    U256::from(1_700_000_030u64),
                )
                    .abi_encode_params()
            } else if selector == ISaysome::getTweetCountCall::SELECTOR {
                U256::from(2).abi_encode()
            } else {
                panic!("unexpected call");
            };
            Ok(Bytes::from(encoded))
        }
        async fn send_transaction(&self, from: Address, _to: Address, data: Bytes) -> Result<B256> {
            assert_eq!(from, addr(0xa1));
            self.sent.lock().unwrap().push(data);
            Ok(B256::repeat_byte(0x42))
        }
        async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
            // pending on the first poll
            if self.receipt_polls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(None);
            }
            Ok(Some(TransactionReceipt {
                transaction_hash: hash,
                status: Some(if self.revert { U64::ZERO } else { U64::from(1) }),
                block_number: Some(U64::from(10)),
            }))
        }
        async fn block_number(&self) -> Result<u64> {
            Ok(10)
        }
        async fn logs(&self, _: &LogFilter) -> Result<Vec<Log>> {
            Ok(Vec::new())
        }
    }

    fn gateway(chain: Arc<ChainDouble>) -> ContractGateway {
        let connection = Connection {
            address: addr(0xa1),
            provider: chain,
        };
        ContractGateway::connect(
            &connection,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            Duration::from_millis(1),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_contract_address() {
        assert!(parse_contract_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").is_ok());
        assert!(parse_contract_address("0x5fbdb2315678afecb367f032d93f642f64180aa3").is_ok());
        // broken checksum
        assert!(parse_contract_address("0x5FbDB2315678afecb367f032d93F642f64180aA3").is_err());
        assert!(parse_contract_address("0x").is_err());
        assert!(parse_contract_address("5fbdb2315678afecb367f032d93f642f64180aa3").is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(is_zero_address("0x0000000000000000000000000000000000000000"));
        assert!(!is_zero_address("0x5fbdb2315678afecb367f032d93f642f64180aa3"));
        assert!(!is_zero_address("0x"));
    }

    #[test]
    fn test_malformed_address_fails_connect() {
        let connection = Connection {
            address: addr(0xa1),
            provider: Arc::new(ChainDouble::default()),
        };
        let result = ContractGateway::connect(&connection, "0x1234", Duration::from_millis(1));
        assert!(matches!(result, Err(SaysError::InvalidContractAddress(_))));
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(to_millis(U256::from(1_700_000_000u64)), 1_700_000_000_000);
        assert_eq!(to_millis(U256::MAX), i64::MAX);
    }

    #[tokio::test]
    async fn test_fetch_page_resolves_comments() {
        let gw = gateway(Arc::new(ChainDouble::default()));
        let page = gw.fetch_page(0, 10).await.unwrap();

        assert!(page.is_consistent());
        assert_eq!(page.ids, vec!["1", "2"]);
        assert_eq!(page.contents, vec!["first", "second"]);
        assert_eq!(page.timestamps, vec![1_700_000_000_000, 1_700_000_060_000]);
        assert_eq!(page.likes, vec![3, 0]);
        assert_eq!(page.dislikes, vec![1, 2]);
        assert_eq!(page.comments[0].len(), 1);
        assert_eq!(page.comments[0][0].id, "7");
        assert_eq!(page.comments[0][0].content, "nice");
        assert_eq!(page.comments[0][0].timestamp, 1_700_000_030_000);
        assert!(page.comments[1].is_empty());
    }

    #[tokio::test]
    async fn test_tweet_count() {
        let gw = gateway(Arc::new(ChainDouble::default()));
        assert_eq!(gw.tweet_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_like_waits_for_receipt() {
        let chain = Arc::new(ChainDouble::default());
        let gw = gateway(chain.clone());
        let hash = gw.like("1").await.unwrap();

        assert_eq!(hash, B256::repeat_byte(0x42));
        assert_eq!(chain.receipt_polls.load(Ordering::SeqCst), 2);
        let sent = chain.sent.lock().unwrap();
        let call = ISaysome::likeTweetCall::abi_decode(&sent[0], true).unwrap();
        assert_eq!(call.tweetId, U256::from(1));
    }

    #[tokio::test]
    async fn test_reverted_transaction_is_failure() {
        let chain = Arc::new(ChainDouble {
            revert: true,
            ..Default::default()
        });
        let gw = gateway(chain);
        let err = gw.add_comment("1", "hello").await.unwrap_err();
        assert!(matches!(err, SaysError::TransactionFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_submitted() {
        let chain = Arc::new(ChainDouble::default());
        let gw = gateway(chain.clone());
        assert!(gw.dislike("not-a-number").await.is_err());
        assert!(chain.sent.lock().unwrap().is_empty());
    }
}
