use super::abi::ISaysome;
use crate::wallet::provider::{LogFilter, ProviderHandle};
use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractEvent {
    TweetCreated,
    TweetLiked,
    TweetDisliked,
    CommentAdded,
}

impl ContractEvent {
    pub const ALL: [ContractEvent; 4] = [
        ContractEvent::TweetCreated,
        ContractEvent::TweetLiked,
        ContractEvent::TweetDisliked,
        ContractEvent::CommentAdded,
    ];

    pub fn topic(self) -> B256 {
        match self {
            ContractEvent::TweetCreated => ISaysome::TweetCreated::SIGNATURE_HASH,
            ContractEvent::TweetLiked => ISaysome::TweetLiked::SIGNATURE_HASH,
            ContractEvent::TweetDisliked => ISaysome::TweetDisliked::SIGNATURE_HASH,
            ContractEvent::CommentAdded => ISaysome::CommentAdded::SIGNATURE_HASH,
        }
    }

    pub fn from_topic(topic: &B256) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.topic() == *topic)
    }
}

pub type EventCallback = Arc<dyn Fn(ContractEvent) + Send + Sync>;

/// Live subscription to the four contract events. Closing (or dropping) it
/// unsubscribes from all of them.
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    pub fn spawn(
        provider: ProviderHandle,
        contract: Address,
        interval: Duration,
        on_event: EventCallback,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut last_block = loop {
                match provider.block_number().await {
                    Ok(n) => break n,
                    Err(e) => {
                        log::warn!("event subscription: block number unavailable: {e}");
                        tokio::time::sleep(interval).await;
                    }
                }
            };
            log::info!("subscribed to contract events at {contract} from block {last_block}");

            loop {
                tokio::time::sleep(interval).await;

                let latest = match provider.block_number().await {
                    Ok(n) => n,
                    Err(e) => {
                        log::debug!("event poll: {e}");
                        continue;
                    }
                };
                if latest <= last_block {
                    continue;
                }

                let filter = LogFilter {
                    address: contract,
                    topics: ContractEvent::ALL.iter().map(|e| e.topic()).collect(),
                    from_block: last_block + 1,
                    to_block: latest,
                };
                match provider.logs(&filter).await {
                    Ok(logs) => {
                        for entry in logs {
                            if let Some(event) =
                                entry.topics.first().and_then(ContractEvent::from_topic)
                            {
                                log::debug!("contract event {event:?}");
                                on_event(event);
                            }
                        }
                        last_block = latest;
                    }
                    Err(e) => log::warn!("event poll failed for blocks {}..={latest}: {e}", last_block + 1),
                }
            }
        });

        Self { task }
    }

    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
