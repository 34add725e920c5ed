use super::provider::ProviderHandle;
use super::WalletEvent;
use alloy_primitives::Address;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Background poller that turns account and network changes on the provider
/// into [`WalletEvent`]s. Stops when closed or dropped.
pub struct WalletWatcher {
    task: JoinHandle<()>,
}

impl WalletWatcher {
    pub fn spawn(
        provider: ProviderHandle,
        interval: Duration,
        tx: UnboundedSender<WalletEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut last_accounts: Option<Vec<Address>> = None;
            let mut last_chain: Option<u64> = None;

            loop {
                match provider.accounts().await {
                    Ok(accounts) => {
                        if let Some(event) = diff_accounts(&mut last_accounts, accounts) {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => log::debug!("wallet watcher: accounts poll failed: {e}"),
                }

                match provider.chain_id().await {
                    Ok(chain) => {
                        if let Some(event) = diff_chain(&mut last_chain, chain) {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => log::debug!("wallet watcher: chain poll failed: {e}"),
                }

                tokio::time::sleep(interval).await;
            }
            log::debug!("wallet watcher stopped");
        });

        Self { task }
    }

    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for WalletWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The first observation only primes the baseline.
fn diff_accounts(last: &mut Option<Vec<Address>>, current: Vec<Address>) -> Option<WalletEvent> {
    match last.replace(current.clone()) {
        Some(previous) if previous != current => Some(WalletEvent::AccountsChanged(current)),
        _ => None,
    }
}

fn diff_chain(last: &mut Option<u64>, current: u64) -> Option<WalletEvent> {
    match last.replace(current) {
        Some(previous) if previous != current => Some(WalletEvent::ChainChanged(current)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::provider::scripted::ScriptedProvider;
    use std::sync::Arc;
    use tokio::sync::mpsc::unbounded_channel;

    const INTERVAL: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_watcher_reports_each_change_once() {
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let provider = Arc::new(ScriptedProvider::default());
        provider.set_accounts(vec![alice]);
        provider.set_chain(31337);

        let (tx, mut rx) = unbounded_channel();
        let watcher = WalletWatcher::spawn(provider.clone(), INTERVAL, tx);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());

        provider.set_accounts(vec![bob]);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(rx.try_recv().unwrap(), WalletEvent::AccountsChanged(vec![bob]));
        assert!(rx.try_recv().is_err());

        provider.set_chain(1);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(rx.try_recv().unwrap(), WalletEvent::ChainChanged(1));

        tokio::time::sleep(INTERVAL * 3).await;
        assert!(rx.try_recv().is_err());

        watcher.close();
        provider.set_accounts(Vec::new());
        tokio::time::sleep(INTERVAL * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_first_accounts_poll_is_silent() {
        let mut last = None;
        assert!(diff_accounts(&mut last, vec![Address::ZERO]).is_none());
        assert!(diff_accounts(&mut last, vec![Address::ZERO]).is_none());
    }

    #[test]
    fn test_accounts_change_is_reported() {
        let mut last = Some(vec![Address::ZERO]);
        let other = Address::repeat_byte(0x11);
        match diff_accounts(&mut last, vec![other]) {
            Some(WalletEvent::AccountsChanged(accounts)) => assert_eq!(accounts, vec![other]),
            e => panic!("unexpected {e:?}"),
        }
        assert!(matches!(
            diff_accounts(&mut last, vec![]),
            Some(WalletEvent::AccountsChanged(ref a)) if a.is_empty()
        ));
    }

    #[test]
    fn test_chain_change_is_reported() {
        let mut last = None;
        assert!(diff_chain(&mut last, 1).is_none());
        assert!(diff_chain(&mut last, 1).is_none());
        assert!(matches!(
            diff_chain(&mut last, 5),
            Some(WalletEvent::ChainChanged(5))
        ));
    }
}
