//! Wallet session: who is connected, through which provider.
//!
//! One [`WalletSession`] is created at startup and passed to whoever needs it.
//! Observers follow changes through [`WalletSession::subscribe`].

pub mod provider;
pub mod rpc;
pub mod watcher;

use crate::error::{Result, SaysError, USER_REJECTED};
use alloy_primitives::Address;
use provider::{ProviderHandle, WalletDiscovery};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Notifications pushed by the wallet itself.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// What the owner of the session must do after a [`WalletEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    Unchanged,
    Updated,
    Cleared,
    /// Network switched; contract bindings are stale and the app must reload.
    Reload,
}

#[derive(Clone)]
pub struct Connection {
    pub address: Address,
    pub provider: ProviderHandle,
}

impl Connection {
    /// Same account through the same provider instance.
    pub fn same_as(&self, other: &Connection) -> bool {
        self.address == other.address && Arc::ptr_eq(&self.provider, &other.provider)
    }
}

/// Address, connected flag and provider move together: they all live in one
/// optional [`Connection`].
#[derive(Clone, Default)]
pub struct SessionState {
    connection: Option<Connection>,
}

impl SessionState {
    pub fn address(&self) -> Option<Address> {
        self.connection.as_ref().map(|c| c.address)
    }

    /// Checksummed address string, as shown to users and stamped on local writes.
    pub fn address_string(&self) -> Option<String> {
        self.address().map(|a| a.to_checksum(None))
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn provider(&self) -> Option<ProviderHandle> {
        self.connection.as_ref().map(|c| c.provider.clone())
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("address", &self.address())
            .field("is_connected", &self.is_connected())
            .field("provider", &self.connection.as_ref().map(|_| "<provider>"))
            .finish()
    }
}

/// Opens deep links in the wallet app.
pub trait Launcher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

#[derive(Debug, Clone)]
pub struct MobileOptions {
    /// Full deep link that hands the dapp URL to the wallet app.
    pub deep_link: String,
    /// How long to wait for a provider to appear after following the link.
    pub grace: Duration,
}

impl MobileOptions {
    pub fn new(deep_link_base: &str, dapp_url: &str, grace: Duration) -> Self {
        let target = dapp_url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        Self {
            deep_link: format!("{}/{}", deep_link_base.trim_end_matches('/'), target),
            grace,
        }
    }
}

pub struct WalletSession {
    discovery: Arc<dyn WalletDiscovery>,
    launcher: Arc<dyn Launcher>,
    mobile: Option<MobileOptions>,
    state: watch::Sender<SessionState>,
}

impl WalletSession {
    pub fn new(discovery: Arc<dyn WalletDiscovery>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            discovery,
            launcher: Arc::new(SystemLauncher),
            mobile: None,
            state,
        }
    }

    /// Enables the in-app-browser check and deep-link fallback of mobile runtimes.
    pub fn with_mobile(mut self, options: MobileOptions, launcher: Arc<dyn Launcher>) -> Self {
        self.mobile = Some(options);
        self.launcher = launcher;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Asks the wallet for account access. On any failure the state is left as it was.
    pub async fn connect(&self) -> Result<Address> {
        let provider = self.find_provider().await?;

        let accounts = provider.request_accounts().await.map_err(|e| match e {
            SaysError::Rpc { code, .. } if code == USER_REJECTED => SaysError::ConnectionRejected,
            other => other,
        })?;

        let address = *accounts.first().ok_or(SaysError::ConnectionRejected)?;
        self.set(Connection { address, provider });
        log::info!("wallet connected: {}", address);
        Ok(address)
    }

    /// Adopts an already authorized account without prompting.
    pub async fn restore(&self) -> Option<Address> {
        let provider = self.discovery.discover().await?;
        match provider.accounts().await {
            Ok(accounts) => {
                let address = *accounts.first()?;
                self.set(Connection { address, provider });
                log::info!("wallet session restored: {}", address);
                Some(address)
            }
            Err(e) => {
                log::warn!("failed to check wallet connection: {e}");
                None
            }
        }
    }

    /// Local only; nothing is sent to the wallet.
    pub fn disconnect(&self) {
        self.state.send_replace(SessionState::default());
        log::info!("wallet disconnected");
    }

    pub async fn handle_event(&self, event: WalletEvent) -> SessionEffect {
        match event {
            WalletEvent::ChainChanged(chain) => {
                log::info!("wallet switched to chain {chain}, reload required");
                SessionEffect::Reload
            }
            WalletEvent::AccountsChanged(accounts) => {
                // A disconnect wins over account changes still in flight.
                let Some(provider) = self.state().provider() else {
                    log::debug!("ignoring account change while disconnected");
                    return SessionEffect::Unchanged;
                };
                let Some(address) = accounts.first().copied() else {
                    self.disconnect();
                    return SessionEffect::Cleared;
                };

                if self.state().address() == Some(address) {
                    return SessionEffect::Unchanged;
                }
                self.set(Connection { address, provider });
                log::info!("wallet account changed: {}", address);
                SessionEffect::Updated
            }
        }
    }

    async fn find_provider(&self) -> Result<ProviderHandle> {
        if let Some(provider) = self.discovery.discover().await {
            return Ok(provider);
        }

        let Some(mobile) = &self.mobile else {
            return Err(SaysError::WalletNotFound);
        };

        log::info!("no in-app wallet, opening {}", mobile.deep_link);
        if let Err(e) = self.launcher.open(&mobile.deep_link) {
            log::warn!("failed to open wallet deep link: {e}");
        }
        tokio::time::sleep(mobile.grace).await;

        self.discovery
            .discover()
            .await
            .ok_or(SaysError::WalletNotFound)
    }

    fn set(&self, connection: Connection) {
        self.state.send_replace(SessionState {
            connection: Some(connection),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::provider::{Log, LogFilter, TransactionReceipt, WalletProvider};
    use alloy_primitives::{Bytes, B256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeWallet {
        accounts: Vec<Address>,
        reject: bool,
    }

    #[async_trait]
    impl WalletProvider for FakeWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>> {
            if self.reject {
                return Err(SaysError::Rpc {
                    code: USER_REJECTED,
                    message: "User rejected the request.".to_string(),
                });
            }
            Ok(self.accounts.clone())
        }
        async fn accounts(&self) -> Result<Vec<Address>> {
            Ok(self.accounts.clone())
        }
        async fn chain_id(&self) -> Result<u64> {
            Ok(1)
        }
        async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes> {
            Ok(Bytes::new())
        }
        async fn send_transaction(&self, _: Address, _: Address, _: Bytes) -> Result<B256> {
            Ok(B256::ZERO)
        }
        async fn transaction_receipt(&self, _: B256) -> Result<Option<TransactionReceipt>> {
            Ok(None)
        }
        async fn block_number(&self) -> Result<u64> {
            Ok(0)
        }
        async fn logs(&self, _: &LogFilter) -> Result<Vec<Log>> {
            Ok(Vec::new())
        }
    }

    /// Hands out the wallet only after `appears_after` probes.
    struct FakeDiscovery {
        wallet: Option<ProviderHandle>,
        appears_after: usize,
        probes: AtomicUsize,
    }

    impl FakeDiscovery {
        fn with(wallet: Option<FakeWallet>) -> Self {
            Self {
                wallet: wallet.map(|w| Arc::new(w) as ProviderHandle),
                appears_after: 0,
                probes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WalletDiscovery for FakeDiscovery {
        async fn discover(&self) -> Option<ProviderHandle> {
            let probe = self.probes.fetch_add(1, Ordering::SeqCst);
            if probe < self.appears_after {
                return None;
            }
            self.wallet.clone()
        }
    }

    #[derive(Default)]
    struct RecordingLauncher {
        opened: Mutex<Vec<String>>,
    }

    impl Launcher for RecordingLauncher {
        fn open(&self, url: &str) -> std::io::Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn assert_invariant(state: &SessionState) {
        assert_eq!(state.address().is_some(), state.is_connected());
        assert_eq!(state.provider().is_some(), state.is_connected());
    }

    fn session_with(accounts: Vec<Address>, reject: bool) -> WalletSession {
        WalletSession::new(Arc::new(FakeDiscovery::with(Some(FakeWallet {
            accounts,
            reject,
        }))))
    }

    #[tokio::test]
    async fn test_connect_sets_all_fields() {
        let session = session_with(vec![alice()], false);
        let address = session.connect().await.unwrap();
        assert_eq!(address, alice());

        let state = session.state();
        assert!(state.is_connected());
        assert_eq!(state.address(), Some(alice()));
        assert_invariant(&state);
    }

    #[tokio::test]
    async fn test_rejection_leaves_state_unchanged() {
        let session = session_with(vec![alice()], true);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SaysError::ConnectionRejected));
        assert!(!session.state().is_connected());
        assert_invariant(&session.state());
    }

    #[tokio::test]
    async fn test_missing_wallet() {
        let session = WalletSession::new(Arc::new(FakeDiscovery::with(None)));
        assert!(matches!(
            session.connect().await,
            Err(SaysError::WalletNotFound)
        ));
        assert_invariant(&session.state());
    }

    #[tokio::test]
    async fn test_disconnect_clears_everything() {
        let session = session_with(vec![alice()], false);
        session.connect().await.unwrap();
        session.disconnect();
        let state = session.state();
        assert!(state.address().is_none());
        assert!(!state.is_connected());
        assert!(state.provider().is_none());

        // and again from an already empty state
        session.disconnect();
        assert_invariant(&session.state());
    }

    #[tokio::test]
    async fn test_empty_account_list_clears_session() {
        let session = session_with(vec![alice()], false);
        session.connect().await.unwrap();
        let effect = session
            .handle_event(WalletEvent::AccountsChanged(Vec::new()))
            .await;
        assert_eq!(effect, SessionEffect::Cleared);
        assert!(!session.state().is_connected());
        assert_invariant(&session.state());
    }

    #[tokio::test]
    async fn test_account_switch_updates_address() {
        let session = session_with(vec![alice()], false);
        session.connect().await.unwrap();
        let mut rx = session.subscribe();
        let bob = Address::repeat_byte(0xb0);

        let effect = session
            .handle_event(WalletEvent::AccountsChanged(vec![bob]))
            .await;
        assert_eq!(effect, SessionEffect::Updated);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().address(), Some(bob));
        assert_invariant(&session.state());

        let again = session
            .handle_event(WalletEvent::AccountsChanged(vec![bob]))
            .await;
        assert_eq!(again, SessionEffect::Unchanged);
    }

    #[tokio::test]
    async fn test_chain_change_requests_reload() {
        let session = session_with(vec![alice()], false);
        session.connect().await.unwrap();
        let effect = session.handle_event(WalletEvent::ChainChanged(5)).await;
        assert_eq!(effect, SessionEffect::Reload);
        assert!(session.state().is_connected());
    }

    #[tokio::test]
    async fn test_restore_adopts_authorized_account() {
        let session = session_with(vec![alice()], false);
        assert_eq!(session.restore().await, Some(alice()));
        assert!(session.state().is_connected());

        let empty = session_with(Vec::new(), false);
        assert_eq!(empty.restore().await, None);
        assert!(!empty.state().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mobile_deep_link_then_wallet_appears() {
        let discovery = FakeDiscovery {
            appears_after: 1,
            ..FakeDiscovery::with(Some(FakeWallet {
                accounts: vec![alice()],
                reject: false,
            }))
        };
        let launcher = Arc::new(RecordingLauncher::default());
        let session = WalletSession::new(Arc::new(discovery)).with_mobile(
            MobileOptions::new(
                "https://metamask.app.link/dapp",
                "https://saysome.app/says",
                Duration::from_secs(3),
            ),
            launcher.clone(),
        );

        assert_eq!(session.connect().await.unwrap(), alice());
        assert_eq!(
            launcher.opened.lock().unwrap().as_slice(),
            ["https://metamask.app.link/dapp/saysome.app/says"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mobile_wallet_never_appears() {
        let launcher = Arc::new(RecordingLauncher::default());
        let session = WalletSession::new(Arc::new(FakeDiscovery::with(None))).with_mobile(
            MobileOptions::new("https://metamask.app.link/dapp/", "saysome.app", Duration::from_secs(3)),
            launcher.clone(),
        );

        assert!(matches!(
            session.connect().await,
            Err(SaysError::WalletNotFound)
        ));
        assert_eq!(launcher.opened.lock().unwrap().len(), 1);
        assert_invariant(&session.state());
    }
}
