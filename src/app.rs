use crate::config::Config;
use crate::contract::events::{ContractEvent, EventSubscription};
use crate::contract::{ContractGateway, TweetContract};
use crate::error::{Result, SaysError};
use crate::feeds::{FeedAssembler, FeedSource, Followup, Write};
use crate::tweet::Tweet;
use crate::ui::toast::ToastQueue;
use crate::ui::widgets::compose::{ComposeForm, ComposeKind};
use crate::ui::widgets::feed::{FeedStatus, FeedView};
use crate::wallet::provider::ProviderHandle;
use crate::wallet::watcher::WalletWatcher;
use crate::wallet::{Connection, SessionEffect, WalletEvent, WalletSession};
use alloy_primitives::Address;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Feed,
}

/// Results of background work, delivered to the main loop.
///
/// `generation` ties a result to the wallet and contract binding it was
/// started against; results from a previous binding are dropped.
#[derive(Debug)]
pub enum AppEvent {
    Restored(Option<Address>),
    Connected(Result<Address>),
    Wallet {
        generation: u64,
        event: WalletEvent,
    },
    Session {
        generation: u64,
        effect: SessionEffect,
    },
    Fetched {
        generation: u64,
        result: Result<Option<Vec<Tweet>>>,
    },
    Written {
        generation: u64,
        write: Write,
        result: Result<()>,
    },
    Contract(ContractEvent),
}

pub struct App {
    session: Arc<WalletSession>,
    feed: FeedAssembler,
    view: FeedView,
    compose: Option<ComposeForm>,
    toasts: ToastQueue,
    route: Route,
    demo: bool,
    contract_address: String,
    event_poll: Duration,
    confirmation_poll: Duration,
    wallet_poll: Duration,
    bound: Option<Connection>,
    generation: u64,
    subscription: Option<EventSubscription>,
    watcher: Option<WalletWatcher>,
    loading: bool,
    tx: UnboundedSender<AppEvent>,
    quit: bool,
}

impl App {
    pub fn new(config: &Config, session: Arc<WalletSession>, tx: UnboundedSender<AppEvent>) -> Self {
        let demo = config.is_demo();
        let mut feed = FeedAssembler::new(source_for(demo), config.batch_size);
        feed.set_window(config.window);
        feed.set_sort(config.sort);

        Self {
            session,
            feed,
            view: FeedView::new(),
            compose: None,
            toasts: ToastQueue::new(Duration::from_millis(config.toast_ttl_ms)),
            route: Route::Landing,
            demo,
            contract_address: config.contract_address.clone(),
            event_poll: Duration::from_millis(config.event_poll_ms),
            confirmation_poll: Duration::from_millis(config.confirmation_poll_ms),
            wallet_poll: Duration::from_millis(config.wallet_poll_ms),
            bound: None,
            generation: 0,
            subscription: None,
            watcher: None,
            loading: false,
            tx,
            quit: false,
        }
    }

    /// Picks up a wallet the user already authorized, without prompting.
    pub fn start(&self) {
        let session = self.session.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let restored = session.restore().await;
            let _ = tx.send(AppEvent::Restored(restored));
        });
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    pub fn feed(&self) -> &FeedAssembler {
        &self.feed
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn compose(&self) -> Option<&ComposeForm> {
        self.compose.as_ref()
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn address(&self) -> Option<String> {
        self.session.state().address_string()
    }

    /// Contract mode shows nothing until a wallet is connected.
    pub fn needs_wallet(&self) -> bool {
        !self.demo && !self.session.state().is_connected()
    }

    pub fn feed_status(&self) -> FeedStatus {
        if self.needs_wallet() {
            FeedStatus::NeedsWallet
        } else if self.loading || !self.feed.is_loaded() {
            FeedStatus::Loading
        } else {
            FeedStatus::Ready
        }
    }

    pub fn quit_flag(&self) -> bool {
        self.quit
    }

    pub fn on_tick(&mut self) {
        self.toasts.prune();
    }

    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Restored(address) => {
                if let Some(address) = address {
                    log::info!("resuming session for {address}");
                }
                self.sync_session();
                if self.demo && !self.feed.is_loaded() {
                    self.feed.load(None);
                    self.toasts.info(
                        "Demo Mode",
                        "Using sample data. Deploy the contract to see real blockchain data.",
                    );
                }
            }
            AppEvent::Connected(Ok(_)) => {
                self.toasts
                    .info("Wallet Connected", "Your wallet has been connected successfully!");
                self.sync_session();
            }
            AppEvent::Connected(Err(e)) => {
                log::warn!("wallet connection failed: {e}");
                self.toasts.error(&e);
            }
            AppEvent::Wallet { generation, event } => {
                if generation != self.generation || self.bound.is_none() {
                    log::debug!("dropping {event:?} from binding {generation}");
                    return;
                }
                let session = self.session.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let effect = session.handle_event(event).await;
                    let _ = tx.send(AppEvent::Session { generation, effect });
                });
            }
            AppEvent::Session { generation, effect } => {
                if generation != self.generation {
                    log::debug!("dropping {effect:?} from binding {generation}");
                    return;
                }
                match effect {
                    SessionEffect::Reload => self.reload(),
                    SessionEffect::Unchanged => {}
                    SessionEffect::Updated | SessionEffect::Cleared => self.sync_session(),
                }
            }
            AppEvent::Fetched { generation, result } => {
                if generation != self.generation {
                    log::debug!("dropping fetch from binding {generation}");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(fetched) => {
                        self.feed.load(fetched);
                        self.view.clamp(self.feed.tweets().len());
                    }
                    Err(e) => {
                        log::error!("failed to fetch says: {e}");
                        self.toasts.error(&e);
                    }
                }
            }
            AppEvent::Written {
                generation,
                write,
                result,
            } => self.on_written(generation, write, result),
            AppEvent::Contract(event) => {
                log::debug!("contract event {event:?}, refreshing");
                self.request_fetch();
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        if self.compose.is_some() {
            self.on_compose_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('c') => self.connect(),
            KeyCode::Char('d') => self.disconnect(),
            KeyCode::Char('h') => self.route = Route::Landing,
            KeyCode::Tab => {
                self.route = match self.route {
                    Route::Landing => Route::Feed,
                    Route::Feed => Route::Landing,
                }
            }
            KeyCode::Enter if self.route == Route::Landing => self.route = Route::Feed,
            _ if self.route == Route::Feed && !self.needs_wallet() => self.on_feed_key(key),
            _ => {}
        }
    }

    fn on_feed_key(&mut self, key: KeyEvent) {
        let len = self.feed.tweets().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.view.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.view.scroll_down(len),
            KeyCode::Char('n') => self.compose = Some(ComposeForm::say()),
            KeyCode::Char('f') => {
                self.feed.set_window(self.feed.window().next());
                self.view.clamp(self.feed.tweets().len());
            }
            KeyCode::Char('s') => self.feed.set_sort(self.feed.sort().next()),
            KeyCode::Char('R') | KeyCode::F(5) => self.request_fetch(),
            KeyCode::Char('l') => {
                if let Some(id) = self.selected_id() {
                    self.submit(Write::Like(id));
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.submit(Write::Dislike(id));
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    self.view.toggle_comments(&id);
                }
            }
            KeyCode::Char('r') => {
                if let Some(id) = self.selected_id() {
                    self.compose = Some(ComposeForm::comment(id));
                }
            }
            _ => {}
        }
    }

    fn on_compose_key(&mut self, key: KeyEvent) {
        let Some(form) = self.compose.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.compose = None,
            KeyCode::Enter => self.submit_compose(),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Char(c) => form.add_char(c),
            _ => {}
        }
    }

    /// Sends the open form if its submit rule allows it; otherwise the form
    /// stays open unchanged.
    fn submit_compose(&mut self) {
        let address = self.address();
        let Some(form) = self.compose.as_ref() else {
            return;
        };
        if !form.can_submit(address.as_deref()) {
            return;
        }
        let write = match form.kind() {
            ComposeKind::Say => Write::Create(form.text().to_string()),
            ComposeKind::Comment { tweet_id } => Write::Comment {
                tweet_id: tweet_id.clone(),
                content: form.text().to_string(),
            },
        };
        self.compose = None;
        self.submit(write);
    }

    fn selected_id(&self) -> Option<String> {
        self.view
            .selected_tweet(self.feed.tweets())
            .map(|t| t.id.clone())
    }

    pub fn connect(&mut self) {
        if self.session.state().is_connected() {
            return;
        }
        let session = self.session.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = session.connect().await;
            let _ = tx.send(AppEvent::Connected(result));
        });
    }

    pub fn disconnect(&mut self) {
        if !self.session.state().is_connected() {
            return;
        }
        self.session.disconnect();
        self.toasts
            .info("Wallet Disconnected", "Your wallet has been disconnected.");
        self.sync_session();
    }

    /// Starts a write. Demo writes settle immediately; contract writes run in
    /// the background until confirmed.
    pub fn submit(&mut self, write: Write) {
        if self.demo {
            let generation = self.generation;
            self.on_written(generation, write, Ok(()));
            return;
        }

        if let Some((title, description)) = write.pending_message() {
            self.toasts.info(title, description);
        }
        let source = self.feed.source();
        let generation = self.generation;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.submit(&write).await;
            let _ = tx.send(AppEvent::Written {
                generation,
                write,
                result,
            });
        });
    }

    fn on_written(&mut self, generation: u64, write: Write, result: Result<()>) {
        if generation != self.generation {
            log::debug!("dropping {write:?} result from binding {generation}");
            return;
        }
        if let Err(e) = result {
            log::error!("{write:?} failed: {e}");
            self.toasts.error(&e);
            return;
        }

        let followup = self.feed.settle(&write);
        if self.demo {
            if let Some(description) = demo_notice(&write) {
                self.toasts.info("Demo Mode", description);
            }
        } else {
            self.toasts.info("Success", write.success_message());
        }
        if followup == Followup::Refresh {
            self.request_fetch();
        }
        self.view.clamp(self.feed.tweets().len());
    }

    /// Fetches a page in the background. Demo mode re-runs the pipeline over
    /// the in-memory records instead.
    pub fn request_fetch(&mut self) {
        let source = self.feed.source();
        match source {
            FeedSource::Demo => self.feed.load(None),
            FeedSource::Pending => self.toasts.error(&SaysError::ContractUninitialized),
            FeedSource::Contract(_) => {
                self.loading = true;
                let batch_size = self.feed.batch_size();
                let generation = self.generation;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = source.fetch(batch_size).await;
                    let _ = tx.send(AppEvent::Fetched { generation, result });
                });
            }
        }
    }

    /// Rebinds watcher, gateway and subscription when the session's connection
    /// differs from the one they were built for.
    fn sync_session(&mut self) {
        let current = self.session.state().connection().cloned();
        let unchanged = match (&self.bound, &current) {
            (Some(bound), Some(current)) => bound.same_as(current),
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            self.bind(current);
        }
    }

    fn bind(&mut self, connection: Option<Connection>) {
        self.release_watchers();
        self.generation += 1;
        self.loading = false;
        self.feed.set_viewer(self.address());

        if let Some(conn) = &connection {
            self.watch_wallet(conn.provider.clone());
        }

        if !self.demo {
            let source = match &connection {
                Some(conn) => self.bind_contract(conn),
                None => FeedSource::Pending,
            };
            let fetch = matches!(source, FeedSource::Contract(_));
            self.feed.set_source(source);
            self.view = FeedView::new();
            if fetch {
                self.request_fetch();
            }
        }

        self.bound = connection;
    }

    fn bind_contract(&mut self, conn: &Connection) -> FeedSource {
        match ContractGateway::connect(conn, &self.contract_address, self.confirmation_poll) {
            Ok(gateway) => {
                let gateway = Arc::new(gateway);
                let tx = self.tx.clone();
                self.subscription = Some(gateway.subscribe(
                    self.event_poll,
                    Arc::new(move |event| {
                        let _ = tx.send(AppEvent::Contract(event));
                    }),
                ));
                let contract: Arc<dyn TweetContract> = gateway;
                FeedSource::Contract(contract)
            }
            Err(e) => {
                log::error!("error initializing contract: {e}");
                self.toasts.error(&e);
                FeedSource::Pending
            }
        }
    }

    fn release_watchers(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
        if let Some(watcher) = self.watcher.take() {
            watcher.close();
        }
    }

    /// Forwards account and network changes from `provider` to the main loop.
    fn watch_wallet(&mut self, provider: ProviderHandle) {
        let (wallet_tx, mut wallet_rx) = unbounded_channel();
        self.watcher = Some(WalletWatcher::spawn(provider, self.wallet_poll, wallet_tx));

        let tx = self.tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            while let Some(event) = wallet_rx.recv().await {
                if tx.send(AppEvent::Wallet { generation, event }).is_err() {
                    break;
                }
            }
        });
    }

    /// Network switch: drop every binding and start over as a fresh launch would.
    fn reload(&mut self) {
        log::info!("reloading after network change");
        self.release_watchers();
        self.bound = None;
        self.generation += 1;
        self.loading = false;
        self.compose = None;

        let window = self.feed.window();
        let sort = self.feed.sort();
        self.feed = FeedAssembler::new(source_for(self.demo), self.feed.batch_size());
        self.feed.set_window(window);
        self.feed.set_sort(sort);
        self.view = FeedView::new();

        self.session.disconnect();
        self.toasts
            .info("Network Changed", "Reloading with the newly selected network.");
        self.start();
    }
}

fn source_for(demo: bool) -> FeedSource {
    if demo {
        FeedSource::Demo
    } else {
        FeedSource::Pending
    }
}

fn demo_notice(write: &Write) -> Option<&'static str> {
    match write {
        Write::Create(_) => {
            Some("Say added locally. Deploy the contract for blockchain functionality.")
        }
        Write::Comment { .. } => {
            Some("Comment added locally. Deploy the contract for blockchain functionality.")
        }
        Write::Like(_) | Write::Dislike(_) => None,
    }
}
