use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::OpenOptions, io, path::Path, sync::Arc, time::Duration};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use saysome::{
    app::{App, AppEvent},
    config::{CliArgs, Config},
    contract::{ContractGateway, TweetContract},
    feeds::{FeedAssembler, FeedSource},
    ui,
    wallet::{provider::RpcDiscovery, MobileOptions, SystemLauncher, WalletSession},
};

const TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = Config::load(args).context("Failed to load configuration")?;

    init_logging(&config.log_file)?;
    config.log_summary();

    let session = Arc::new(build_session(&config));

    if config.dump {
        return dump(&config, &session).await;
    }

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (tx, rx) = unbounded_channel::<AppEvent>();
    let mut app = App::new(&config, session, tx);
    app.start();

    let result = run_loop(&mut app, &mut terminal, rx).await;

    // cleanup runs even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("saysome exited with error: {e:#}");
    }
    result
}

/// The UI owns stdout, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn build_session(config: &Config) -> WalletSession {
    let discovery = RpcDiscovery::new(
        config.rpc_url.clone(),
        Duration::from_millis(config.rpc_timeout_ms),
    );
    let session = WalletSession::new(Arc::new(discovery));
    if !config.mobile {
        return session;
    }
    session.with_mobile(
        MobileOptions::new(
            &config.deep_link_base,
            &config.dapp_url,
            Duration::from_millis(config.wallet_grace_ms),
        ),
        Arc::new(SystemLauncher),
    )
}

/// Headless mode: fetch one page through the configured pipeline and print
/// it as JSON.
async fn dump(config: &Config, session: &WalletSession) -> Result<()> {
    let mut feed = FeedAssembler::new(FeedSource::Demo, config.batch_size);
    feed.set_window(config.window);
    feed.set_sort(config.sort);

    let restored = session.restore().await;
    feed.set_viewer(restored.map(|a| a.to_checksum(None)));

    if !config.is_demo() {
        let state = session.state();
        let connection = state
            .connection()
            .context("No authorized wallet account at the configured RPC endpoint")?;
        let gateway = ContractGateway::connect(
            connection,
            &config.contract_address,
            Duration::from_millis(config.confirmation_poll_ms),
        )
        .context("Failed to initialize the contract")?;
        let total = gateway.tweet_count().await.context("Failed to read the say count")?;
        log::info!("contract {} holds {} says", gateway.address(), total);
        feed.set_source(FeedSource::Contract(Arc::new(gateway)));
    }

    feed.refresh().await.context("Failed to fetch says")?;
    println!("{}", serde_json::to_string_pretty(feed.tweets())?);
    Ok(())
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        while let Ok(ev) = rx.try_recv() {
            app.on_event(ev);
        }
        app.on_tick();

        if app.quit_flag() {
            break;
        }
    }
    Ok(())
}
