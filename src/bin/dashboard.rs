use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use oshi_console::api::{
    client::DashboardClient,
    offline::OfflineStore,
    snapshot::{
        AvatarState, BotStatus, Brain, DailyPnl, DailyRecord, DailyStats, Leaderboard, Mood, Note,
        PnlSummary, Side, Snapshot, Trade, VersionHistory,
    },
};
use ratatui::{
    layout::Alignment,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::{
    collections::VecDeque,
    io::IsTerminal,
    io::{self, Stdout},
    pin::Pin,
    sync::Arc,
    sync::OnceLock,
    time::Duration,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

#[path = "dashboard/calendar.rs"]
mod calendar;
#[path = "dashboard/chat.rs"]
mod chat;
#[cfg(test)]
#[path = "dashboard/fixture.rs"]
mod fixture;
#[path = "dashboard/format.rs"]
mod format;
#[path = "dashboard/poll.rs"]
mod poll;
#[path = "dashboard/ui.rs"]
mod ui;

pub(crate) use chat::ChatWidget;
pub(crate) use poll::{spawn_poller, FetchFut, Guarded, LinkHealth};

pub(crate) type Shared<T> = Arc<RwLock<Guarded<T>>>;
pub(crate) type SharedLogs = Arc<RwLock<VecDeque<String>>>;
pub(crate) type SharedChat = Arc<RwLock<ChatWidget>>;

fn new_shared<T: Default>() -> Shared<T> {
    Arc::new(RwLock::new(Guarded::default()))
}

/// Every mutable piece of the dashboard, constructed once in `main` and
/// handed to pollers and renderer by clone. Each poller writes exactly one
/// slice; the renderer only reads.
#[derive(Clone)]
pub(crate) struct DashState {
    pub(crate) snapshot: Shared<Snapshot>,
    pub(crate) link: Shared<LinkHealth>,
    pub(crate) avatar: Shared<AvatarState>,
    pub(crate) daily: Shared<DailyStats>,
    pub(crate) versions: Shared<VersionHistory>,
    pub(crate) calendar: Shared<DailyPnl>,
    pub(crate) logs: SharedLogs,
    pub(crate) chat: SharedChat,
}

impl DashState {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: new_shared(),
            link: new_shared(),
            avatar: new_shared(),
            daily: new_shared(),
            versions: new_shared(),
            calendar: new_shared(),
            logs: Arc::new(RwLock::new(VecDeque::new())),
            chat: Arc::new(RwLock::new(ChatWidget::new())),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DashConfig {
    pub(crate) api_base: String,
    pub(crate) refresh: Duration,
    pub(crate) avatar_refresh: Duration,
    pub(crate) status_refresh: Duration,
    pub(crate) versions_refresh: Duration,
    pub(crate) calendar_refresh: Duration,
    pub(crate) daily_pnl_url: String,
}

impl DashConfig {
    pub(crate) fn from_env() -> Self {
        let api_base = std::env::var("OSHI_API_BASE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
        let daily_pnl_url = std::env::var("OSHI_DAILY_PNL_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("{}/daily_pnl.json", api_base.trim_end_matches('/')));

        Self {
            api_base,
            refresh: env_secs("OSHI_REFRESH_SECS", 5),
            avatar_refresh: env_secs("OSHI_AVATAR_REFRESH_SECS", 10),
            status_refresh: env_secs("OSHI_STATUS_REFRESH_SECS", 30),
            versions_refresh: env_secs("OSHI_VERSIONS_REFRESH_SECS", 60),
            calendar_refresh: env_secs("OSHI_CALENDAR_REFRESH_SECS", 45),
            daily_pnl_url,
        }
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

static FILE_LOG_TX: OnceLock<tokio::sync::mpsc::UnboundedSender<String>> = OnceLock::new();

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cfg = DashConfig::from_env();
    let client = DashboardClient::new(&cfg.api_base)?;
    let offline = Arc::new(OfflineStore::new());
    let state = DashState::new();

    init_file_logging().await;
    push_log(&state.logs, format!("[init] polling {}", cfg.api_base)).await;

    {
        let c = client.clone();
        spawn_poller(
            "all",
            cfg.refresh,
            Arc::clone(&state.snapshot),
            Some(Arc::clone(&state.link)),
            Arc::clone(&state.logs),
            move || {
                let c = c.clone();
                Box::pin(async move { c.fetch_all().await })
            },
        );
    }
    {
        let c = client.clone();
        spawn_poller(
            "avatar",
            cfg.avatar_refresh,
            Arc::clone(&state.avatar),
            None,
            Arc::clone(&state.logs),
            move || {
                let c = c.clone();
                Box::pin(async move { c.fetch_avatar().await })
            },
        );
    }
    {
        let c = client.clone();
        spawn_poller(
            "status",
            cfg.status_refresh,
            Arc::clone(&state.daily),
            None,
            Arc::clone(&state.logs),
            move || {
                let c = c.clone();
                Box::pin(async move { c.fetch_daily_stats().await })
            },
        );
    }
    {
        let c = client.clone();
        spawn_poller(
            "versions",
            cfg.versions_refresh,
            Arc::clone(&state.versions),
            None,
            Arc::clone(&state.logs),
            move || {
                let c = c.clone();
                Box::pin(async move { c.fetch_versions().await })
            },
        );
    }
    {
        // The calendar document is a static resource, so it goes through the
        // offline store and keeps rendering from cache while the host is down.
        let offline = Arc::clone(&offline);
        let url = cfg.daily_pnl_url.clone();
        spawn_poller(
            "calendar",
            cfg.calendar_refresh,
            Arc::clone(&state.calendar),
            None,
            Arc::clone(&state.logs),
            move || {
                let offline = Arc::clone(&offline);
                let url = url.clone();
                Box::pin(async move {
                    let v = offline.fetch_json(&url).await?;
                    Ok(DailyPnl::from_value(&v))
                })
            },
        );
    }

    if io::stdout().is_terminal() {
        ui::run_tui(state, client).await?;
    } else {
        ui::run_plain(state, cfg.refresh).await?;
    }
    Ok(())
}

pub(crate) async fn push_log(logs: &SharedLogs, line: String) {
    let file_line = line.clone();
    let mut g = logs.write().await;
    if g.len() >= 200 {
        g.pop_front();
    }
    g.push_back(line);

    if let Some(tx) = FILE_LOG_TX.get() {
        let ts = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let _ = tx.send(format!("{ts} {file_line}"));
    }
}

async fn init_file_logging() {
    let log_enabled = std::env::var("OSHI_LOG_TO_FILE")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !log_enabled {
        return;
    }

    let path = std::env::var("OSHI_LOG_FILE").unwrap_or_else(|_| "logs/dashboard.log".to_string());
    let path = std::path::PathBuf::from(path);
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    if FILE_LOG_TX.set(tx).is_ok() {
        tokio::spawn(async move {
            let mut file = match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("failed to open log file {}: {e}", path.display());
                    return;
                }
            };

            while let Some(line) = rx.recv().await {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    eprintln!("log file write error {}: {e}", path.display());
                    return;
                }
                if let Err(e) = file.write_all(b"\n").await {
                    eprintln!("log file write error {}: {e}", path.display());
                    return;
                }
            }
        });
    }
}
