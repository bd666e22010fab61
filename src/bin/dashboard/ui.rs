use super::*;
use ratatui::text::{Line, Span};

const RECENT_TRADES_CAP: usize = 10;
const LEADER_CAP: usize = 5;
const BRAIN_CAP: usize = 5;

/// Immutable view of the chat widget for one frame.
#[derive(Clone)]
pub(crate) struct ChatView {
    open: bool,
    input: String,
    entries: Vec<chat::ChatEntry>,
}

/// Everything one frame needs, cloned out of the shared slices up front so
/// every draw function is a pure projection of plain data onto its own
/// region.
#[derive(Clone)]
struct UiSnapshot {
    snapshot: Snapshot,
    link: LinkHealth,
    avatar: AvatarState,
    daily: DailyStats,
    versions: VersionHistory,
    calendar: DailyPnl,
    logs: VecDeque<String>,
    chat: ChatView,
}

async fn collect_ui_snapshot(state: &DashState) -> UiSnapshot {
    let snapshot = state.snapshot.read().await.get();
    let link = state.link.read().await.get();
    let avatar = state.avatar.read().await.get();
    let daily = state.daily.read().await.get();
    let versions = state.versions.read().await.get();
    let calendar = state.calendar.read().await.get();
    let logs = state.logs.read().await.clone();
    let chat = {
        let w = state.chat.read().await;
        ChatView {
            open: w.is_open(),
            input: w.input().to_string(),
            entries: w.entries().to_vec(),
        }
    };
    UiSnapshot {
        snapshot,
        link,
        avatar,
        daily,
        versions,
        calendar,
        logs,
        chat,
    }
}

pub(crate) async fn run_tui(state: DashState, client: DashboardClient) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("terminal init")?;

    let mut trades_state = TableState::default();

    let tick_rate = Duration::from_millis(200);
    loop {
        let snap = collect_ui_snapshot(&state).await;
        terminal.draw(|f| draw_ui(f, &snap, &mut trades_state))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let chat_open = state.chat.read().await.is_open();
                if chat_open {
                    match key.code {
                        KeyCode::Esc => state.chat.write().await.toggle(),
                        KeyCode::Enter => {
                            let staged = state.chat.write().await.submit();
                            if let Some((index, message)) = staged {
                                spawn_chat_send(&state, &client, index, message);
                            }
                        }
                        KeyCode::Backspace => state.chat.write().await.backspace(),
                        KeyCode::Char(c) => state.chat.write().await.input_char(c),
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') => state.chat.write().await.toggle(),
                        KeyCode::Down => {
                            trades_state.select(Some(
                                trades_state.selected().unwrap_or(0).saturating_add(1),
                            ));
                        }
                        KeyCode::Up => {
                            trades_state.select(Some(
                                trades_state.selected().unwrap_or(0).saturating_sub(1),
                            ));
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    teardown_tui(terminal)?;
    Ok(())
}

/// Exactly one terminal transcript entry per send: the spawned task resolves
/// the staged placeholder with the reply, or the apology on any failure.
fn spawn_chat_send(state: &DashState, client: &DashboardClient, index: usize, message: String) {
    let client = client.clone();
    let chat = Arc::clone(&state.chat);
    let logs = Arc::clone(&state.logs);
    tokio::spawn(async move {
        match client.send_chat(&message).await {
            Ok(reply) => chat.write().await.resolve(index, &reply),
            Err(err) => {
                chat.write().await.fail(index);
                push_log(&logs, format!("[chat] send failed: {err:#}")).await;
            }
        }
    });
}

/// Minimal fallback for non-interactive stdout.
pub(crate) async fn run_plain(state: DashState, every: Duration) -> Result<()> {
    loop {
        let snapshot = state.snapshot.read().await.get();
        let link = state.link.read().await.get();
        let (badge, _) = status_badge(link, &snapshot.status);
        let session = &snapshot.pnl.session;
        println!(
            "{badge} | session {} ({}) | wallet {} | rate {} | recent {} | q via ctrl-c",
            format::format_currency(session.pnl),
            format::format_percent(session.pct),
            format::format_currency(snapshot.pnl.wallet.pnl),
            format::win_rate(session.wins, session.losses),
            snapshot.trades.recent.len(),
        );
        tokio::time::sleep(every).await;
    }
}

fn teardown_tui(mut terminal: Terminal<ratatui::backend::CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

/// The three observable connection states: the payload only encodes two, the
/// third comes exclusively from the poller's error path.
fn status_badge(link: LinkHealth, status: &BotStatus) -> (&'static str, Color) {
    match link {
        LinkHealth::Failed => ("API ERROR", Color::Red),
        LinkHealth::Live if status.running => ("RUNNING", Color::Green),
        LinkHealth::Live => ("OFFLINE", Color::Red),
    }
}

fn mood_label(mood: Mood) -> &'static str {
    match mood {
        Mood::Excited => "excited",
        Mood::Happy => "happy",
        Mood::Determined => "determined",
        Mood::Focused => "focused",
        Mood::Neutral => "steady",
    }
}

fn sign_style(v: f64) -> Style {
    if v >= 0.0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    }
}

fn draw_ui(f: &mut Frame, snap: &UiSnapshot, trades_state: &mut TableState) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(12), Constraint::Length(10)].as_ref())
        .split(area);

    draw_header(f, snap, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(body[0]);
    draw_pnl(
        f,
        &snap.snapshot.pnl,
        &snap.daily,
        snap.snapshot.trades.active.len(),
        left[0],
    );
    draw_trades(f, &snap.snapshot.trades.recent, left[1], trades_state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(16), Constraint::Min(6)])
        .split(body[1]);
    draw_leaderboards(f, &snap.snapshot.leaderboard, right[0]);
    draw_brain(f, &snap.snapshot.brain, right[1]);

    let bottom_constraints: &[Constraint] = if snap.chat.open {
        &[
            Constraint::Percentage(32),
            Constraint::Percentage(24),
            Constraint::Percentage(18),
            Constraint::Percentage(26),
        ]
    } else {
        &[
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ]
    };
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(bottom_constraints)
        .split(chunks[2]);
    draw_calendar(f, &snap.calendar, bottom[0]);
    draw_versions(f, &snap.versions, bottom[1]);
    draw_logs(f, &snap.logs, bottom[2]);
    if snap.chat.open {
        draw_chat(f, &snap.chat, bottom[3]);
    }
}

fn draw_header(f: &mut Frame, snap: &UiSnapshot, area: Rect) {
    let (badge, badge_color) = status_badge(snap.link, &snap.snapshot.status);
    let status = &snap.snapshot.status;

    let mut line1 = vec![
        Span::styled(
            format!("[{badge}]"),
            Style::default().fg(badge_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" oshi"),
    ];
    if let Some(market) = status.market.as_deref() {
        line1.push(Span::raw(format!(" | market {market}")));
    }
    if let Some(session) = status.session_name.as_deref() {
        line1.push(Span::raw(format!(" | session {session}")));
    }
    line1.push(Span::raw(" | q=quit c=chat"));

    let avatar = &snap.avatar;
    let mut line2 = vec![Span::raw(format!(
        "{} {} | swing {}",
        avatar.mood.glyph(),
        mood_label(avatar.mood),
        format::format_currency(avatar.pnl),
    ))];
    if avatar.pulsing() {
        line2.push(Span::styled(
            " *pulse*",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let header_block = Block::default().borders(Borders::BOTTOM);
    f.render_widget(header_block, area);
    f.render_widget(
        Paragraph::new(Line::from(line1)).alignment(Alignment::Left),
        Rect::new(area.x, area.y, area.width, 1),
    );
    f.render_widget(
        Paragraph::new(Line::from(line2)).alignment(Alignment::Left),
        Rect::new(area.x, area.y + 1, area.width, 1),
    );
}

fn draw_pnl(f: &mut Frame, pnl: &PnlSummary, daily: &DailyStats, active: usize, area: Rect) {
    let session = &pnl.session;
    let wallet = &pnl.wallet;

    let total = session.wins + session.losses;
    let avg_pct = session.pct / f64::from(total.max(1));
    let streak = session
        .streak
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let balance = wallet
        .balance
        .map(|b| format!("${b:.2}"))
        .unwrap_or_else(|| "$-".to_string());

    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("PnL"),
        Cell::from("Pct"),
        Cell::from("Detail"),
    ])
    .style(header_style);

    let rows = vec![
        Row::new(vec![
            Cell::from("Session"),
            Cell::from(format::format_currency(session.pnl)).style(sign_style(session.pnl)),
            Cell::from(format::format_percent(session.pct)).style(sign_style(session.pct)),
            Cell::from(format!(
                "{}W/{}L · rate {} · streak {streak}",
                session.wins,
                session.losses,
                format::win_rate(session.wins, session.losses),
            )),
        ]),
        Row::new(vec![
            Cell::from("Wallet"),
            Cell::from(format::format_currency(wallet.pnl)).style(sign_style(wallet.pnl)),
            Cell::from(format::format_percent(wallet.pct)).style(sign_style(wallet.pct)),
            Cell::from(format!("balance {balance}")),
        ]),
        Row::new(vec![
            Cell::from("Today"),
            Cell::from(format!("{}W/{}L", daily.wins, daily.losses)),
            Cell::from(format::win_rate(daily.wins, daily.losses)),
            Cell::from(format!("open {}", daily.open_positions)),
        ]),
        Row::new(vec![
            Cell::from("Stats"),
            Cell::from(format!("trades {total}")),
            Cell::from(format!("avg {}", format::format_percent(avg_pct))),
            Cell::from(format!("active {active}")),
        ]),
    ];

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(Block::default().title("PnL").borders(Borders::ALL));

    f.render_widget(table, area);
}

fn trade_cells(t: &Trade) -> (String, &'static str, String, String, Style) {
    let name = format::short_ticker(t.ticker.as_deref());
    let (result, detail) = match t.won {
        Some(true) => ("WIN", format::format_percent(t.pnl_pct)),
        Some(false) => ("LOSS", format::format_percent(t.pnl_pct)),
        None => ("OPEN", format!("@{}¢", t.price.unwrap_or(0))),
    };
    let pnl = if t.won.is_some() {
        format::format_currency(t.pnl)
    } else {
        "-".to_string()
    };
    (name, result, detail, pnl, sign_style(t.pnl))
}

fn draw_trades(f: &mut Frame, trades: &[Trade], area: Rect, table_state: &mut TableState) {
    if trades.is_empty() {
        let p = Paragraph::new("No trades yet")
            .block(Block::default().title("Recent Trades").borders(Borders::ALL));
        f.render_widget(p, area);
        return;
    }

    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("Side"),
        Cell::from("Name"),
        Cell::from("Result"),
        Cell::from("Pct/Px"),
        Cell::from("PnL"),
    ])
    .style(header_style);

    let table_rows: Vec<Row> = trades
        .iter()
        .take(RECENT_TRADES_CAP)
        .map(|t| {
            let (name, result, detail, pnl, pnl_style) = trade_cells(t);
            let result_style = match t.won {
                Some(true) => Style::default().fg(Color::Green),
                Some(false) => Style::default().fg(Color::Red),
                None => Style::default().fg(Color::Yellow),
            };
            let side_style = match t.side {
                Side::Yes => Style::default().fg(Color::Green),
                Side::No => Style::default().fg(Color::Red),
            };
            Row::new(vec![
                Cell::from(t.side.label()).style(side_style),
                Cell::from(name),
                Cell::from(result).style(result_style),
                Cell::from(detail),
                Cell::from(pnl).style(pnl_style),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Min(9),
        ],
    )
    .header(header)
    .block(Block::default().title("Recent Trades").borders(Borders::ALL))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, table_state);
}

fn draw_leaderboards(f: &mut Frame, board: &Leaderboard, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_leader_list(f, "Session Top", &board.session_top, top[0]);
    draw_leader_list(f, "Session Worst", &board.session_bottom, top[1]);
    draw_leader_list(f, "All-Time Top", &board.all_time_top, bottom[0]);
    draw_leader_list(f, "All-Time Worst", &board.all_time_bottom, bottom[1]);
}

fn rank_style(rank: usize) -> Style {
    match rank {
        1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        2 => Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        3 => Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    }
}

fn draw_leader_list(f: &mut Frame, title: &str, items: &[Trade], area: Rect) {
    let table_rows: Vec<Row> = if items.is_empty() {
        vec![Row::new(vec![Cell::from(""), Cell::from("No data")])]
    } else {
        items
            .iter()
            .take(LEADER_CAP)
            .enumerate()
            .map(|(i, t)| {
                let rank = i + 1;
                Row::new(vec![
                    Cell::from(rank.to_string()).style(rank_style(rank)),
                    Cell::from(format::short_ticker(t.ticker.as_deref())),
                    Cell::from(format::format_percent(t.pnl_pct)),
                    Cell::from(format::format_currency(t.pnl)).style(sign_style(t.pnl)),
                ])
            })
            .collect()
    };

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(2),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(8),
        ],
    )
    .block(Block::default().title(title.to_string()).borders(Borders::ALL));

    f.render_widget(table, area);
}

fn note_style(won: Option<bool>) -> Style {
    match won {
        Some(true) => Style::default().fg(Color::Green),
        Some(false) => Style::default().fg(Color::Yellow),
        None => Style::default(),
    }
}

fn draw_brain(f: &mut Frame, brain: &Brain, area: Rect) {
    let thirds = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    draw_note_list(f, "Lessons", &brain.lessons, "Learning in progress...", thirds[0]);
    draw_note_list(
        f,
        "Auto Tweaks",
        &brain.auto_implementations,
        "No auto-tweaks",
        thirds[1],
    );
    draw_note_list(
        f,
        "Manual Changes",
        &brain.manual_implementations,
        "No manual changes",
        thirds[2],
    );
}

fn draw_note_list(f: &mut Frame, title: &str, notes: &[Note], empty: &str, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let table_rows: Vec<Row> = if notes.is_empty() {
        vec![Row::new(vec![Cell::from(empty.to_string())])]
    } else {
        notes
            .iter()
            .take(BRAIN_CAP)
            .map(|n| {
                Row::new(vec![
                    Cell::from(shorten(&n.text, width.max(8))).style(note_style(n.won))
                ])
            })
            .collect()
    };

    let table = Table::new(table_rows, [Constraint::Percentage(100)])
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    f.render_widget(table, area);
}

fn draw_versions(f: &mut Frame, history: &VersionHistory, area: Rect) {
    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("Ver"),
        Cell::from("PnL"),
        Cell::from("Win%"),
        Cell::from("Trades"),
        Cell::from("AvgW"),
    ])
    .style(header_style);

    let current_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut table_rows: Vec<Row> = history
        .versions
        .iter()
        .map(|(id, rec)| {
            let label = if rec.name.is_empty() {
                id.clone()
            } else {
                format!("{id} {}", rec.name)
            };
            let row = Row::new(vec![
                Cell::from(shorten(&label, 14)),
                Cell::from(format::format_currency(rec.pnl)).style(sign_style(rec.pnl)),
                Cell::from(format::format_percent(rec.win_rate)),
                Cell::from(rec.trades.to_string()),
                Cell::from(format::format_currency(rec.avg_win)),
            ]);
            let is_current =
                rec.is_current || history.current_version.as_deref() == Some(id.as_str());
            if is_current {
                row.style(current_style)
            } else {
                row
            }
        })
        .collect();
    if let Some(overall) = history.overall.as_ref() {
        table_rows.push(Row::new(vec![
            Cell::from("overall"),
            Cell::from(format::format_currency(overall.pnl)).style(sign_style(overall.pnl)),
            Cell::from(format::format_percent(overall.win_rate)),
            Cell::from(overall.trades.to_string()),
            Cell::from(format::format_currency(overall.avg_win)),
        ]));
    }
    if table_rows.is_empty() {
        table_rows.push(Row::new(vec![Cell::from(""), Cell::from("No data")]));
    }

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(Block::default().title("Versions").borders(Borders::ALL));

    f.render_widget(table, area);
}

fn draw_calendar(f: &mut Frame, daily: &DailyPnl, area: Rect) {
    let summary = calendar::summarize(&daily.records);
    let (year, month) = calendar::focus_month(&daily.records);
    let weeks = calendar::month_grid(&daily.records, year, month);

    let title = format!(
        "Daily PnL {year}-{month:02} · {} · {} days ({}W/{}L)",
        format::format_currency(summary.total_pnl),
        summary.trading_days,
        summary.winning_days,
        summary.losing_days,
    );

    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let header = Row::new(
        ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
            .into_iter()
            .map(Cell::from)
            .collect::<Vec<_>>(),
    )
    .style(header_style);

    let table_rows: Vec<Row> = weeks
        .iter()
        .map(|week| {
            Row::new(
                week.iter()
                    .map(|slot| match slot {
                        Some(cell) => {
                            let style = match cell.pnl {
                                Some(p) => sign_style(p),
                                None => Style::default(),
                            };
                            Cell::from(calendar::cell_label(cell)).style(style)
                        }
                        None => Cell::from(""),
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let widths = [Constraint::Ratio(1, 7); 7];
    let table = Table::new(table_rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));

    f.render_widget(table, area);
}

fn draw_logs(f: &mut Frame, logs: &VecDeque<String>, area: Rect) {
    let take = area.height.saturating_sub(2) as usize;
    let lines: Vec<String> = logs
        .iter()
        .rev()
        .take(take)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let text = lines.join("\n");
    let p = Paragraph::new(text).block(Block::default().title("Logs").borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_chat(f: &mut Frame, view: &ChatView, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    // One line is the input prompt; the transcript view follows the tail.
    let take = area.height.saturating_sub(3) as usize;
    let mut lines: Vec<Line> = view
        .entries
        .iter()
        .rev()
        .take(take)
        .rev()
        .map(|e| match e.role {
            chat::ChatRole::User => Line::from(format!("you: {}", e.text)),
            chat::ChatRole::Assistant => Line::from(Span::styled(
                format!("oshi: {}", e.text),
                Style::default().fg(Color::Cyan),
            )),
            chat::ChatRole::Typing => Line::from(Span::styled(
                e.text.clone(),
                Style::default().fg(Color::DarkGray),
            )),
        })
        .collect();
    lines.push(Line::from(format!("> {}", view.input)));

    let p = Paragraph::new(lines).block(
        Block::default()
            .title("Chat (Enter=send Esc=close)")
            .borders(Borders::ALL),
    );
    f.render_widget(p, area);
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let cut: String = s.chars().take(keep).collect();
    format!("{cut}...")
}
