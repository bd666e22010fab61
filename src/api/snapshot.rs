use serde::Deserialize;
use serde_json::Value;

/// Root payload of the aggregate poll. Every slice is optional on the wire;
/// absent or mistyped slices decode to their empty defaults so render code
/// never touches raw JSON.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub status: BotStatus,
    pub pnl: PnlSummary,
    pub trades: TradeBook,
    pub leaderboard: Leaderboard,
    pub brain: Brain,
}

#[derive(Debug, Clone, Default)]
pub struct BotStatus {
    pub running: bool,
    pub market: Option<String>,
    pub session_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PnlSummary {
    pub session: SessionPnl,
    pub wallet: WalletPnl,
}

#[derive(Debug, Clone, Default)]
pub struct SessionPnl {
    pub pnl: f64,
    pub pct: f64,
    pub wins: u32,
    pub losses: u32,
    pub streak: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct WalletPnl {
    pub pnl: f64,
    pub pct: f64,
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TradeBook {
    pub active: Vec<Trade>,
    pub recent: Vec<Trade>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Yes,
    No,
}

impl Default for Side {
    fn default() -> Self {
        Side::Yes
    }
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
        }
    }
}

/// One settled or open position. `won` is tri-state: `Some(true)` win,
/// `Some(false)` loss, `None` still open (entry `price` in cents applies
/// only while open).
#[derive(Debug, Clone, Default)]
pub struct Trade {
    pub ticker: Option<String>,
    pub side: Side,
    pub won: Option<bool>,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    pub session_top: Vec<Trade>,
    pub session_bottom: Vec<Trade>,
    pub all_time_top: Vec<Trade>,
    pub all_time_bottom: Vec<Trade>,
}

#[derive(Debug, Clone, Default)]
pub struct Brain {
    pub lessons: Vec<Note>,
    pub auto_implementations: Vec<Note>,
    pub manual_implementations: Vec<Note>,
}

/// Free-form learning record. Display text is resolved at decode time by
/// field priority: key_lesson, lesson, change, text, else the raw record.
#[derive(Debug, Clone, Default)]
pub struct Note {
    pub text: String,
    pub won: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Excited,
    Happy,
    Determined,
    Focused,
    Neutral,
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Neutral
    }
}

#[derive(Debug, Clone, Default)]
pub struct AvatarState {
    pub mood: Mood,
    pub color: Option<String>,
    pub pnl: f64,
}

impl AvatarState {
    /// Recomputed from scratch on every poll; never latched.
    pub fn pulsing(&self) -> bool {
        self.pnl.abs() > 10.0
    }
}

/// Today's counters from the legacy `/api/status` source, normalized to the
/// canonical key names (`wins_today` and `daily_stats.wins` both land here).
#[derive(Debug, Clone, Default)]
pub struct DailyStats {
    pub wins: u32,
    pub losses: u32,
    pub open_positions: u32,
}

#[derive(Debug, Clone, Default)]
pub struct VersionRecord {
    pub name: String,
    pub description: String,
    pub pnl: f64,
    pub win_rate: f64,
    pub trades: u32,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_win: f64,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VersionHistory {
    pub versions: Vec<(String, VersionRecord)>,
    pub overall: Option<VersionRecord>,
    pub current_version: Option<String>,
}

/// One closed trading day from the static `daily_pnl.json` document. This
/// file is produced by our own capture job, so it decodes via serde with
/// per-field defaults rather than the loose coercion the API payloads need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_balance: f64,
    #[serde(default)]
    pub end_balance: f64,
    #[serde(default)]
    pub pnl_usd: f64,
    #[serde(default)]
    pub pnl_pct: f64,
    #[serde(default)]
    pub trades_count: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyPnl {
    #[serde(default)]
    pub records: Vec<DailyRecord>,
}

// === loose-JSON coercion helpers ===

fn field<'a>(v: &'a Value, key: &str) -> &'a Value {
    v.get(key).unwrap_or(&Value::Null)
}

/// Number, or numeric string, else 0.0.
fn num(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn num_opt(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn int_opt(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn count(v: &Value) -> u32 {
    int_opt(v).and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
}

fn flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn tri_state(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn text_opt(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn items(v: &Value) -> &[Value] {
    v.as_array().map(|a| a.as_slice()).unwrap_or(&[])
}

impl Snapshot {
    pub fn from_value(v: &Value) -> Self {
        Self {
            status: BotStatus::from_value(field(v, "status")),
            pnl: PnlSummary::from_value(field(v, "pnl")),
            trades: TradeBook::from_value(field(v, "trades")),
            leaderboard: Leaderboard::from_value(field(v, "leaderboard")),
            brain: Brain::from_value(field(v, "brain")),
        }
    }
}

impl BotStatus {
    pub fn from_value(v: &Value) -> Self {
        Self {
            running: flag(field(v, "running")),
            market: text_opt(field(v, "market")),
            session_name: text_opt(field(v, "session_name")),
        }
    }
}

impl PnlSummary {
    pub fn from_value(v: &Value) -> Self {
        Self {
            session: SessionPnl::from_value(field(v, "session")),
            wallet: WalletPnl::from_value(field(v, "wallet")),
        }
    }
}

impl SessionPnl {
    pub fn from_value(v: &Value) -> Self {
        // wins_today/losses_today are the legacy spelling of the same counters.
        let wins = int_opt(field(v, "wins")).or_else(|| int_opt(field(v, "wins_today")));
        let losses = int_opt(field(v, "losses")).or_else(|| int_opt(field(v, "losses_today")));
        Self {
            pnl: num(field(v, "pnl")),
            pct: num(field(v, "pct")),
            wins: wins.and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
            losses: losses.and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
            streak: int_opt(field(v, "streak")),
        }
    }
}

impl WalletPnl {
    pub fn from_value(v: &Value) -> Self {
        Self {
            pnl: num(field(v, "pnl")),
            pct: num(field(v, "pct")),
            balance: num_opt(field(v, "balance")),
        }
    }
}

impl TradeBook {
    pub fn from_value(v: &Value) -> Self {
        Self {
            active: items(field(v, "active")).iter().map(Trade::from_value).collect(),
            recent: items(field(v, "recent")).iter().map(Trade::from_value).collect(),
        }
    }
}

impl Trade {
    pub fn from_value(v: &Value) -> Self {
        let side = match field(v, "side").as_str() {
            Some(s) if s.eq_ignore_ascii_case("no") => Side::No,
            _ => Side::Yes,
        };
        Self {
            ticker: text_opt(field(v, "ticker")),
            side,
            won: tri_state(field(v, "won")),
            pnl: num(field(v, "pnl")),
            pnl_pct: num(field(v, "pnl_pct")),
            price: int_opt(field(v, "price")),
        }
    }
}

impl Leaderboard {
    pub fn from_value(v: &Value) -> Self {
        let board = |key: &str| -> Vec<Trade> {
            items(field(v, key)).iter().map(Trade::from_value).collect()
        };
        Self {
            session_top: board("session_top"),
            session_bottom: board("session_bottom"),
            all_time_top: board("all_time_top"),
            all_time_bottom: board("all_time_bottom"),
        }
    }
}

impl Brain {
    pub fn from_value(v: &Value) -> Self {
        let list = |key: &str| -> Vec<Note> {
            items(field(v, key)).iter().map(Note::from_value).collect()
        };
        Self {
            lessons: list("lessons"),
            auto_implementations: list("auto_implementations"),
            manual_implementations: list("manual_implementations"),
        }
    }
}

impl Note {
    pub fn from_value(v: &Value) -> Self {
        let text = ["key_lesson", "lesson", "change", "text"]
            .iter()
            .find_map(|k| text_opt(field(v, k)))
            .unwrap_or_else(|| v.to_string());
        Self {
            text,
            won: tri_state(field(v, "won")),
        }
    }
}

impl Mood {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "excited" => Mood::Excited,
            "happy" => Mood::Happy,
            "determined" => Mood::Determined,
            "focused" => Mood::Focused,
            _ => Mood::Neutral,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Mood::Excited => "(^o^)/",
            Mood::Happy => "(^-^)",
            Mood::Determined => "(>_<)",
            Mood::Focused => "(o_o)",
            Mood::Neutral => "('-')",
        }
    }
}

impl AvatarState {
    pub fn from_value(v: &Value) -> Self {
        Self {
            mood: field(v, "mood")
                .as_str()
                .map(Mood::parse)
                .unwrap_or_default(),
            color: text_opt(field(v, "color")),
            pnl: num(field(v, "pnl")),
        }
    }
}

impl DailyStats {
    /// Accepts both shapes the legacy endpoint has served: `daily_stats`
    /// with canonical keys, and `system_status` with the `_today` suffix.
    /// Any `win_rate` in the payload is ignored; the rate is computed.
    pub fn from_value(v: &Value) -> Self {
        let daily = field(v, "daily_stats");
        if !daily.is_null() {
            return Self {
                wins: count(field(daily, "wins")),
                losses: count(field(daily, "losses")),
                open_positions: count(field(daily, "open_positions")),
            };
        }
        let system = field(v, "system_status");
        Self {
            wins: count(field(system, "wins_today")),
            losses: count(field(system, "losses_today")),
            open_positions: count(field(system, "open_positions")),
        }
    }
}

impl VersionRecord {
    pub fn from_value(v: &Value) -> Self {
        Self {
            name: text_opt(field(v, "name")).unwrap_or_default(),
            description: text_opt(field(v, "description")).unwrap_or_default(),
            pnl: num(field(v, "pnl")),
            win_rate: num(field(v, "win_rate")),
            trades: count(field(v, "trades")),
            best_trade: num(field(v, "best_trade")),
            worst_trade: num(field(v, "worst_trade")),
            avg_win: num(field(v, "avg_win")),
            is_current: flag(field(v, "is_current")),
        }
    }
}

impl VersionHistory {
    pub fn from_value(v: &Value) -> Self {
        let mut versions: Vec<(String, VersionRecord)> = field(v, "versions")
            .as_object()
            .map(|m| {
                m.iter()
                    .map(|(id, rec)| (id.clone(), VersionRecord::from_value(rec)))
                    .collect()
            })
            .unwrap_or_default();
        versions.sort_by(|a, b| a.0.cmp(&b.0));

        let overall = v
            .get("overall")
            .filter(|o| o.is_object())
            .map(VersionRecord::from_value);
        Self {
            versions,
            overall,
            current_version: text_opt(field(v, "current_version")),
        }
    }
}

impl DailyPnl {
    pub fn from_value(v: &Value) -> Self {
        serde_json::from_value(v.clone()).unwrap_or_default()
    }
}
