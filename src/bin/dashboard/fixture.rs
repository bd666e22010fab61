//! Demo data builders for tests. Nothing in the poll or render path is
//! allowed to reference this module; fabricated numbers stay out of the
//! production pipeline.

use super::*;
use rand::Rng;

pub(crate) fn demo_trade<R: Rng>(rng: &mut R, i: usize) -> Trade {
    let assets = ["BTC", "ETH", "SOL"];
    let asset = assets[i % assets.len()];
    let won = match i % 3 {
        0 => Some(true),
        1 => Some(false),
        _ => None,
    };
    let pnl: f64 = rng.gen_range(-25.0..25.0);
    Trade {
        ticker: Some(format!("KX{asset}15M-26FEB08{:04}-15", (i * 97) % 2400)),
        side: if rng.gen_bool(0.5) { Side::Yes } else { Side::No },
        won,
        pnl: if won.is_some() { pnl } else { 0.0 },
        pnl_pct: pnl * 4.0,
        price: if won.is_none() {
            Some(rng.gen_range(5..95))
        } else {
            None
        },
    }
}

pub(crate) fn demo_snapshot<R: Rng>(rng: &mut R) -> Snapshot {
    let recent: Vec<Trade> = (0..12).map(|i| demo_trade(rng, i)).collect();
    let board = |rng: &mut R, from: usize| -> Vec<Trade> {
        (from..from + 6).map(|i| demo_trade(rng, i)).collect()
    };

    let mut snapshot = Snapshot::default();
    snapshot.status.running = true;
    snapshot.status.market = Some("KXBTC15M".to_string());
    snapshot.status.session_name = Some("morning".to_string());

    snapshot.pnl.session.pnl = 42.17;
    snapshot.pnl.session.pct = 8.4;
    snapshot.pnl.session.wins = 5;
    snapshot.pnl.session.losses = 2;
    snapshot.pnl.session.streak = Some(2);
    snapshot.pnl.wallet.pnl = -3.55;
    snapshot.pnl.wallet.pct = -0.4;
    snapshot.pnl.wallet.balance = Some(1423.43);

    snapshot.trades.active = recent.iter().filter(|t| t.won.is_none()).cloned().collect();
    snapshot.trades.recent = recent;

    snapshot.leaderboard.session_top = board(rng, 0);
    snapshot.leaderboard.session_bottom = board(rng, 6);
    snapshot.leaderboard.all_time_top = board(rng, 12);
    snapshot.leaderboard.all_time_bottom = board(rng, 18);

    snapshot.brain.lessons = vec![
        Note {
            text: "Fade the first spike after the open".to_string(),
            won: Some(true),
        },
        Note {
            text: "Stop sizing up after two losses".to_string(),
            won: Some(false),
        },
    ];
    snapshot.brain.auto_implementations = vec![Note {
        text: "Tightened entry band to 3¢".to_string(),
        won: None,
    }];
    snapshot.brain.manual_implementations = Vec::new();

    snapshot
}

pub(crate) fn demo_daily_pnl() -> DailyPnl {
    let record = |date: &str, start: f64, end: f64, wins: u32, losses: u32| DailyRecord {
        date: date.to_string(),
        start_balance: start,
        end_balance: end,
        pnl_usd: end - start,
        pnl_pct: if start > 0.0 { (end - start) / start * 100.0 } else { 0.0 },
        trades_count: wins + losses,
        wins,
        losses,
        notes: String::new(),
    };
    DailyPnl {
        records: vec![
            record("2026-02-24", 500.00, 1423.43, 10, 2),
            record("2026-02-25", 1000.00, 1880.94, 12, 3),
            record("2026-02-26", 2600.00, 609.65, 3, 5),
            record("2026-02-27", 609.65, 5870.93, 9, 9),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn demo_snapshot_is_fully_populated() {
        let mut rng = StdRng::seed_from_u64(1);
        let snap = demo_snapshot(&mut rng);
        assert!(snap.status.running);
        assert_eq!(snap.trades.recent.len(), 12);
        assert_eq!(snap.leaderboard.all_time_top.len(), 6);
        assert!(!snap.brain.lessons.is_empty());
        // Open demo positions carry an entry price, settled ones a pnl sign.
        for t in &snap.trades.recent {
            match t.won {
                None => assert!(t.price.is_some()),
                Some(_) => assert!(t.price.is_none()),
            }
        }
    }

    #[test]
    fn demo_calendar_reconciles_balances() {
        let pnl = demo_daily_pnl();
        assert_eq!(pnl.records.len(), 4);
        for r in &pnl.records {
            assert!((r.pnl_usd - (r.end_balance - r.start_balance)).abs() < 1e-9);
            assert_eq!(r.trades_count, r.wins + r.losses);
        }
    }
}
