use super::*;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CalendarSummary {
    pub(crate) total_pnl: f64,
    pub(crate) trading_days: usize,
    pub(crate) winning_days: usize,
    pub(crate) losing_days: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct DayCell {
    pub(crate) day: u32,
    pub(crate) pnl: Option<f64>,
}

pub(crate) fn summarize(records: &[DailyRecord]) -> CalendarSummary {
    let mut out = CalendarSummary {
        trading_days: records.len(),
        ..CalendarSummary::default()
    };
    for r in records {
        out.total_pnl += r.pnl_usd;
        if r.pnl_usd > 0.0 {
            out.winning_days += 1;
        } else if r.pnl_usd < 0.0 {
            out.losing_days += 1;
        }
    }
    out
}

fn record_date(r: &DailyRecord) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&r.date, "%Y-%m-%d").ok()
}

/// The month to display: the one holding the newest parseable record, else
/// the current month.
pub(crate) fn focus_month(records: &[DailyRecord]) -> (i32, u32) {
    records
        .iter()
        .filter_map(record_date)
        .max()
        .map(|d| (d.year(), d.month()))
        .unwrap_or_else(|| {
            let today = chrono::Utc::now().date_naive();
            (today.year(), today.month())
        })
}

/// Sunday-first week rows for one month. Days carrying a record get its
/// `pnl_usd`; records with unparseable dates or from other months are
/// skipped. An invalid year/month yields no rows.
pub(crate) fn month_grid(records: &[DailyRecord], year: i32, month: u32) -> Vec<[Option<DayCell>; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let days_in_month = {
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        match next {
            Some(d) => d.pred_opt().map(|p| p.day()).unwrap_or(31),
            None => 31,
        }
    };

    let mut pnl_by_day = std::collections::HashMap::new();
    for r in records {
        if let Some(d) = record_date(r) {
            if d.year() == year && d.month() == month {
                pnl_by_day.insert(d.day(), r.pnl_usd);
            }
        }
    }

    let offset = first.weekday().num_days_from_sunday() as usize;
    let mut weeks: Vec<[Option<DayCell>; 7]> = Vec::new();
    let mut week: [Option<DayCell>; 7] = Default::default();
    let mut col = offset;
    for day in 1..=days_in_month {
        week[col] = Some(DayCell {
            day,
            pnl: pnl_by_day.get(&day).copied(),
        });
        col += 1;
        if col == 7 {
            weeks.push(std::mem::take(&mut week));
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }
    weeks
}

/// Rounded-dollar cell label, `24 +$923` style; blank PnL for unrecorded
/// days.
pub(crate) fn cell_label(cell: &DayCell) -> String {
    match cell.pnl {
        Some(pnl) => {
            let sign = if pnl >= 0.0 { "+" } else { "-" };
            format!("{:>2} {sign}${:.0}", cell.day, pnl.abs())
        }
        None => format!("{:>2}", cell.day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, pnl_usd: f64) -> DailyRecord {
        DailyRecord {
            date: date.to_string(),
            pnl_usd,
            ..DailyRecord::default()
        }
    }

    fn february_run() -> Vec<DailyRecord> {
        vec![
            record("2026-02-24", 923.43),
            record("2026-02-25", 880.94),
            record("2026-02-26", -1990.35),
            record("2026-02-27", 5261.28),
        ]
    }

    #[test]
    fn summary_counts_and_totals() {
        let s = summarize(&february_run());
        assert!((s.total_pnl - 5075.30).abs() < 1e-9);
        assert_eq!(s.trading_days, 4);
        assert_eq!(s.winning_days, 3);
        assert_eq!(s.losing_days, 1);

        assert_eq!(summarize(&[]), CalendarSummary::default());
    }

    #[test]
    fn focus_month_follows_newest_record() {
        assert_eq!(focus_month(&february_run()), (2026, 2));
        let mixed = vec![record("2026-01-31", 1.0), record("not-a-date", 2.0)];
        assert_eq!(focus_month(&mixed), (2026, 1));
    }

    #[test]
    fn grid_places_records_on_their_days() {
        // February 2026 starts on a Sunday and spans exactly four weeks.
        let weeks = month_grid(&february_run(), 2026, 2);
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0][0].as_ref().map(|c| c.day), Some(1));
        assert_eq!(weeks[3][6].as_ref().map(|c| c.day), Some(28));

        let feb26 = weeks[3][4].as_ref().unwrap();
        assert_eq!(feb26.day, 26);
        assert!((feb26.pnl.unwrap() + 1990.35).abs() < 1e-9);
        assert_eq!(weeks[3][0].as_ref().unwrap().pnl, None);
    }

    #[test]
    fn grid_skips_foreign_and_bad_dates() {
        let records = vec![
            record("2026-01-15", 7.0),
            record("garbage", 9.0),
            record("2026-02-02", 3.5),
        ];
        let weeks = month_grid(&records, 2026, 2);
        let feb2 = weeks[0][1].as_ref().unwrap();
        assert_eq!(feb2.pnl, Some(3.5));
        let feb15_week = &weeks[2];
        assert_eq!(feb15_week[0].as_ref().unwrap().pnl, None);

        assert!(month_grid(&records, 2026, 13).is_empty());
    }

    #[test]
    fn cell_labels_round_to_whole_dollars() {
        let win = DayCell { day: 27, pnl: Some(5261.28) };
        assert_eq!(cell_label(&win), "27 +$5261");
        let loss = DayCell { day: 26, pnl: Some(-1990.35) };
        assert_eq!(cell_label(&loss), "26 -$1990");
        let quiet = DayCell { day: 3, pnl: None };
        assert_eq!(cell_label(&quiet), " 3");
    }
}
