//! First-touch barrier labeling.
//!
//! For entry row `i` with horizon `h`, the forward window is rows `i..=i+h`
//! (the entry row included). Profit barrier: `high >= close[i] * p`. Loss
//! barrier: `low <= close[i] * l`.
//!
//! Resolution:
//! - the earliest row touching either barrier is the exit row;
//! - a row touching both is ambiguous and exits at that row's close;
//! - no touch within the window auto-closes at `close[i+h]`.
//!
//! target = (close[exit] / close[i] - 1) * 100
//!
//! Rows with `i + h >= len` cannot see a full window and get no label.

use crate::config::{BarrierConfig, ConfigError};
use crate::domain::{LabeledRow, PriceBar};
use crate::indicators::IndicatorFrame;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Which rule decided the exit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    Profit,
    Loss,
    /// Both barriers touched on the same row.
    Ambiguous,
    /// Neither barrier touched within the horizon.
    AutoClose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierOutcome {
    pub exit_index: usize,
    pub kind: ExitKind,
    /// Percentage return from the entry close to the exit close.
    pub target: f64,
}

/// Per-kind outcome counts for one labeling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStats {
    pub profit: usize,
    pub loss: usize,
    pub ambiguous: usize,
    pub auto_close: usize,
}

impl LabelStats {
    pub fn record(&mut self, kind: ExitKind) {
        match kind {
            ExitKind::Profit => self.profit += 1,
            ExitKind::Loss => self.loss += 1,
            ExitKind::Ambiguous => self.ambiguous += 1,
            ExitKind::AutoClose => self.auto_close += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.profit + self.loss + self.ambiguous + self.auto_close
    }
}

impl AddAssign for LabelStats {
    fn add_assign(&mut self, other: Self) {
        self.profit += other.profit;
        self.loss += other.loss;
        self.ambiguous += other.ambiguous;
        self.auto_close += other.auto_close;
    }
}

/// Labeled rows for one symbol, date-ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub symbol: String,
    pub feature_names: Vec<String>,
    pub rows: Vec<LabeledRow>,
    pub stats: LabelStats,
}

#[derive(Debug, Clone, Copy)]
pub struct BarrierLabeler {
    config: BarrierConfig,
}

impl BarrierLabeler {
    /// Rejects `profit_threshold <= 1`, `loss_threshold` outside (0, 1) and a
    /// zero horizon.
    pub fn new(config: BarrierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BarrierConfig {
        &self.config
    }

    pub fn horizon(&self) -> usize {
        self.config.horizon
    }

    /// Number of rows a series of length `len` yields.
    pub fn labeled_len(&self, len: usize) -> usize {
        len.saturating_sub(self.config.horizon)
    }

    /// Resolve the exit for entry row `i`, or `None` when the full forward
    /// window does not fit in `bars` or the entry close is not positive.
    ///
    /// Scanning for the first row that touches either barrier is equivalent to
    /// recording the first profit row and the first loss row separately and
    /// taking the earlier one.
    pub fn resolve(&self, bars: &[PriceBar], i: usize) -> Option<BarrierOutcome> {
        let last = i.checked_add(self.config.horizon)?;
        if last >= bars.len() {
            return None;
        }

        let entry = bars[i].close;
        if entry.is_nan() || entry <= 0.0 {
            return None;
        }
        let profit_price = entry * self.config.profit_threshold;
        let loss_price = entry * self.config.loss_threshold;

        let (exit_index, kind) = bars[i..=last]
            .iter()
            .enumerate()
            .find_map(|(offset, bar)| {
                let profit_hit = bar.high >= profit_price;
                let loss_hit = bar.low <= loss_price;
                let kind = match (profit_hit, loss_hit) {
                    (true, true) => ExitKind::Ambiguous,
                    (true, false) => ExitKind::Profit,
                    (false, true) => ExitKind::Loss,
                    (false, false) => return None,
                };
                Some((i + offset, kind))
            })
            .unwrap_or((last, ExitKind::AutoClose));

        Some(BarrierOutcome {
            exit_index,
            kind,
            target: pct_return(entry, bars[exit_index].close),
        })
    }

    /// Outcomes for every eligible entry row, in row order. Rows with a
    /// non-positive close have no outcome.
    pub fn outcomes(&self, bars: &[PriceBar]) -> Vec<BarrierOutcome> {
        (0..self.labeled_len(bars.len()))
            .filter_map(|i| self.resolve(bars, i))
            .collect()
    }

    /// Attach a target to every eligible row of an indicator frame.
    ///
    /// The trailing `horizon` rows are dropped. Undefined feature values are
    /// carried through unchanged.
    pub fn label(&self, frame: IndicatorFrame) -> LabeledTable {
        let (series, values) = frame.into_parts();
        let feature_names = values.names();
        let symbol = series.symbol().to_string();
        let bars = series.bars();

        let mut stats = LabelStats::default();
        let mut rows = Vec::with_capacity(self.labeled_len(bars.len()));

        for i in 0..self.labeled_len(bars.len()) {
            let Some(outcome) = self.resolve(bars, i) else {
                continue;
            };
            stats.record(outcome.kind);
            let bar = &bars[i];
            rows.push(LabeledRow {
                symbol: symbol.clone(),
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                features: values.row(i),
                target: outcome.target,
            });
        }

        LabeledTable {
            symbol,
            feature_names,
            rows,
            stats,
        }
    }
}

fn pct_return(entry: f64, exit: f64) -> f64 {
    (exit / entry - 1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Flat bars: high = low = close for every row.
    fn flat_bars(n: usize, close: f64) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        (0..n)
            .map(|i| PriceBar {
                symbol: "TEST".into(),
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn labeler(horizon: usize) -> BarrierLabeler {
        BarrierLabeler::new(BarrierConfig {
            profit_threshold: 1.05,
            loss_threshold: 0.95,
            horizon,
        })
        .unwrap()
    }

    #[test]
    fn profit_touch_exits_at_that_rows_close() {
        let mut bars = flat_bars(25, 100.0);
        bars[5].high = 106.0;
        bars[5].close = 106.0;

        let outcome = labeler(20).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.exit_index, 5);
        assert_eq!(outcome.kind, ExitKind::Profit);
        assert!((outcome.target - 6.0).abs() < 1e-9);
    }

    #[test]
    fn exit_uses_close_not_barrier_price() {
        let mut bars = flat_bars(25, 100.0);
        bars[5].high = 106.0;

        let outcome = labeler(20).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.kind, ExitKind::Profit);
        assert_eq!(outcome.target, 0.0);
    }

    #[test]
    fn auto_close_uses_horizon_close_exactly() {
        let mut bars = flat_bars(10, 100.0);
        bars[3].close = 103.0;
        bars[3].high = 103.0;
        bars[3].low = 103.0;

        let outcome = labeler(3).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.kind, ExitKind::AutoClose);
        assert_eq!(outcome.exit_index, 3);
        assert_eq!(outcome.target, (103.0 / 100.0 - 1.0) * 100.0);
    }

    #[test]
    fn same_row_touch_is_ambiguous() {
        let mut bars = flat_bars(10, 100.0);
        bars[2].high = 110.0;
        bars[2].low = 90.0;
        bars[2].close = 98.0;

        let outcome = labeler(5).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.kind, ExitKind::Ambiguous);
        assert_eq!(outcome.exit_index, 2);
        assert!((outcome.target - (-2.0)).abs() < 1e-9);
    }

    #[test]
    fn earlier_profit_beats_later_loss() {
        let mut bars = flat_bars(10, 100.0);
        bars[2].high = 106.0;
        bars[2].close = 104.0;
        bars[4].low = 90.0;
        bars[4].close = 91.0;

        let outcome = labeler(5).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.kind, ExitKind::Profit);
        assert_eq!(outcome.exit_index, 2);
        assert!((outcome.target - 4.0).abs() < 1e-9);
    }

    #[test]
    fn earlier_loss_beats_later_profit() {
        let mut bars = flat_bars(10, 100.0);
        bars[1].low = 94.0;
        bars[1].close = 96.0;
        bars[3].high = 120.0;
        bars[3].close = 119.0;

        let outcome = labeler(5).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.kind, ExitKind::Loss);
        assert_eq!(outcome.exit_index, 1);
        assert!((outcome.target - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn entry_row_itself_can_touch() {
        let mut bars = flat_bars(5, 100.0);
        bars[0].high = 106.0;

        let outcome = labeler(2).resolve(&bars, 0).unwrap();
        assert_eq!(outcome.kind, ExitKind::Profit);
        assert_eq!(outcome.exit_index, 0);
        assert_eq!(outcome.target, 0.0);
    }

    #[test]
    fn trailing_rows_unlabeled() {
        let bars = flat_bars(10, 100.0);
        let l = labeler(3);
        assert!(l.resolve(&bars, 6).is_some());
        assert!(l.resolve(&bars, 7).is_none());
        assert_eq!(l.outcomes(&bars).len(), 7);
    }

    #[test]
    fn horizon_at_or_beyond_length_yields_nothing() {
        let bars = flat_bars(5, 100.0);
        assert!(labeler(5).outcomes(&bars).is_empty());
        assert!(labeler(50).outcomes(&bars).is_empty());
        assert!(labeler(3).outcomes(&[]).is_empty());
    }

    #[test]
    fn huge_horizon_does_not_overflow() {
        let bars = flat_bars(3, 100.0);
        assert!(labeler(usize::MAX).resolve(&bars, 1).is_none());
    }

    #[test]
    fn zero_entry_close_has_no_outcome() {
        let mut bars = flat_bars(5, 100.0);
        bars[0].close = 0.0;
        let l = labeler(2);

        assert!(l.resolve(&bars, 0).is_none());
        let outcomes = l.outcomes(&bars);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.target.is_finite()));
        assert_eq!(outcomes[0].exit_index, 3);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = BarrierLabeler::new(BarrierConfig {
            profit_threshold: 0.9,
            loss_threshold: 0.95,
            horizon: 5,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ProfitThreshold(_)));
    }

    #[test]
    fn stats_count_each_kind() {
        let mut stats = LabelStats::default();
        stats.record(ExitKind::Profit);
        stats.record(ExitKind::Profit);
        stats.record(ExitKind::AutoClose);

        let mut total = LabelStats {
            loss: 1,
            ..Default::default()
        };
        total += stats;
        assert_eq!(total.profit, 2);
        assert_eq!(total.loss, 1);
        assert_eq!(total.auto_close, 1);
        assert_eq!(total.total(), 4);
    }
}
