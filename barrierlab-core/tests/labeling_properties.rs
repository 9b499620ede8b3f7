//! Property tests for indicator and labeling invariants.
//!
//! Uses proptest to verify:
//! 1. Label count: a series of n rows yields max(n - h, 0) labeled rows
//! 2. RSI bounds: every defined RSI value lies in [0, 100]
//! 3. Auto-close exactness: with unreachable barriers the target equals the
//!    horizon return
//! 4. Exit ordering: the exit row lies inside the forward window and no
//!    earlier row touches a barrier

use barrierlab_core::indicators::{Indicator, Rsi};
use barrierlab_core::{
    BarrierConfig, BarrierLabeler, ExitKind, IndicatorConfig, IndicatorEngine, PriceBar,
    PriceSeries,
};
use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 0..max_len)
}

fn arb_barrier() -> impl Strategy<Value = BarrierConfig> {
    (1.001..1.5_f64, 0.5..0.999_f64, 1..30usize).prop_map(|(p, l, h)| BarrierConfig {
        profit_threshold: p,
        loss_threshold: l,
        horizon: h,
    })
}

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            symbol: "P".into(),
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 500.0,
        })
        .collect()
}

fn small_engine() -> IndicatorEngine {
    IndicatorEngine::new(IndicatorConfig {
        rsi_window: 5,
        macd_fast: 3,
        macd_slow: 6,
        macd_signal: 3,
        ma_periods: BTreeSet::from([3, 7]),
        matv_window: 4,
        vroc_window: 4,
    })
    .unwrap()
}

proptest! {
    #[test]
    fn label_count_is_len_minus_horizon(closes in arb_closes(80), config in arb_barrier()) {
        let labeler = BarrierLabeler::new(config).unwrap();
        let series = PriceSeries::new("P", bars_from_closes(&closes)).unwrap();
        let table = labeler.label(small_engine().compute(series));

        prop_assert_eq!(table.rows.len(), closes.len().saturating_sub(config.horizon));
        prop_assert_eq!(table.stats.total(), table.rows.len());
        prop_assert!(table.rows.iter().all(|r| r.target.is_finite()));
        prop_assert!(table.rows.iter().all(|r| r.features.len() == table.feature_names.len()));
    }

    #[test]
    fn rsi_stays_in_bounds(closes in arb_closes(120), window in 1..20usize) {
        let values = Rsi::new(window).compute(&bars_from_closes(&closes));
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(&v), "rsi {} out of range", v);
        }
    }

    #[test]
    fn unreachable_barriers_auto_close_at_horizon(closes in arb_closes(60), horizon in 1..15usize) {
        let labeler = BarrierLabeler::new(BarrierConfig {
            profit_threshold: 1e9,
            loss_threshold: 1e-9,
            horizon,
        })
        .unwrap();
        let bars = bars_from_closes(&closes);

        for (i, outcome) in labeler.outcomes(&bars).into_iter().enumerate() {
            prop_assert_eq!(outcome.kind, ExitKind::AutoClose);
            prop_assert_eq!(outcome.exit_index, i + horizon);
            let expected = (closes[i + horizon] / closes[i] - 1.0) * 100.0;
            prop_assert!((outcome.target - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn exit_is_first_touch_inside_window(closes in arb_closes(60), config in arb_barrier()) {
        let labeler = BarrierLabeler::new(config).unwrap();
        let bars = bars_from_closes(&closes);

        for i in 0..labeler.labeled_len(bars.len()) {
            let outcome = labeler.resolve(&bars, i).unwrap();
            prop_assert!(outcome.exit_index >= i && outcome.exit_index <= i + config.horizon);

            let up = bars[i].close * config.profit_threshold;
            let down = bars[i].close * config.loss_threshold;
            let touches = |b: &PriceBar| b.high >= up || b.low <= down;
            prop_assert!(!bars[i..outcome.exit_index].iter().any(touches));
            if outcome.kind != ExitKind::AutoClose {
                prop_assert!(touches(&bars[outcome.exit_index]));
            }
        }
    }
}

#[test]
fn resolve_past_end_is_none() {
    let labeler = BarrierLabeler::new(BarrierConfig::default()).unwrap();
    let bars = bars_from_closes(&[100.0; 25]);
    assert!(labeler.resolve(&bars, 4).is_some());
    assert!(labeler.resolve(&bars, 5).is_none());
    assert!(labeler.resolve(&bars, usize::MAX).is_none());
}
