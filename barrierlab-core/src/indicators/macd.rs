//! Moving Average Convergence/Divergence (MACD).
//!
//! MACD[t]   = EMA(close, fast)[t] - EMA(close, slow)[t]
//! Signal[t] = EMA(MACD, signal)[t]
//! Both lines inherit the first-observation EMA seed, so neither has a warmup.
//! Lookback: 0.
//!
//! The two lines are exposed as separate named instances, keeping the
//! single-series `Indicator` trait unchanged.

use super::ema::ema_of_series;
use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Main,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1, "MACD fast span must be >= 1");
        assert!(slow > fast, "MACD slow span must exceed fast span");
        assert!(signal >= 1, "MACD signal span must be >= 1");
        Self {
            fast,
            slow,
            signal,
            line,
        }
    }

    /// Compute both lines in one pass over the closes.
    pub fn compute_lines(&self, bars: &[PriceBar]) -> (Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let main: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&main, self.signal);
        (main, signal)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        match self.line {
            MacdLine::Main => "macd",
            MacdLine::Signal => "macd_signal",
        }
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let (main, signal) = self.compute_lines(bars);
        match self.line {
            MacdLine::Main => main,
            MacdLine::Signal => signal,
        }
    }
}
