//! Daily OHLCV series generation.

use chrono::NaiveDate;
use rand::Rng;

use super::model::{evolve_trend, SynthesisParams};
use crate::clock::weekdays_ending;
use crate::error::CoreError;
use crate::types::Bar;

/// One-shot generator of daily bars.
///
/// Each close moves from the previous close by
/// `daily_volatility × (u + trend × k) / (1 + k)`, so a bar never moves
/// more than `daily_volatility` away from its predecessor.
#[derive(Debug, Clone)]
pub struct BarGenerator {
    /// Maximum relative close-to-close move
    pub daily_volatility: f64,
    /// Trend and floor parameters shared with the tick model
    pub params: SynthesisParams,
}

impl BarGenerator {
    /// Create a generator
    pub fn new(daily_volatility: f64, params: SynthesisParams) -> Result<Self, CoreError> {
        if !(daily_volatility.is_finite() && daily_volatility > 0.0 && daily_volatility < 1.0) {
            return Err(CoreError::parameter(
                "daily_volatility",
                "must lie in (0, 1)",
            ));
        }
        params.validate()?;
        Ok(Self {
            daily_volatility,
            params,
        })
    }

    /// Generate `days` weekday bars ending on or before `end`, oldest first.
    ///
    /// The first bar opens at `base`. Windows reaching past
    /// [`chrono::NaiveDate::MIN`] come back short.
    pub fn generate<R: Rng>(
        &self,
        base: f64,
        end: NaiveDate,
        days: usize,
        rng: &mut R,
    ) -> Vec<Bar> {
        let k = self.params.trend_weight;
        let floor = base * self.params.floor_ratio;
        let mut trend: f64 = rng.gen_range(-1.0..=1.0);
        let mut previous_close = base;

        weekdays_ending(end, days)
            .into_iter()
            .map(|date| {
                let open = previous_close;
                let shock: f64 = rng.gen_range(-1.0..=1.0);
                let ret = self.daily_volatility * (shock + trend * k) / (1.0 + k);
                let close = (open * (1.0 + ret)).max(floor);

                let wick_up: f64 = rng.gen_range(0.0..=0.5);
                let wick_down: f64 = rng.gen_range(0.0..=0.5);
                let high = open.max(close) * (1.0 + self.daily_volatility * wick_up);
                let low = open.min(close) * (1.0 - self.daily_volatility * wick_down);

                trend = evolve_trend(&mut *rng, trend, &self.params);
                previous_close = close;

                Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume: rng.gen_range(self.params.volume_min..=self.params.volume_max),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> BarGenerator {
        BarGenerator::new(0.02, SynthesisParams::default()).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_five_weekday_window() {
        let mut rng = StdRng::seed_from_u64(17);
        // Friday 2024-06-14: the window is Mon 10th .. Fri 14th
        let bars = generator().generate(3900.0, date(2024, 6, 14), 5, &mut rng);

        assert_eq!(bars.len(), 5);
        assert_eq!(bars[0].date, date(2024, 6, 10));
        assert_eq!(bars[4].date, date(2024, 6, 14));
        for pair in bars.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_close_to_close_bound() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(99);
        let bars = gen.generate(1600.0, date(2024, 6, 14), 250, &mut rng);

        let mut previous = 1600.0;
        for bar in &bars {
            assert!((bar.close / previous - 1.0).abs() <= gen.daily_volatility + 1e-12);
            assert_eq!(bar.open, previous);
            previous = bar.close;
        }
    }

    #[test]
    fn test_ohlc_ordering() {
        let mut rng = StdRng::seed_from_u64(5);
        for bar in generator().generate(780.0, date(2024, 6, 14), 60, &mut rng) {
            assert!(bar.high >= bar.open.max(bar.close));
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.low > 0.0);
            assert!(bar.close >= 780.0 * 0.95);
        }
    }

    #[test]
    fn test_weekend_end_date_rolls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        // Sunday 2024-06-16
        let bars = generator().generate(100.0, date(2024, 6, 16), 1, &mut rng);
        assert_eq!(bars[0].date, date(2024, 6, 14));
    }

    #[test]
    fn test_invalid_volatility() {
        assert!(BarGenerator::new(0.0, SynthesisParams::default()).is_err());
        assert!(BarGenerator::new(1.5, SynthesisParams::default()).is_err());
    }
}
