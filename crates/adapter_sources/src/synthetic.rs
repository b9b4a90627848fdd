//! Synthetic fallback generators.
//!
//! These are the last link of every provider chain and are tagged
//! `fallback-sample`. Index moves are drawn fresh on each call; flow
//! figures are seeded from the session date so every fallback for the same
//! day agrees.

use chrono::{Datelike, NaiveDate};
use feed_core::{FlowDay, FlowLeg, IndexQuote, SymbolDirectory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::provider::Fallback;

/// Indices reported in a snapshot
pub const SNAPSHOT_INDICES: [&str; 3] = ["NIFTY 50", "SENSEX", "BANKNIFTY"];

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// Gaussian draw with the given mean and standard deviation.
fn gaussian<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std_dev * z
}

/// Index levels scattered around their base prices.
#[derive(Debug, Clone)]
pub struct SyntheticIndices {
    bases: Vec<(String, f64)>,
    sigma: f64,
}

impl SyntheticIndices {
    /// Bases taken from `directory`; day moves have standard deviation
    /// `sigma` (as a fraction of base) and are capped at three sigma.
    pub fn new(directory: &SymbolDirectory, sigma: f64) -> Self {
        let bases = SNAPSHOT_INDICES
            .iter()
            .map(|name| (name.to_string(), directory.base_price(name)))
            .collect();
        Self {
            bases,
            sigma: if sigma.is_finite() { sigma.abs() } else { 0.0 },
        }
    }

    /// Largest relative move a quote can show
    pub fn max_move(&self) -> f64 {
        3.0 * self.sigma
    }
}

impl Fallback<(), Vec<IndexQuote>> for SyntheticIndices {
    fn generate(&self, _key: &()) -> Vec<IndexQuote> {
        let mut rng = StdRng::from_entropy();
        let cap = self.max_move();
        self.bases
            .iter()
            .map(|(name, base)| {
                let ret = gaussian(&mut rng, 0.0, self.sigma).clamp(-cap, cap);
                let value = round2(base * (1.0 + ret));
                let change = round2(value - base);
                IndexQuote {
                    name: name.clone(),
                    value,
                    change,
                    change_percent: round2(change / base * 100.0),
                }
            })
            .collect()
    }
}

/// FII/DII buy and sell figures in crore.
#[derive(Debug, Clone)]
pub struct SyntheticFlow {
    /// Mean and standard deviation of an FII buy or sell figure
    pub fii: (f64, f64),
    /// Mean and standard deviation of a DII buy or sell figure
    pub dii: (f64, f64),
}

impl Default for SyntheticFlow {
    fn default() -> Self {
        Self {
            fii: (12_000.0, 2_500.0),
            dii: (9_000.0, 2_000.0),
        }
    }
}

impl SyntheticFlow {
    /// Flow figures for `date`; the same date always yields the same day.
    pub fn day(&self, date: NaiveDate) -> FlowDay {
        let mut rng = StdRng::seed_from_u64(date.num_days_from_ce() as u64);
        let mut draw = |(mean, sd): (f64, f64)| round2(gaussian(&mut rng, mean, sd).max(0.0));
        let fii = FlowLeg::new(draw(self.fii), draw(self.fii));
        let dii = FlowLeg::new(draw(self.dii), draw(self.dii));
        FlowDay { date, fii, dii }
    }
}

impl Fallback<NaiveDate, FlowDay> for SyntheticFlow {
    fn generate(&self, date: &NaiveDate) -> FlowDay {
        self.day(*date)
    }
}
