//! Training pace derivation
//!
//! Picks a runner's fastest eligible race result as the fitness baseline and
//! expands its pace into a table of target ranges, one per training intent.
//! Both steps are pure: no store access, no shared state.
//!
//! All arithmetic is done in [`Decimal`] so the multiplier and band constants
//! are exact. Seconds are rounded half-to-even when a bound is rendered.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::RaceResult;

/// Named training effort categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrainingIntent {
    Easy,
    Tempo,
    Interval,
    LongRun,
    Race,
}

impl TrainingIntent {
    pub const ALL: [TrainingIntent; 5] = [
        TrainingIntent::Easy,
        TrainingIntent::Tempo,
        TrainingIntent::Interval,
        TrainingIntent::LongRun,
        TrainingIntent::Race,
    ];

    /// Key used in serialized pace tables
    pub fn key(&self) -> &'static str {
        match self {
            TrainingIntent::Easy => "easy",
            TrainingIntent::Tempo => "tempo",
            TrainingIntent::Interval => "interval",
            TrainingIntent::LongRun => "longRun",
            TrainingIntent::Race => "race",
        }
    }

    /// Factor applied to the baseline pace (>1 is slower)
    pub fn multiplier(&self) -> Decimal {
        match self {
            TrainingIntent::Easy => dec!(1.25),
            TrainingIntent::Tempo => dec!(1.10),
            TrainingIntent::Interval => dec!(0.90),
            TrainingIntent::LongRun => dec!(1.15),
            TrainingIntent::Race => dec!(1.00),
        }
    }

    /// Half-width of the band around the target pace
    pub fn variation(&self) -> Decimal {
        match self {
            TrainingIntent::Easy => dec!(0.05),
            TrainingIntent::Tempo => dec!(0.025),
            TrainingIntent::Interval => dec!(0.025),
            TrainingIntent::LongRun => dec!(0.025),
            TrainingIntent::Race => dec!(0.015),
        }
    }

    /// Range used when no baseline is available
    pub fn default_range(&self) -> &'static str {
        match self {
            TrainingIntent::Easy => "5:30-6:00 min/km",
            TrainingIntent::Tempo => "4:45-5:15 min/km",
            TrainingIntent::Interval => "4:15-4:45 min/km",
            TrainingIntent::LongRun => "5:00-5:30 min/km",
            TrainingIntent::Race => "4:30-5:00 min/km",
        }
    }
}

impl fmt::Display for TrainingIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Pace band in decimal minutes per kilometre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PaceRange {
    /// `[pace * (1 - variation), pace * (1 + variation)]`, or `None` when a
    /// bound overflows
    pub fn around(pace: Decimal, variation: Decimal) -> Option<Self> {
        Some(Self {
            min: pace.checked_mul(Decimal::ONE - variation)?,
            max: pace.checked_mul(Decimal::ONE + variation)?,
        })
    }
}

impl fmt::Display for PaceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} min/km", format_pace(self.min), format_pace(self.max))
    }
}

/// Render decimal minutes as `M:SS`.
///
/// Minutes are the floor of the value, seconds the rounded remainder. A
/// remainder that rounds to 60 carries into the minute.
pub fn format_pace(pace: Decimal) -> String {
    let minutes = pace.floor();
    let seconds = ((pace - minutes) * dec!(60))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

    let (minutes, seconds) = if seconds >= dec!(60) {
        (minutes + Decimal::ONE, Decimal::ZERO)
    } else {
        (minutes, seconds)
    };

    format!(
        "{}:{:02}",
        minutes.to_i64().unwrap_or(0),
        seconds.to_i64().unwrap_or(0)
    )
}

/// Target pace ranges attached to a training plan.
///
/// Stored verbatim with the plan; it is never recomputed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceTable {
    pub easy: String,
    pub tempo: String,
    pub interval: String,
    pub long_run: String,
    pub race: String,
}

impl PaceTable {
    pub fn get(&self, intent: TrainingIntent) -> &str {
        match intent {
            TrainingIntent::Easy => &self.easy,
            TrainingIntent::Tempo => &self.tempo,
            TrainingIntent::Interval => &self.interval,
            TrainingIntent::LongRun => &self.long_run,
            TrainingIntent::Race => &self.race,
        }
    }

    /// Entries in `TrainingIntent::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (TrainingIntent, &str)> + '_ {
        TrainingIntent::ALL.iter().map(move |intent| (*intent, self.get(*intent)))
    }

    fn from_fn(mut range: impl FnMut(TrainingIntent) -> String) -> Self {
        Self {
            easy: range(TrainingIntent::Easy),
            tempo: range(TrainingIntent::Tempo),
            interval: range(TrainingIntent::Interval),
            long_run: range(TrainingIntent::LongRun),
            race: range(TrainingIntent::Race),
        }
    }
}

impl Default for PaceTable {
    /// Fixed fallback ranges
    fn default() -> Self {
        Self::from_fn(|intent| intent.default_range().to_string())
    }
}

impl fmt::Display for PaceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (intent, range) in self.iter() {
            writeln!(f, "{:<9}{}", intent.key(), range)?;
        }
        Ok(())
    }
}

/// Baseline selection over a runner's race history
pub struct RaceResultSelector;

impl RaceResultSelector {
    /// Result with the lowest `time / distance`.
    ///
    /// Entries with non-positive distance or time are skipped. On equal paces
    /// the first one in iteration order wins; dates are not consulted.
    pub fn select_best<'a, I>(results: I) -> Option<&'a RaceResult>
    where
        I: IntoIterator<Item = &'a RaceResult>,
    {
        let mut best: Option<(&RaceResult, Decimal)> = None;

        for result in results {
            if !result.is_eligible() {
                continue;
            }
            let Some(pace) = result.time.checked_div(result.distance) else {
                continue;
            };
            match best {
                Some((_, best_pace)) if pace >= best_pace => {}
                _ => best = Some((result, pace)),
            }
        }

        best.map(|(result, _)| result)
    }
}

/// Pace table derivation from a baseline
pub struct PaceCalculator;

impl PaceCalculator {
    /// Pace table for a baseline, or the default table without one.
    ///
    /// A baseline whose pace can't be computed (zero distance, overflow) is
    /// treated as absent.
    pub fn calculate(baseline: Option<&RaceResult>) -> PaceTable {
        baseline
            .and_then(Self::baseline_pace)
            .and_then(Self::from_pace)
            .unwrap_or_default()
    }

    /// Pace table around a known baseline pace in min/km.
    ///
    /// `None` if any band falls outside the representable range.
    pub fn from_pace(base_pace: Decimal) -> Option<PaceTable> {
        let band = |intent| Self::range_for(base_pace, intent).map(|r| r.to_string());
        Some(PaceTable {
            easy: band(TrainingIntent::Easy)?,
            tempo: band(TrainingIntent::Tempo)?,
            interval: band(TrainingIntent::Interval)?,
            long_run: band(TrainingIntent::LongRun)?,
            race: band(TrainingIntent::Race)?,
        })
    }

    /// Band for one intent
    pub fn range_for(base_pace: Decimal, intent: TrainingIntent) -> Option<PaceRange> {
        PaceRange::around(base_pace.checked_mul(intent.multiplier())?, intent.variation())
    }

    fn baseline_pace(result: &RaceResult) -> Option<Decimal> {
        if !result.is_eligible() {
            return None;
        }
        result.time.checked_div(result.distance)
    }
}
