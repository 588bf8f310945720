use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use super::time_policy::TimeRegime;
use super::types::{Axis, DensityLevel, Direction, DirectionMap, SignalMap, SignalState};

const RUNNER_UP_PRESSURE_RATIO: f64 = 0.8;
const MAX_PEAK_GREENS: usize = 2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocatorFault {
    #[error("emergency declared but no congested direction to release")]
    NoCongestedDirection,
    #[error("pressure for {0} is not finite")]
    NonFinitePressure(Direction),
    #[error("no green assigned while {0} vehicles are waiting")]
    NoGreenAssigned(u32),
    #[error("{0} greens assigned, at most two are allowed")]
    TooManyGreens(usize),
}

/// Which branch produced an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    Emergency,
    Idle,
    OffPeak,
    PeakMainRoads,
    PeakAxisBalance,
    /// An internal fault was caught and the default assignment returned.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub states: SignalMap,
    pub emergency: bool,
    pub mode: AllocationMode,
}

/// Two or more saturated approaches, or three that are at least heavily loaded.
pub fn is_emergency(densities: &DirectionMap<DensityLevel>) -> bool {
    let very_high = densities
        .iter()
        .filter(|(_, d)| **d == DensityLevel::VeryHigh)
        .count();
    let high = densities
        .iter()
        .filter(|(_, d)| **d == DensityLevel::High)
        .count();

    very_high >= 2 || very_high + high >= 3
}

pub struct SignalAllocator {}

impl SignalAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// Assigns red/green to every approach. Never fails: any internal fault
    /// is logged and the default assignment (east green) is returned.
    pub fn allocate(
        &self,
        counts: &DirectionMap<u32>,
        densities: &DirectionMap<DensityLevel>,
        regime: TimeRegime,
        previous: Option<&SignalMap>,
    ) -> Allocation {
        let emergency = is_emergency(densities);

        let (states, mode) = match self.try_allocate(counts, densities, regime, emergency) {
            Ok(decision) => decision,
            Err(fault) => {
                tracing::warn!("⚠️  Signal allocation fault: {} - using default assignment", fault);
                (SignalMap::default_assignment(), AllocationMode::Fallback)
            }
        };

        let states = smooth_transition(previous, states);

        tracing::info!(
            "🚦 Signal allocation - regime: {}, mode: {:?}, total vehicles: {}, green: {:?}",
            regime,
            mode,
            counts.total(),
            states.greens()
        );

        Allocation {
            states,
            emergency,
            mode,
        }
    }

    fn try_allocate(
        &self,
        counts: &DirectionMap<u32>,
        densities: &DirectionMap<DensityLevel>,
        regime: TimeRegime,
        emergency: bool,
    ) -> Result<(SignalMap, AllocationMode), AllocatorFault> {
        if emergency {
            let states = self.emergency_release(counts, densities)?;
            tracing::info!("🚨 Emergency traffic mode activated");
            return Ok((states, AllocationMode::Emergency));
        }

        let total = counts.total();
        if total == 0 {
            return Ok((SignalMap::default_assignment(), AllocationMode::Idle));
        }

        let (states, mode) = if regime.is_peak() {
            self.peak_allocation(counts, densities)
        } else {
            (self.pressure_allocation(counts, densities)?, AllocationMode::OffPeak)
        };

        validate(&states, total)?;
        Ok((states, mode))
    }

    /// Releases the single most loaded congested approach.
    fn emergency_release(
        &self,
        counts: &DirectionMap<u32>,
        densities: &DirectionMap<DensityLevel>,
    ) -> Result<SignalMap, AllocatorFault> {
        let target = max_by_count(
            counts,
            Direction::ALL
                .into_iter()
                .filter(|d| densities[*d].is_congested()),
        )
        .ok_or(AllocatorFault::NoCongestedDirection)?;

        let mut states = SignalMap::all_red();
        states[target] = SignalState::Green;
        Ok(states)
    }

    /// Off-peak: rank by density-weighted pressure. A perpendicular runner-up
    /// with comparable pressure shares the green.
    fn pressure_allocation(
        &self,
        counts: &DirectionMap<u32>,
        densities: &DirectionMap<DensityLevel>,
    ) -> Result<SignalMap, AllocatorFault> {
        let pressures = pressures(counts, densities);
        for (direction, pressure) in pressures.iter() {
            if !pressure.is_finite() {
                return Err(AllocatorFault::NonFinitePressure(direction));
            }
        }

        let ranked = rank_descending(&pressures);
        let (top, top_pressure) = ranked[0];
        let (runner_up, runner_up_pressure) = ranked[1];

        let mut states = SignalMap::all_red();
        states[top] = SignalState::Green;

        if top_pressure > 0.0
            && runner_up_pressure / top_pressure > RUNNER_UP_PRESSURE_RATIO
            && top.is_perpendicular_to(runner_up)
        {
            states[runner_up] = SignalState::Green;
        }

        Ok(states)
    }

    /// Peak: favour up to two main roads, otherwise balance the two axes.
    fn peak_allocation(
        &self,
        counts: &DirectionMap<u32>,
        densities: &DirectionMap<DensityLevel>,
    ) -> (SignalMap, AllocationMode) {
        let mut main_roads: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| densities[*d] >= DensityLevel::Medium)
            .collect();

        if main_roads.is_empty() {
            return (axis_balance(counts), AllocationMode::PeakAxisBalance);
        }

        // stable: equal counts keep canonical order
        main_roads.sort_by(|a, b| counts[*b].cmp(&counts[*a]));

        let mut states = SignalMap::all_red();
        for direction in main_roads.into_iter().take(MAX_PEAK_GREENS) {
            states[direction] = SignalState::Green;
        }
        (states, AllocationMode::PeakMainRoads)
    }
}

impl Default for SignalAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Hook for transition handling between consecutive cycles. Clearance
/// intervals are not modelled, so the new assignment passes through.
fn smooth_transition(_previous: Option<&SignalMap>, next: SignalMap) -> SignalMap {
    next
}

pub fn pressures(
    counts: &DirectionMap<u32>,
    densities: &DirectionMap<DensityLevel>,
) -> DirectionMap<f64> {
    DirectionMap::from_fn(|d| counts[d] as f64 * densities[d].pressure_weight())
}

fn rank_descending(values: &DirectionMap<f64>) -> Vec<(Direction, f64)> {
    let mut ranked: Vec<(Direction, f64)> = values.iter().map(|(d, v)| (d, *v)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

/// First direction (in the given order) with the highest count.
fn max_by_count(
    counts: &DirectionMap<u32>,
    candidates: impl Iterator<Item = Direction>,
) -> Option<Direction> {
    candidates.fold(None, |best, d| match best {
        Some(b) if counts[b] >= counts[d] => Some(b),
        _ => Some(d),
    })
}

/// One axis carrying more than 1.5x the other gets both its approaches.
/// Otherwise only the busiest single approach goes green.
fn axis_balance(counts: &DirectionMap<u32>) -> SignalMap {
    let axis_total =
        |axis: Axis| -> u64 { axis.directions().iter().map(|d| counts[*d] as u64).sum() };
    let ns = axis_total(Axis::NorthSouth);
    let ew = axis_total(Axis::EastWest);

    let mut states = SignalMap::all_red();

    let dominant = if ns * 2 > ew * 3 {
        Some(Axis::NorthSouth)
    } else if ew * 2 > ns * 3 {
        Some(Axis::EastWest)
    } else {
        None
    };

    match dominant {
        Some(axis) => {
            for direction in axis.directions() {
                states[direction] = SignalState::Green;
            }
        }
        None => {
            let busiest = |axis: Axis| {
                let [a, b] = axis.directions();
                if counts[a] >= counts[b] {
                    a
                } else {
                    b
                }
            };
            let ns_best = busiest(Axis::NorthSouth);
            let ew_best = busiest(Axis::EastWest);
            let target = if counts[ns_best] >= counts[ew_best] {
                ns_best
            } else {
                ew_best
            };
            states[target] = SignalState::Green;
        }
    }

    states
}

fn validate(states: &SignalMap, total: u32) -> Result<(), AllocatorFault> {
    let greens = states.greens().len();
    if greens == 0 {
        return Err(AllocatorFault::NoGreenAssigned(total));
    }
    if greens > MAX_PEAK_GREENS {
        return Err(AllocatorFault::TooManyGreens(greens));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::density::classify_all;
    use crate::analysis::time_policy::TimeContext;
    use crate::analysis::types::DensityLevel::*;

    fn counts(n: u32, s: u32, e: u32, w: u32) -> DirectionMap<u32> {
        DirectionMap { north: n, south: s, east: e, west: w }
    }

    fn densities(
        n: DensityLevel,
        s: DensityLevel,
        e: DensityLevel,
        w: DensityLevel,
    ) -> DirectionMap<DensityLevel> {
        DirectionMap { north: n, south: s, east: e, west: w }
    }

    fn greens(allocation: &Allocation) -> Vec<Direction> {
        allocation.states.greens()
    }

    #[test]
    fn test_emergency_thresholds() {
        assert!(is_emergency(&densities(VeryHigh, VeryHigh, Low, Low)));
        assert!(is_emergency(&densities(VeryHigh, High, High, Low)));
        assert!(is_emergency(&densities(High, High, High, VeryLow)));
        assert!(!is_emergency(&densities(VeryHigh, High, Medium, Low)));
        assert!(!is_emergency(&densities(High, High, Medium, Medium)));
    }

    #[test]
    fn test_emergency_releases_busiest_congested() {
        let allocator = SignalAllocator::new();
        let result = allocator.allocate(
            &counts(18, 22, 2, 3),
            &densities(VeryHigh, VeryHigh, Low, Low),
            TimeRegime::MorningPeak,
            None,
        );
        assert!(result.emergency);
        assert_eq!(result.mode, AllocationMode::Emergency);
        assert_eq!(greens(&result), vec![Direction::South]);
    }

    #[test]
    fn test_emergency_tie_prefers_canonical_order() {
        let allocator = SignalAllocator::new();
        let result = allocator.allocate(
            &counts(12, 3, 12, 12),
            &densities(High, Low, High, High),
            TimeRegime::OffPeak,
            None,
        );
        assert_eq!(greens(&result), vec![Direction::North]);
    }

    #[test]
    fn test_idle_default() {
        let allocator = SignalAllocator::new();
        let zero = counts(0, 0, 0, 0);
        let result = allocator.allocate(&zero, &classify_all(&zero), TimeRegime::EveningPeak, None);
        assert_eq!(result.states, SignalMap::default_assignment());
        assert_eq!(result.mode, AllocationMode::Idle);
        assert!(!result.emergency);
    }

    #[test]
    fn test_off_peak_single_green() {
        let allocator = SignalAllocator::new();
        let result = allocator.allocate(
            &counts(8, 12, 4, 6),
            &densities(Medium, High, Low, Medium),
            TimeRegime::OffPeak,
            None,
        );
        assert_eq!(result.mode, AllocationMode::OffPeak);
        assert_eq!(greens(&result), vec![Direction::South]);
    }

    #[test]
    fn test_off_peak_perpendicular_runner_up() {
        let allocator = SignalAllocator::new();
        // pressures: north 10, east 9 -> ratio 0.9, perpendicular
        let c = counts(10, 2, 9, 1);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::Night, None);
        assert_eq!(greens(&result), vec![Direction::North, Direction::East]);
    }

    #[test]
    fn test_off_peak_runner_up_at_exact_ratio_stays_red() {
        let allocator = SignalAllocator::new();
        // pressures: north 10, east 8 -> ratio exactly 0.8, not above it
        let c = counts(10, 0, 8, 0);
        let d = densities(Medium, VeryLow, Medium, VeryLow);
        let result = allocator.allocate(&c, &d, TimeRegime::OffPeak, None);
        assert_eq!(result.mode, AllocationMode::OffPeak);
        assert_eq!(greens(&result), vec![Direction::North]);
    }

    #[test]
    fn test_off_peak_same_axis_runner_up_stays_red() {
        let allocator = SignalAllocator::new();
        // north 10, south 9 share an axis
        let c = counts(10, 9, 1, 1);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::WeekendDay, None);
        assert_eq!(greens(&result), vec![Direction::North]);
    }

    #[test]
    fn test_off_peak_tie_breaks_canonically() {
        let allocator = SignalAllocator::new();
        let c = counts(0, 0, 5, 5);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::OffPeak, None);
        assert_eq!(greens(&result), vec![Direction::East]);
    }

    #[test]
    fn test_peak_main_roads() {
        let allocator = SignalAllocator::new();
        let c = counts(8, 12, 4, 6);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::MorningPeak, None);
        assert_eq!(result.mode, AllocationMode::PeakMainRoads);
        assert_eq!(greens(&result), vec![Direction::North, Direction::South]);
    }

    #[test]
    fn test_weekend_rush_hour_uses_peak_branch() {
        let allocator = SignalAllocator::new();
        let saturday_morning = TimeContext::new(8, 30, 5);
        let c = counts(8, 12, 4, 6);
        let result = allocator.allocate(&c, &classify_all(&c), saturday_morning.regime(), None);
        assert_eq!(result.mode, AllocationMode::PeakMainRoads);
        assert_eq!(greens(&result), vec![Direction::North, Direction::South]);
    }

    #[test]
    fn test_peak_single_main_road() {
        let allocator = SignalAllocator::new();
        let c = counts(1, 2, 7, 3);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::EveningPeak, None);
        assert_eq!(greens(&result), vec![Direction::East]);
    }

    #[test]
    fn test_peak_axis_dominance() {
        let allocator = SignalAllocator::new();
        // all low: ns = 6, ew = 2
        let c = counts(3, 3, 1, 1);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::MorningPeak, None);
        assert_eq!(result.mode, AllocationMode::PeakAxisBalance);
        assert_eq!(greens(&result), vec![Direction::North, Direction::South]);
    }

    #[test]
    fn test_peak_axis_at_exactly_one_and_a_half_is_balanced() {
        let allocator = SignalAllocator::new();
        // ns = 3, ew = 2: 1.5x is not more than 50% above
        let c = counts(2, 1, 1, 1);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::MorningPeak, None);
        assert_eq!(result.mode, AllocationMode::PeakAxisBalance);
        assert_eq!(greens(&result), vec![Direction::North]);

        // ew = 3, ns = 2 from the other side
        let c = counts(1, 1, 1, 2);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::EveningPeak, None);
        assert_eq!(greens(&result), vec![Direction::West]);
    }

    #[test]
    fn test_peak_axis_balanced_busiest_single() {
        let allocator = SignalAllocator::new();
        // ns = 4, ew = 5: balanced, east holds the max
        let c = counts(2, 2, 3, 2);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::EveningPeak, None);
        assert_eq!(greens(&result), vec![Direction::East]);
    }

    #[test]
    fn test_previous_states_do_not_change_result() {
        let allocator = SignalAllocator::new();
        let c = counts(8, 12, 4, 6);
        let d = classify_all(&c);
        let fresh = allocator.allocate(&c, &d, TimeRegime::OffPeak, None);
        let prev = SignalMap::default_assignment();
        let smoothed = allocator.allocate(&c, &d, TimeRegime::OffPeak, Some(&prev));
        assert_eq!(fresh, smoothed);
    }

    #[test]
    fn test_inconsistent_densities_fall_back() {
        let allocator = SignalAllocator::new();
        // densities claim congestion the counts cannot back up; emergency
        // still picks a congested direction
        let result = allocator.allocate(
            &counts(0, 0, 0, 0),
            &densities(VeryHigh, VeryHigh, VeryHigh, VeryHigh),
            TimeRegime::OffPeak,
            None,
        );
        assert!(result.emergency);
        assert_eq!(greens(&result).len(), 1);
    }

    #[test]
    fn test_out_of_range_counts_allocate_without_overflow() {
        let allocator = SignalAllocator::new();

        let c = counts(u32::MAX, 1, 0, 0);
        let result = allocator.allocate(&c, &classify_all(&c), TimeRegime::OffPeak, None);
        assert_eq!(result.mode, AllocationMode::OffPeak);
        assert_eq!(greens(&result), vec![Direction::North]);

        // low densities force the axis comparison with huge sums
        let c = counts(u32::MAX, u32::MAX, 1, 1);
        let result = allocator.allocate(&c, &densities(Low, Low, Low, Low), TimeRegime::MorningPeak, None);
        assert_eq!(result.mode, AllocationMode::PeakAxisBalance);
        assert_eq!(greens(&result), vec![Direction::North, Direction::South]);

        let c = DirectionMap::splat(u32::MAX);
        let result = allocator.allocate(&c, &densities(Low, Low, Low, Low), TimeRegime::EveningPeak, None);
        assert_eq!(greens(&result), vec![Direction::North]);
    }

    #[test]
    fn test_validate_rejects_bad_assignments() {
        assert_eq!(
            validate(&SignalMap::all_red(), 4),
            Err(AllocatorFault::NoGreenAssigned(4))
        );
        assert_eq!(
            validate(&SignalMap::splat(SignalState::Green), 4),
            Err(AllocatorFault::TooManyGreens(4))
        );
    }

    #[test]
    fn test_exhaustive_small_counts_keep_invariants() {
        let allocator = SignalAllocator::new();
        let regimes = [TimeRegime::MorningPeak, TimeRegime::OffPeak, TimeRegime::WeekendOther];
        let values = [0u32, 1, 4, 9, 16, 25];
        for &n in &values {
            for &s in &values {
                for &e in &values {
                    for &w in &values {
                        let c = counts(n, s, e, w);
                        let d = classify_all(&c);
                        for regime in regimes {
                            let result = allocator.allocate(&c, &d, regime, None);
                            let g = greens(&result).len();
                            assert!((1..=2).contains(&g), "{:?} {:?} -> {}", c, regime, g);
                            assert_ne!(result.mode, AllocationMode::Fallback);
                        }
                    }
                }
            }
        }
    }
}
