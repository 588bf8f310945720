use super::types::{DensityLevel, DirectionMap};

pub fn classify(count: u32) -> DensityLevel {
    match count {
        0 => DensityLevel::VeryLow,
        1..=3 => DensityLevel::Low,
        4..=8 => DensityLevel::Medium,
        9..=15 => DensityLevel::High,
        _ => DensityLevel::VeryHigh,
    }
}

pub fn classify_all(counts: &DirectionMap<u32>) -> DirectionMap<DensityLevel> {
    counts.map(|_, count| classify(*count))
}
