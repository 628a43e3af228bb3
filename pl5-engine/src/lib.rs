pub mod backtest;
pub mod error;
pub mod features;
pub mod predictions;
pub mod report;
pub mod scoring;
pub mod tuner;
pub mod weights;

use pl5_db::models::{DrawRecord, POSITIONS};

/// Tirages synthétiques déterministes pour les tests, périodes croissantes.
pub fn make_test_records(n: usize) -> Vec<DrawRecord> {
    (0..n)
        .map(|i| {
            let mut digits = [0u8; POSITIONS];
            for (p, d) in digits.iter_mut().enumerate() {
                *d = ((i * (2 * p + 3) + 7 * p + i / 10) % 10) as u8;
            }
            DrawRecord {
                period: 25_000 + i as u32 + 1,
                date: format!("2025-01-{:02}", i % 28 + 1),
                digits,
            }
        })
        .collect()
}
