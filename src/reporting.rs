use std::path::Path;

use serde::{Deserialize, Serialize};

/// Distribution of one generation's fitness values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
}

impl FitnessSummary {
    pub fn from_values(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let sum: f32 = sorted.iter().sum();

        Self {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sum / sorted.len() as f32,
            p50: nearest_rank(&sorted, 0.50),
            p90: nearest_rank(&sorted, 0.90),
        }
    }
}

fn nearest_rank(sorted: &[f32], p: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let rank = ((p * sorted.len() as f32).ceil() as usize).saturating_sub(1);
    sorted[rank.min(sorted.len() - 1)]
}

/// Write any serializable report as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, report: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_nearest_rank_percentiles() {
        let values: Vec<f32> = (1..=10).map(|i| i as f32).collect();
        let s = FitnessSummary::from_values(&values);
        assert_eq!(s.count, 10);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 10.0);
        assert!((s.mean - 5.5).abs() < 1e-6);
        assert_eq!(s.p50, 5.0);
        assert_eq!(s.p90, 9.0);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(FitnessSummary::from_values(&[]), FitnessSummary::default());
    }

    #[test]
    fn negative_fitness_is_kept() {
        let s = FitnessSummary::from_values(&[-0.9, 2.0]);
        assert_eq!(s.min, -0.9);
        assert_eq!(s.max, 2.0);
    }

    #[test]
    fn json_report_round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!("flock_summary_{}.json", std::process::id()));
        let s = FitnessSummary::from_values(&[1.0, 2.0, 3.0]);
        write_json(&path, &s).unwrap();
        let back: FitnessSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, s);
        let _ = std::fs::remove_file(path);
    }
}
