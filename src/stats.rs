//! Rolling per-generation history for graphs and logs.

use crate::trainer::GenerationReport;

/// Ring buffer that stores the last N samples of a metric.
#[derive(Clone, Debug)]
pub struct RingBuffer {
    data: Vec<f32>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn push(&mut self, value: f32) {
        let cap = self.capacity();
        self.data[self.head] = value;
        self.head = (self.head + 1) % cap;
        self.len = (self.len + 1).min(cap);
    }

    /// Return samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let cap = self.capacity();
        let start = if self.len < cap { 0 } else { self.head };
        (0..self.len).map(move |i| self.data[(start + i) % cap])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<f32> {
        if self.len == 0 {
            return None;
        }
        let cap = self.capacity();
        Some(self.data[(self.head + cap - 1) % cap])
    }

    pub fn max(&self) -> Option<f32> {
        self.iter().reduce(f32::max)
    }
}

/// Training curves, one sample per finished generation.
#[derive(Clone, Debug)]
pub struct TrainingStats {
    pub best_fitness: RingBuffer,
    pub mean_fitness: RingBuffer,
    pub score: RingBuffer,
    pub ticks: RingBuffer,
}

impl TrainingStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            best_fitness: RingBuffer::new(capacity),
            mean_fitness: RingBuffer::new(capacity),
            score: RingBuffer::new(capacity),
            ticks: RingBuffer::new(capacity),
        }
    }

    pub fn record(&mut self, report: &GenerationReport) {
        self.best_fitness.push(report.fitness.max);
        self.mean_fitness.push(report.fitness.mean);
        self.score.push(report.score as f32);
        self.ticks.push(report.ticks as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::FitnessSummary;

    #[test]
    fn ring_buffer_iterates_in_insertion_order_after_wrap() {
        let mut buf = RingBuffer::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            buf.push(v);
        }
        let values: Vec<f32> = buf.iter().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(buf.last(), Some(4.0));
        assert_eq!(buf.max(), Some(4.0));
    }

    #[test]
    fn training_stats_record_one_sample_per_generation() {
        let mut stats = TrainingStats::new(4);
        let report = GenerationReport {
            generation: 0,
            score: 3,
            ticks: 250,
            fitness: FitnessSummary::from_values(&[1.0, 5.0]),
        };
        stats.record(&report);
        stats.record(&report);

        assert_eq!(stats.score.len(), 2);
        assert_eq!(stats.best_fitness.last(), Some(5.0));
        assert_eq!(stats.mean_fitness.last(), Some(3.0));
        assert_eq!(stats.ticks.last(), Some(250.0));
    }
}
