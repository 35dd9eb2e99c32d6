//! Latency statistics for register access benchmarks.
//!
//! Collects per-access latencies measured in native timer ticks and reports
//! minimum, average, maximum, and a coarse histogram. Conversion to seconds
//! happens only when reporting, using the timer frequency of the board.

/// Number of histogram buckets; the last one collects everything above.
const BUCKETS: usize = 20;

/// Tracks latency statistics with minimal overhead.
///
/// Accumulates tick counts with plain arithmetic so recording a sample does
/// not disturb the measurement loop.
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
    /// Width of one histogram bucket in ticks.
    pub bucket_ticks: u64,
    pub buckets: [u64; BUCKETS],
}

impl LatencyStats {
    /// Creates an empty tracker with histogram buckets `bucket_ticks` wide.
    ///
    /// Starts min at `u64::MAX` so the first measurement becomes the
    /// minimum. A bucket width of zero is raised to one tick.
    ///
    /// # Arguments
    ///
    /// * `bucket_ticks` - Width of each histogram bucket in native ticks
    pub fn new(bucket_ticks: u64) -> Self {
        Self {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
            bucket_ticks: bucket_ticks.max(1),
            buckets: [0; BUCKETS],
        }
    }

    /// Records one latency measurement in ticks.
    ///
    /// Updates min, max, sum, and count, and increments the histogram bucket
    /// the measurement falls into. Measurements beyond the last bucket are
    /// counted in it.
    ///
    /// # Arguments
    ///
    /// * `ticks` - Latency of one access in native timer ticks
    pub fn update(&mut self, ticks: u64) {
        self.min = self.min.min(ticks);
        self.max = self.max.max(ticks);
        self.sum += ticks;
        self.count += 1;

        let idx = (ticks / self.bucket_ticks).min(BUCKETS as u64 - 1) as usize;
        self.buckets[idx] += 1;
    }

    /// Computes the average latency from accumulated statistics.
    ///
    /// # Returns
    ///
    /// The average latency in ticks, or 0.0 if no measurements were
    /// recorded.
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Prints a summary report to standard output.
    ///
    /// Shows count, min, average, and max latency both in ticks and in
    /// nanoseconds, followed by the non-empty histogram buckets. Prints only
    /// the count when nothing was recorded.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Native timer frequency in Hz, used to convert ticks
    pub fn print_report(&self, frequency: u32) {
        let ns_per_tick = 1e9 / frequency as f64;
        println!("\nRegister Access Latency");
        println!("Count: {}", self.count);
        if self.count == 0 {
            return;
        }
        println!("Min:   {:.1} ns ({} ticks)", self.min as f64 * ns_per_tick, self.min);
        println!("Avg:   {:.1} ns ({:.2} ticks)", self.avg() * ns_per_tick, self.avg());
        println!("Max:   {:.1} ns ({} ticks)", self.max as f64 * ns_per_tick, self.max);

        println!("Distribution ({} tick buckets):", self.bucket_ticks);
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let lower = i as u64 * self.bucket_ticks;
                let upper = lower + self.bucket_ticks;
                let open = if i == BUCKETS - 1 { "+" } else { "" };
                println!("[{:5}-{:5}{}]: {}", lower, upper, open, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_extremes_and_average() {
        let mut stats = LatencyStats::new(10);
        for ticks in [12, 30, 18] {
            stats.update(ticks);
        }

        assert_eq!(stats.min, 12);
        assert_eq!(stats.max, 30);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.avg(), 20.0);
        assert_eq!(stats.buckets[1], 2);
        assert_eq!(stats.buckets[3], 1);
    }

    #[test]
    fn outliers_land_in_last_bucket() {
        let mut stats = LatencyStats::new(1);
        stats.update(1_000);
        assert_eq!(stats.buckets[BUCKETS - 1], 1);
    }

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(LatencyStats::new(4).avg(), 0.0);
    }
}
