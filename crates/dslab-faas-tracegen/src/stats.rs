use std::ops::AddAssign;

/// Counters describing the outcome of generating one shard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShardStats {
    /// Generation units processed: functions in continuous mode, rows in daily mode.
    pub functions: u64,
    /// Trace files written.
    pub written: u64,
    /// Days whose lognormal fit failed: continuous traces keep them with constant values, daily units are dropped.
    pub fit_failures: u64,
    /// Functions skipped because a column did not match the timestamp grid.
    pub schema_mismatches: u64,
    /// Days filled with zeros because the function was not observed.
    pub missing_days: u64,
}

impl ShardStats {
    pub fn skipped(&self) -> u64 {
        self.functions.saturating_sub(self.written)
    }
}

impl AddAssign for ShardStats {
    fn add_assign(&mut self, other: Self) {
        self.functions += other.functions;
        self.written += other.written;
        self.fit_failures += other.fit_failures;
        self.schema_mismatches += other.schema_mismatches;
        self.missing_days += other.missing_days;
    }
}

impl<'a> std::iter::Sum<&'a ShardStats> for ShardStats {
    fn sum<I: Iterator<Item = &'a ShardStats>>(iter: I) -> Self {
        let mut total = ShardStats::default();
        for s in iter {
            total += *s;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let a = ShardStats {
            functions: 3,
            written: 2,
            fit_failures: 1,
            schema_mismatches: 1,
            missing_days: 4,
        };
        let b = ShardStats {
            functions: 1,
            written: 1,
            ..Default::default()
        };
        let total: ShardStats = [a, b].iter().sum();
        assert_eq!(total.functions, 4);
        assert_eq!(total.written, 3);
        assert_eq!(total.skipped(), 1);
        assert_eq!(total.missing_days, 4);
    }
}
