/// Equal-width histogram of inter-arrival intervals (seconds).
///
/// Buckets span the observed min/max; the last bucket includes its upper
/// edge. When every sample is equal the range is widened by 0.5 on both
/// sides so they land in the middle bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalHistogram {
    min: f64,
    max: f64,
    counts: Vec<u64>,
}

impl IntervalHistogram {
    pub fn from_samples<I>(samples: I, bins: usize) -> Self
    where
        I: IntoIterator<Item = f64> + Clone,
    {
        let bins = bins.max(1);
        let mut counts = vec![0u64; bins];

        let (mut min, mut max) = samples
            .clone()
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));

        if !min.is_finite() || !max.is_finite() {
            return Self {
                min: 0.0,
                max: 0.0,
                counts,
            };
        }
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        let width = (max - min) / bins as f64;
        for x in samples {
            let idx = (((x - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Self { min, max, counts }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    pub fn bucket_bounds(&self, index: usize) -> (f64, f64) {
        let width = self.bin_width();
        let lo = self.min + width * index as f64;
        (lo, lo + width)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram() {
        let hist = IntervalHistogram::from_samples(Vec::<f64>::new(), 5);
        assert_eq!(hist.bins(), 5);
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_max_lands_in_last_bucket() {
        let hist = IntervalHistogram::from_samples(vec![0.0, 0.5, 1.0], 2);
        assert_eq!(hist.counts(), &[1, 2]);
        assert_eq!(hist.bucket_bounds(1), (0.5, 1.0));
    }

    #[test]
    fn test_identical_samples_use_middle_bucket() {
        let hist = IntervalHistogram::from_samples(vec![0.2, 0.2, 0.2], 3);
        assert_eq!(hist.counts(), &[0, 3, 0]);
        assert!((hist.min() - (-0.3)).abs() < 1e-12);
    }
}
