use super::StreamingMetric;

/// The arithmetic mean of a stream of values, optionally weighted.
#[derive(Clone, Debug, Default)]
pub struct Mean {
	total: f64,
	weight: f64,
	n: u64,
}

impl Mean {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add `value` with weight `weight`. `update(value)` is `update_weighted(value, 1.0)`.
	pub fn update_weighted(&mut self, value: f64, weight: f64) {
		self.total += value * weight;
		self.weight += weight;
		self.n += 1;
	}

	pub fn n(&self) -> u64 {
		self.n
	}
}

impl StreamingMetric<'_> for Mean {
	type Input = f64;
	type Output = Option<f64>;

	fn update(&mut self, value: f64) {
		self.update_weighted(value, 1.0)
	}

	fn merge(&mut self, other: Self) {
		self.total += other.total;
		self.weight += other.weight;
		self.n += other.n;
	}

	/// Returns `None` if no values were seen.
	fn finalize(self) -> Option<f64> {
		if self.n == 0 {
			None
		} else {
			Some(self.total / self.weight)
		}
	}
}

#[test]
fn test_mean() {
	let mut mean = Mean::new();
	assert_eq!(mean.clone().finalize(), None);
	mean.update(1.0);
	mean.update(2.0);
	let mut other = Mean::new();
	other.update(6.0);
	mean.merge(other);
	assert_eq!(mean.finalize(), Some(3.0));
}

#[test]
fn test_weighted_mean() {
	let mut mean = Mean::new();
	mean.update_weighted(1.0, 3.0);
	mean.update_weighted(0.0, 1.0);
	assert_eq!(mean.finalize(), Some(0.75));
}
