//! Discrete Gaussian sampling for error generation

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Default Gaussian standard deviation
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Discrete Gaussian sampler over Z using rejection sampling
#[derive(Clone)]
pub struct GaussianSampler {
    sigma: f64,
    /// Samples beyond this bound are rejected
    tailcut: i64,
    rng: ChaCha20Rng,
}

impl GaussianSampler {
    /// Create a sampler seeded from the thread-local RNG
    pub fn new(sigma: f64) -> Self {
        Self::with_seed(sigma, rand::thread_rng().gen())
    }

    /// Create a seeded sampler for reproducibility
    pub fn with_seed(sigma: f64, seed: u64) -> Self {
        Self {
            sigma,
            tailcut: (sigma * 6.0).ceil() as i64,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Sample a single value from the discrete Gaussian D_σ
    pub fn sample(&mut self) -> i64 {
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;
        let bound = self.tailcut;

        loop {
            let x = self.rng.gen_range(-bound..=bound);
            let prob = (-((x * x) as f64) / sigma_sq_2).exp();
            let u: f64 = self.rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    /// Sample a vector of n discrete Gaussian values centered in Z_q
    pub fn sample_vec_centered(&mut self, n: usize, q: u64) -> Vec<u64> {
        (0..n)
            .map(|_| {
                let sample = self.sample();
                if sample >= 0 {
                    (sample as u64) % q
                } else {
                    q - (sample.unsigned_abs() % q)
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for GaussianSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianSampler")
            .field("sigma", &self.sigma)
            .field("tailcut", &self.tailcut)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_within_tailcut() {
        let mut sampler = GaussianSampler::with_seed(DEFAULT_SIGMA, 7);
        let bound = (6.0 * DEFAULT_SIGMA).ceil() as i64;
        for _ in 0..1000 {
            assert!(sampler.sample().abs() <= bound);
        }
    }

    #[test]
    fn test_seeded_sampler_is_deterministic() {
        let mut a = GaussianSampler::with_seed(DEFAULT_SIGMA, 42);
        let mut b = GaussianSampler::with_seed(DEFAULT_SIGMA, 42);
        let xs: Vec<i64> = (0..64).map(|_| a.sample()).collect();
        let ys: Vec<i64> = (0..64).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_empirical_moments() {
        let mut sampler = GaussianSampler::with_seed(DEFAULT_SIGMA, 1);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| sampler.sample() as f64).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        assert!(mean.abs() < 0.2, "mean {} too far from 0", mean);
        assert!(
            (var.sqrt() - DEFAULT_SIGMA).abs() < 0.3,
            "std dev {} too far from {}",
            var.sqrt(),
            DEFAULT_SIGMA
        );
    }

    #[test]
    fn test_centered_vector_in_range() {
        let q = 97;
        let mut sampler = GaussianSampler::with_seed(DEFAULT_SIGMA, 3);
        let v = sampler.sample_vec_centered(256, q);
        assert!(v.iter().all(|&c| c < q));
    }
}
