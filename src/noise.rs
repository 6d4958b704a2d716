use ::noise::{NoiseFn, Simplex};

/// A deterministic 2D coherent-noise source.
///
/// Implementations must return the same value for the same coordinates and
/// should stay roughly within [-1, 1]. The mesh builder is generic over this
/// trait so tests can swap in a stub.
pub trait NoiseSampler: Send + Sync {
    fn sample(&self, x: f64, y: f64) -> f64;
}

/// 2D simplex noise with a fixed seed. Output spans close to the full [-1, 1].
pub struct SimplexSampler {
    seed: u32,
    inner: Simplex,
}

impl SimplexSampler {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            inner: Simplex::new(seed),
        }
    }

    /// Fresh noise field for every run, like an unseeded noise generator.
    pub fn random() -> Self {
        Self::new(rand::random::<u32>())
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl NoiseSampler for SimplexSampler {
    #[inline]
    fn sample(&self, x: f64, y: f64) -> f64 {
        self.inner.get([x, y])
    }
}

/// Returns the same value everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantSampler(pub f64);

impl NoiseSampler for ConstantSampler {
    #[inline]
    fn sample(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn simplex_stays_near_unit_range(
            seed in any::<u32>(),
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
        ) {
            let v = SimplexSampler::new(seed).sample(x, y);
            prop_assert!(v.is_finite());
            prop_assert!(v.abs() <= 1.05, "sample {v} outside [-1, 1]");
        }
    }
}
