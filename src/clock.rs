/// Clock advance per tick at `time_scale == 1`.
pub const BASE_STEP: f64 = 0.02;

/// Fixed-step animation clock.
///
/// Advances by `BASE_STEP * time_scale` per tick and never looks at elapsed
/// wall-clock time, so animation speed follows the frame count rather than
/// the frame rate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickClock {
    ticks: f64,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the clock and return the new value.
    #[inline]
    pub fn advance(&mut self, time_scale: f32) -> f64 {
        self.ticks += BASE_STEP * time_scale as f64;
        self.ticks
    }

    pub fn ticks(&self) -> f64 {
        self.ticks
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn non_decreasing_for_non_negative_scale(
            scales in prop::collection::vec(0.0f32..2.0, 1..200)
        ) {
            let mut clock = TickClock::new();
            let mut last = clock.ticks();
            for s in scales {
                let now = clock.advance(s);
                prop_assert!(now >= last);
                last = now;
            }
        }
    }
}
