/// Height tracking for one stabilization run
///
/// `stagnant_count` counts consecutive readings that did not grow; any
/// growth resets it to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub last_height: u64,
    pub stagnant_count: u32,
}

impl ScrollState {
    /// Starts tracking from an initial height reading
    pub fn new(initial_height: u64) -> Self {
        Self {
            last_height: initial_height,
            stagnant_count: 0,
        }
    }

    /// Folds a new height reading into the state
    ///
    /// Returns true if the content grew since the previous reading.
    pub fn observe(&mut self, height: u64) -> bool {
        let grew = height > self.last_height;
        if height == self.last_height {
            self.stagnant_count += 1;
        } else {
            self.stagnant_count = 0;
        }
        self.last_height = height;
        grew
    }

    /// Returns true once `threshold` consecutive readings were unchanged
    pub fn is_stagnant(&self, threshold: u32) -> bool {
        self.stagnant_count >= threshold
    }
}
