/// A closed range of ray parameters `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Returns true if x is strictly within the interval (min, max) (exclusive).
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Returns true if the interval contains no value.
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Clamps x to be within the interval [min, max].
    pub fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.min, self.max)
    }

    /// Same lower bound, upper bound replaced by `max`.
    pub fn with_max(&self, max: f32) -> Interval {
        Interval::new(self.min, max)
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };
}
