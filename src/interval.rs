/*

    Represents ranges from min to max and functionality to check
    whether x is in range [min,max] or (min,max).

    See also associated constants:
    - EMPTY: (inf, -inf)
    - UNIVERSE: (-inf, inf)

*/

use crate::numeric::{Float, INFINITY};

#[derive(Debug, Clone, Copy)]
pub struct Interval {
    pub min: Float,
    pub max: Float,
}

impl Interval {

    pub const EMPTY: Self = Self {
        min: INFINITY,
        max: -INFINITY,
    };

    pub const UNIVERSE: Self = Self {
        min: -INFINITY,
        max: INFINITY,
    };

    pub fn new(min: Float, max: Float) -> Self {
        Self { min, max }
    }

    /// [epsilon, inf)
    pub fn positive(epsilon: Float) -> Self {
        Self {
            min: epsilon,
            max: INFINITY,
        }
    }

    pub fn validate(&self) -> bool {
        self.max >= self.min
    }

    pub fn size(&self) -> Float {
        self.max - self.min
    }

    pub fn contains(&self, x: Float) -> bool {
        self.min <= x && x <= self.max
    }

    pub fn surrounds(&self, x: Float) -> bool {
        self.min < x && x < self.max
    }

    pub fn clamp(&self, x: Float) -> Float {
        if x < self.min { self.min }
        else if x > self.max { self.max }
        else { x }
    }

    pub fn expand(&mut self, x: Float) {
        if x < self.min { self.min = x; }
        if x > self.max { self.max = x; }
    }
}
