//////////////////////////////////////////////////////////////////////////
/// SAMPLING UTILS
//////////////////////////////////////////////////////////////////////////
// All helpers draw from the thread-local RNG so worker threads never
// contend on a shared generator and per-thread output stays independent.

use rand::Rng;

use crate::numeric::{Float, Vector3};

/// Returns a random real in [0,1)
pub fn random_float() -> Float {
    rand::rng().random()
}

/// Returns a random real in [min,max)
pub fn random_range(min: Float, max: Float) -> Float {
    rand::rng().random_range(min..max)
}

/// In the range (-0.5,0.5) on x and y axis
pub fn sample_square() -> Vector3 {
    Vector3::new(random_float() - 0.5, random_float() - 0.5, 0.0)
}

pub fn random_unit_vector() -> Vector3 {
    loop {
        let p = Vector3::new(
            random_range(-1.0, 1.0),
            random_range(-1.0, 1.0),
            random_range(-1.0, 1.0),
        );
        let len_sq = p.length_squared();
        // Reject points outside the sphere and ones too short to normalize
        if len_sq > 1e-160 && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

pub fn random_in_unit_disk() -> Vector3 {
    loop {
        let p = Vector3::new(random_range(-1.0, 1.0), random_range(-1.0, 1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_float_in_unit_range() {
        for _ in 0..1000 {
            let x = random_float();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_random_unit_vector_is_normalized() {
        for _ in 0..100 {
            let v = random_unit_vector();
            assert!((v.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unit_disk_sample_stays_planar() {
        for _ in 0..100 {
            let p = random_in_unit_disk();
            assert_eq!(p.z, 0.0);
            assert!(p.length_squared() < 1.0);
        }
    }
}
