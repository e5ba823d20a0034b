/*

    Declare numeric types used throughout this repo.

    WARNING: If you like to use f32 instead of f64
    during computations, you need to change both of these:
    pub type Float = f32;
    pub type Vector3 = Vec3;

*/

use bevy_math::{DMat3, DVec3};

pub type Float = f64; // WARNING: if you change this to f32, don't forget to update Vector3 and Matrix3 too
pub type Vector3 = DVec3;
pub type Matrix3 = DMat3;

pub const INFINITY: Float = f64::INFINITY;

pub fn degrees_to_radians(degrees: Float) -> Float {
    degrees * std::f64::consts::PI / 180.0
}

pub fn approx_zero(x: Float) -> bool {
    x.abs() < 1e-8
}

/// True when every component is too small to normalize reliably
pub fn near_zero(v: &Vector3) -> bool {
    approx_zero(v.x) && approx_zero(v.y) && approx_zero(v.z)
}

pub fn reflect(v: Vector3, n: Vector3) -> Vector3 {
    v - 2.0 * v.dot(n) * n
}

pub fn refract(uv: Vector3, n: Vector3, etai_over_etat: Float) -> Vector3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

pub fn rotation_matrix(axis: &Vector3, angle: Float) -> Matrix3 {
    // Rodrigues' rotation formula, columns are R * e_i
    let k = axis.normalize();
    let (x, y, z) = (k.x, k.y, k.z);

    let si = angle.sin();
    let co = angle.cos();
    let ic = 1.0 - co;

    Matrix3::from_cols(
        Vector3::new(co + x * x * ic, y * x * ic + z * si, z * x * ic - y * si),
        Vector3::new(x * y * ic - z * si, co + y * y * ic, z * y * ic + x * si),
        Vector3::new(x * z * ic + y * si, y * z * ic - x * si, co + z * z * ic),
    )
}

pub fn rotate_point(p: Vector3, origin: Vector3, angle: Float, axis: &Vector3) -> Vector3 {
    origin + rotation_matrix(axis, angle) * (p - origin)
}
