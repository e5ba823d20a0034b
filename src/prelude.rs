/*

This is intended to quickly import commonly used items across
the ray tracing crate.

*/

// Almost every module logs something, so the macros live here
pub use tracing::{info, error, warn, debug};
pub use smart_default::SmartDefault;
pub use serde::Deserialize;
pub use std::sync::Arc;

pub use crate::numeric::*;
pub use crate::sampler::random_float;
