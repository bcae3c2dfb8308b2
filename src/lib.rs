pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;
pub mod bounds;

pub mod color;
pub mod pattern;
pub mod light;

pub mod geometry;
pub mod shape;
pub mod csg;
pub mod intersect;

pub mod world;
pub mod camera;
pub mod work;
pub mod parallel;

pub mod canvas;
pub mod obj;
pub mod scene;

pub use error::{ Error, Result };

use consts::EPSILON;

/// Approximate floating point equality, used by every `PartialEq` in the
/// crate.
pub fn feq(left: f64, right: f64) -> bool {
    if left == right {
        return true;
    }

    (left - right).abs() < EPSILON
}
