// Floating point comparisons and surface offsets
pub const EPSILON: f64 = 0.0001;

// Maximum recursion depth for reflected and refracted rays
pub const MAX_RECURSION_DEPTH: usize = 5;

// Default group size before `divide` splits a group
pub const DEFAULT_DIVIDE_THRESHOLD: usize = 16;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const AIR_RI: f64 = 1.00029;
pub const WATER_RI: f64 = 1.333;
pub const GLASS_RI: f64 = 1.52;
pub const DIAMOND_RI: f64 = 2.417;
