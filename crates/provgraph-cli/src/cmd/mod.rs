pub mod analyze;
pub mod transform;
