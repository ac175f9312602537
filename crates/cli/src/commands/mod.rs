pub mod analyze;
pub mod check;
