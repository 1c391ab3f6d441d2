pub mod okr;
pub mod performance;
