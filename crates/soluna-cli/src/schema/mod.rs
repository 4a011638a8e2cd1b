pub mod overrides;
pub mod picks;
pub mod report;
