pub mod planner;
pub mod sequencing;
pub mod status;
