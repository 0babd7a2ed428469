pub mod ai;
pub mod run;
