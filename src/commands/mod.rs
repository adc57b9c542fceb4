pub mod lanes;
pub mod run;
