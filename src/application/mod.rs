pub mod app_error;
pub mod billing_math;
pub mod ports;
pub mod use_cases;
pub mod validators;
