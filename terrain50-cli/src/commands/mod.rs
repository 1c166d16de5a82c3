pub mod convert;
pub mod fetch;
pub mod height;
