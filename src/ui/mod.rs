pub mod app;
pub mod display;
