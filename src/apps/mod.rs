//! Full-screen applications that take over the display and the keys.

pub mod app;
pub mod lander;
pub mod life;
pub mod mandelbrot;
pub mod runner;

pub use app::{App, AppKey, AppStep, RunningApp};
