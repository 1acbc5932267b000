pub mod app;
pub mod state;
pub mod view;

pub use app::{run_app, ScreenerApp};
