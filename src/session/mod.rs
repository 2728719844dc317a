pub mod controller;
pub mod render;
pub mod runner;
pub mod state;
pub mod view;

#[cfg(test)]
mod controller_tests;

pub use controller::*;
pub use render::*;
pub use runner::*;
pub use state::*;
pub use view::*;
