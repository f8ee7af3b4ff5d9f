//! Runtime data structures shared by the instructions

pub mod container;
pub mod definition;
pub mod node;
pub mod renderer;
pub mod styling;
pub mod view;
