// Service module exports

pub mod backend;
pub mod controller;
pub mod forms;
pub mod grid;
pub mod layout;
pub mod refresh;
pub mod settings;
