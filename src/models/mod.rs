// Module exports for models

pub mod category;
pub mod court;
pub mod cursor;
pub mod event;
pub mod settings;
