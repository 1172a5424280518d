mod app;
mod views;

pub use app::CalendarApp;
