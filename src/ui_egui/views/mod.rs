pub mod day_view;
mod time_grid;
pub mod utils;
pub mod week_view;

/// What the user did inside a calendar view this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GridInteraction {
    /// Game whose tile was clicked; the app opens its detail window
    pub clicked_event: Option<i64>,
}
