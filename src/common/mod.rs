mod clock;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use state::AppState;
