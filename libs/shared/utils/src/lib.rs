pub mod clock;
pub mod rate;
pub mod test_utils;

pub use clock::{Clock, SystemClock};
pub use rate::{percentage, round2};
