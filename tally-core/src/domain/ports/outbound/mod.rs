mod clock;
mod observer;
mod store;
mod time_tracking;

pub use clock::*;
pub use observer::*;
pub use store::*;
pub use time_tracking::*;
