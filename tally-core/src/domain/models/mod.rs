mod ids;
mod project;
mod time_entry;
mod timer;
mod user;

pub use ids::*;
pub use project::*;
pub use time_entry::*;
pub use timer::*;
pub use user::*;
