mod account;
mod filters;
mod project;
mod time_entry;
mod user;

pub use account::*;
pub use filters::*;
pub use project::*;
pub use time_entry::*;
pub use user::*;
