pub mod elapsed;
mod identity;
mod matching;
mod reconciler;
mod sync;
mod task_assignments;

pub use identity::*;
pub use matching::*;
pub use reconciler::*;
pub use sync::*;
pub use task_assignments::*;
