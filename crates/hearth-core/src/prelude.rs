pub use crate::context::{Context, ContextKey};
pub use crate::effects::{Dispose, on_unmount};
pub use crate::error::MisuseError;
pub use crate::scope::Scope;
pub use crate::signal::{Signal, SubId, signal};
