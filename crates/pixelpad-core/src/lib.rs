pub mod effects;
pub mod history;
pub mod session;

pub use effects::{analyze_levels, Levels};
pub use session::EditorSession;
