//! Prop analysis: per-game records, windows, hit rates, chart series and
//! the adjustable line.

pub mod aggregate;
pub mod chart;
pub mod line;
pub mod record;
pub mod session;
pub mod window;

pub use record::{normalize_game, GameRecord};
pub use session::{ResearchSession, ResearchView};
pub use window::WindowSpec;
