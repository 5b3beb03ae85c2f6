//! Navigation session: path following, tick state machine and deadlines.

mod navigation;
mod navigator;
mod ticker;

pub use navigation::{ARRIVAL_MESSAGE, LOST_MESSAGE, NavigationSession, SessionEvent};
pub use navigator::{Instruction, Navigator};
pub use ticker::Ticker;
