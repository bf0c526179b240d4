//! State Module - Reactive substrate and per-frame scheduling
//!
//! - **Reactive** - `ReactiveCell`, synchronous ordered change notification
//! - **Effect** - `create_state_renderer`, effects with explicit dependencies
//! - **Frame** - `FrameScheduler`, run-on-next-tick with cancellation
//! - **Motion** - `SmoothMotion`, eased scalar driven by the scheduler
//! - **Input** - crossterm event bridge for terminal hosts

mod effect;
mod frame;
pub mod input;
mod motion;
mod reactive;

pub use effect::*;
pub use frame::*;
pub use motion::*;
pub use reactive::*;
