//! Live camera overlay: a render thread composites each captured frame with the selected
//! overlay until stopped.

pub mod cancel;
pub mod clock;
pub mod renderer;
