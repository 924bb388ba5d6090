pub mod clock;
pub mod frame;
pub mod gpu_context;
pub mod timer;
pub mod window;

pub use clock::{ManualClock, SystemClock, TimeSource};
pub use frame::{FrameInfo, FrameRequest, FrameScheduler, ManualFrames};
pub use gpu_context::GpuContext;
pub use timer::{FpsMeter, Throttled};
pub use window::{Container, Viewport};
