use std::cell::RefCell;
use std::rc::Rc;

/// Handle of a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the backdrop started
    pub time: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Display-synchronized callback primitive
///
/// A request fires at most once, on the next display refresh. The host
/// delivers it by calling `Backdrop::on_frame` with the same handle.
pub trait FrameScheduler {
    /// Ask for one callback on the next refresh
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraw a request; unknown or already-fired handles are ignored
    fn cancel_frame(&mut self, request: FrameRequest);
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    pending: Option<FrameRequest>,
    requested: u64,
    cancelled: u64,
}

/// Frame scheduler pumped by hand
///
/// Clones share one queue: the backdrop requests through its copy, the
/// driver pops due frames through another.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    state: Rc<RefCell<QueueState>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the request due on this refresh
    pub fn take_pending(&self) -> Option<FrameRequest> {
        self.state.borrow_mut().pending.take()
    }

    /// Look at the pending request without consuming it
    pub fn pending(&self) -> Option<FrameRequest> {
        self.state.borrow().pending
    }

    /// Total requests made so far
    pub fn requested(&self) -> u64 {
        self.state.borrow().requested
    }

    /// Total requests withdrawn before firing
    pub fn cancelled(&self) -> u64 {
        self.state.borrow().cancelled
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameRequest {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.requested += 1;
        let request = FrameRequest(state.next_id);
        state.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut state = self.state.borrow_mut();
        if state.pending == Some(request) {
            state.pending = None;
            state.cancelled += 1;
        }
    }
}
