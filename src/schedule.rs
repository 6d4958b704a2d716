/// Single-slot "next frame" request, in the spirit of a display-refresh callback.
///
/// At most one frame is ever pending: asking again before the pending frame
/// has run is refused rather than queued. Once stopped, no further frames are
/// accepted.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    stopped: bool,
    requested: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for one future tick. Returns false if one is already pending or the
    /// loop has stopped.
    pub fn request_frame(&mut self) -> bool {
        if self.stopped || self.pending {
            return false;
        }
        self.pending = true;
        self.requested += 1;
        true
    }

    /// Consume the pending request, if any. The host calls this when the
    /// frame callback fires.
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Stop the loop and drop any pending request.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.pending = false;
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Number of accepted requests since creation.
    pub fn requested(&self) -> u64 {
        self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pending_request() {
        let mut s = FrameScheduler::new();
        assert!(s.request_frame());
        assert!(!s.request_frame());
        assert!(!s.request_frame());
        assert_eq!(s.requested(), 1);

        assert!(s.take_frame());
        assert!(!s.take_frame(), "no backlog after the pending frame ran");
    }

    #[test]
    fn test_request_after_take() {
        let mut s = FrameScheduler::new();
        for _ in 0..10 {
            assert!(s.request_frame());
            assert!(s.is_pending());
            assert!(s.take_frame());
        }
        assert_eq!(s.requested(), 10);
    }

    #[test]
    fn test_stop_drops_pending_and_refuses_more() {
        let mut s = FrameScheduler::new();
        s.request_frame();
        s.stop();
        assert!(!s.is_running());
        assert!(!s.take_frame());
        assert!(!s.request_frame());
    }

    #[test]
    fn test_nothing_pending_initially() {
        let mut s = FrameScheduler::new();
        assert!(s.is_running());
        assert!(!s.is_pending());
        assert!(!s.take_frame());
    }
}
