/// Something that can call us back once on the next display refresh.
/// In the browser this is `requestAnimationFrame`.
pub trait FrameScheduler {
    type Handle;

    /// Ask for one callback. `None` means the request could not be made.
    fn request_frame(&mut self) -> Option<Self::Handle>;

    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Run/stop state of the per-frame loop.
///
/// At most one frame request is outstanding at any time, so calling
/// [`start`](Self::start) twice never produces two interleaved loops, and
/// [`stop`](Self::stop) cancels the pending request so no further frames fire.
pub struct AnimationLoop<S: FrameScheduler> {
    scheduler: S,
    pending: Option<S::Handle>,
    running: bool,
}

impl<S: FrameScheduler> AnimationLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            pending: None,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Begin requesting frames. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.schedule();
        log::info!("animation loop started");
        true
    }

    /// Stop and cancel the pending frame. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        if !self.running {
            return false;
        }
        self.running = false;
        log::info!("animation loop stopped");
        true
    }

    /// Call from the frame callback. Requests the next frame and returns
    /// true if the caller should run a tick now.
    pub fn on_frame(&mut self) -> bool {
        self.pending = None;
        if !self.running {
            return false;
        }
        self.schedule();
        true
    }

    fn schedule(&mut self) {
        if self.pending.is_some() {
            return;
        }
        self.pending = self.scheduler.request_frame();
        if self.pending.is_none() {
            log::warn!("frame request failed; loop will stall until restarted");
        }
    }
}

/// Scheduler that only records requests. For headless hosts and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u32,
    outstanding: Vec<u32>,
    cancelled: Vec<u32>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests made and not yet cancelled or fired.
    pub fn outstanding(&self) -> &[u32] {
        &self.outstanding
    }

    pub fn cancelled(&self) -> &[u32] {
        &self.cancelled
    }

    /// Simulate the display firing the oldest request.
    pub fn fire(&mut self) -> Option<u32> {
        if self.outstanding.is_empty() {
            None
        } else {
            Some(self.outstanding.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    type Handle = u32;

    fn request_frame(&mut self) -> Option<u32> {
        self.next += 1;
        self.outstanding.push(self.next);
        Some(self.next)
    }

    fn cancel_frame(&mut self, handle: u32) {
        self.outstanding.retain(|&h| h != handle);
        self.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frame(lp: &mut AnimationLoop<ManualScheduler>) -> bool {
        match lp.scheduler_mut().fire() {
            Some(_) => lp.on_frame(),
            None => false,
        }
    }

    #[test]
    fn start_requests_one_frame() {
        let mut lp = AnimationLoop::new(ManualScheduler::new());
        assert!(lp.start());
        assert!(lp.is_running());
        assert_eq!(lp.scheduler().outstanding().len(), 1);
    }

    #[test]
    fn double_start_does_not_double_schedule() {
        let mut lp = AnimationLoop::new(ManualScheduler::new());
        lp.start();
        assert!(!lp.start());
        assert_eq!(lp.scheduler().outstanding().len(), 1);
    }

    #[test]
    fn each_frame_requests_the_next() {
        let mut lp = AnimationLoop::new(ManualScheduler::new());
        lp.start();
        for _ in 0..5 {
            assert!(run_frame(&mut lp));
            assert_eq!(lp.scheduler().outstanding().len(), 1);
        }
    }

    #[test]
    fn stop_cancels_pending_and_is_idempotent() {
        let mut lp = AnimationLoop::new(ManualScheduler::new());
        lp.start();
        assert!(lp.stop());
        assert!(lp.scheduler().outstanding().is_empty());
        assert_eq!(lp.scheduler().cancelled(), &[1]);
        assert!(!lp.has_pending_frame());
        assert!(!lp.stop());
        assert!(!run_frame(&mut lp));
    }

    #[test]
    fn stale_callback_after_stop_does_not_tick() {
        let mut lp = AnimationLoop::new(ManualScheduler::new());
        lp.start();
        lp.stop();
        // a callback that was already in flight when we stopped
        assert!(!lp.on_frame());
        assert!(lp.scheduler().outstanding().is_empty());
    }

    #[test]
    fn restart_after_stop() {
        let mut lp = AnimationLoop::new(ManualScheduler::new());
        lp.start();
        lp.stop();
        assert!(lp.start());
        assert_eq!(lp.scheduler().outstanding(), &[2]);
    }
}
