use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// How long `acquire_with` waits on the channel before pumping again.
const PUMP_INTERVAL: Duration = Duration::from_millis(1);

/// Limits how many frames the CPU may encode ahead of the GPU.
///
/// A counting semaphore with one permit per constant region. Each frame takes a
/// permit before it writes into its region and hands the returned [`FrameToken`]
/// to whatever learns that the GPU has finished with that frame. Dropping the
/// token gives the permit back.
///
/// ```
/// use scenepick::render::FrameThrottle;
///
/// let throttle = FrameThrottle::new(2);
/// let first = throttle.try_acquire().unwrap();
/// let _second = throttle.try_acquire().unwrap();
/// assert!(throttle.try_acquire().is_none());
///
/// drop(first);
/// assert!(throttle.try_acquire().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    slots: Sender<()>,
    completions: Receiver<()>,
    capacity: usize,
}

impl FrameThrottle {
    pub fn new(capacity: usize) -> Self {
        let (slots, completions) = bounded(capacity);
        Self {
            slots,
            completions,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Take a permit if one is free.
    pub fn try_acquire(&self) -> Option<FrameToken> {
        match self.slots.try_send(()) {
            Ok(()) => Some(self.token()),
            Err(TrySendError::Full(())) => None,
            // We hold a receiver ourselves, so the channel never disconnects.
            Err(TrySendError::Disconnected(())) => None,
        }
    }

    /// Block until a permit is free.
    ///
    /// `pump` runs between waits. Completion callbacks that release tokens are
    /// often only delivered while something polls the device, so the caller
    /// passes that poll here.
    pub fn acquire_with(&self, mut pump: impl FnMut()) -> FrameToken {
        loop {
            match self.slots.send_timeout((), PUMP_INTERVAL) {
                Ok(()) => return self.token(),
                Err(_) => pump(),
            }
        }
    }

    fn token(&self) -> FrameToken {
        FrameToken {
            completions: self.completions.clone(),
        }
    }
}

/// A held permit from a [`FrameThrottle`]. Releases the permit on drop.
#[derive(Debug)]
#[must_use = "dropping the token immediately releases the frame slot"]
pub struct FrameToken {
    completions: Receiver<()>,
}

impl Drop for FrameToken {
    fn drop(&mut self) {
        let _ = self.completions.try_recv();
    }
}
