//! Deferred power-off for sustained critical temperatures.

use fugit::{MillisDurationU64, TimerInstantU64};

pub type Instant = TimerInstantU64<1000>;
pub type Duration = MillisDurationU64;

/// How long a critical temperature may persist before the system is powered off.
pub const CRITICAL_SHUTDOWN_DELAY: Duration = Duration::secs(30);

/// A one-shot shutdown. Arming replaces any pending instance.
pub trait ShutdownTimer {
    fn arm(&mut self, delay: Duration);
    fn cancel(&mut self);
}

impl<T: ShutdownTimer + ?Sized> ShutdownTimer for &mut T {
    fn arm(&mut self, delay: Duration) {
        (**self).arm(delay)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

pub trait PowerControl {
    /// Irreversible.
    fn request_shutdown(&mut self);
}

pub struct DeferredShutdown<C, P> {
    clock: C,
    power: P,
    deadline: Option<Instant>,
    fired: bool,
}

impl<C, P> DeferredShutdown<C, P>
where
    C: Clock,
    P: PowerControl,
{
    pub const fn new(clock: C, power: P) -> Self {
        Self {
            clock,
            power,
            deadline: None,
            fired: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Requests the power-off if the deadline has passed. Returns `true` when
    /// this call fired the shutdown.
    pub fn poll(&mut self) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };

        if self.clock.now() < deadline {
            return false;
        }

        self.deadline = None;
        self.fired = true;

        error!("Critical temperature persisted, shutting down");
        self.power.request_shutdown();

        true
    }

    pub fn power(&self) -> &P {
        &self.power
    }
}

impl<C, P> ShutdownTimer for DeferredShutdown<C, P>
where
    C: Clock,
    P: PowerControl,
{
    fn arm(&mut self, delay: Duration) {
        if self.fired {
            return;
        }

        let deadline = self.clock.now() + delay;
        if self.deadline.replace(deadline).is_some() {
            debug!("Replacing pending shutdown");
        }
        error!("Shutdown armed, {} ms", delay.to_millis());
    }

    fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            info!("Pending shutdown cancelled");
        }
    }
}
