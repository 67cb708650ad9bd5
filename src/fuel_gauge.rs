//! The fuel gauge as seen by the rest of the system: startup, alert handling
//! and the learned parameter surface.

use embedded_hal::delay::DelayNs;
use max77818::{
    calibration::{LearnedField, LearnedParams},
    descriptors::fg::Alert,
    init::{FuelGaugeConfig, InitOutcome},
    telemetry::{Property, PropertyValue},
    Error, FuelGauge,
};
use register_access::RegisterAccess;

use crate::{
    bus::ModePublisher,
    shutdown::{ShutdownTimer, CRITICAL_SHUTDOWN_DELAY},
    thermal::{AlertBands, ShutdownAction, ThermalMonitor, ThermalState, Transition},
    IrqResult,
};

/// Trigger value that restores the learned parameters.
pub const RESTORE_TRIGGER: u32 = 1;

pub struct FuelGaugeDevice<'a, R, P: ?Sized, T> {
    gauge: FuelGauge<R>,
    thermal: ThermalMonitor,
    publisher: &'a P,
    shutdown: T,
    learned: LearnedParams,
}

impl<'a, R, P, T, E> FuelGaugeDevice<'a, R, P, T>
where
    R: RegisterAccess<u16, Error = E>,
    P: ModePublisher + ?Sized,
    T: ShutdownTimer,
{
    pub fn new(gauge: FuelGauge<R>, bands: AlertBands, publisher: &'a P, shutdown: T) -> Self {
        Self {
            gauge,
            thermal: ThermalMonitor::new(bands),
            publisher,
            shutdown,
            learned: LearnedParams::default(),
        }
    }

    /// Configures the gauge if it was reset, arms the temperature alerts and
    /// announces the current mode.
    pub fn start(
        &mut self,
        config: &FuelGaugeConfig,
        delay: &mut impl DelayNs,
    ) -> Result<InitOutcome, Error<E>> {
        let outcome = self.gauge.reg_init(config, delay)?;

        let threshold = self.thermal.reset();
        self.gauge.enable_alerts(threshold)?;

        self.sync_mode();

        Ok(outcome)
    }

    /// Publishes the mode matching the current thermal state.
    pub fn sync_mode(&self) {
        let state = self.thermal.state();
        debug!("Announcing {} temperature mode", state.name());
        self.publisher.publish_mode(state.mode());
    }

    pub fn thermal_state(&self) -> ThermalState {
        self.thermal.state()
    }

    pub fn gauge_mut(&mut self) -> &mut FuelGauge<R> {
        &mut self.gauge
    }

    pub(crate) fn gauge_and_publisher(&mut self) -> (&mut FuelGauge<R>, &'a P) {
        (&mut self.gauge, self.publisher)
    }

    pub fn shutdown_timer_mut(&mut self) -> &mut T {
        &mut self.shutdown
    }

    pub fn handle_interrupt(&mut self) -> IrqResult {
        let Ok(status) = self.gauge.read_status() else {
            warn!("Failed to read fuel gauge status");
            return IrqResult::NotHandled;
        };

        if status.dSOCi().read() == Some(Alert::Alert) {
            match (self.gauge.capacity(), self.gauge.voltage_now()) {
                (Ok(soc), Ok(vcell)) => info!("SOC changed: {}%, VCELL {} uV", soc, vcell),
                _ => warn!("Failed to read SOC"),
            }
        }

        let below_min = status.tmn().read() == Some(Alert::Alert);
        let above_max = status.tmx().read() == Some(Alert::Alert);

        if below_min || above_max {
            if let Ok(temperature) = self.gauge.temperature() {
                warn!("Temperature alert at {} dC", temperature);
            }

            if let Some(transition) = self.thermal.on_alert(below_min, above_max) {
                if self.apply(transition).is_err() {
                    error!("Failed to reprogram temperature alert");
                    return IrqResult::NotHandled;
                }
                self.thermal.commit(&transition);
            }
        }

        if self.gauge.clear_status().is_err() {
            warn!("Failed to clear fuel gauge status");
            return IrqResult::NotHandled;
        }

        IrqResult::Handled
    }

    fn apply(&mut self, transition: Transition) -> Result<(), Error<E>> {
        self.gauge.set_temperature_alert(transition.threshold)?;

        if transition.to != transition.from {
            warn!(
                "Temperature state {} -> {}",
                transition.from.name(),
                transition.to.name()
            );
        }

        if let Some(mode) = transition.publish {
            self.publisher.publish_mode(mode);
        }

        match transition.shutdown {
            ShutdownAction::Arm => {
                error!(
                    "Critical {} temperature, shutting down in {} ms",
                    transition.to.name(),
                    CRITICAL_SHUTDOWN_DELAY.to_millis()
                );
                self.shutdown.arm(CRITICAL_SHUTDOWN_DELAY);
            }
            ShutdownAction::Cancel => self.shutdown.cancel(),
            ShutdownAction::None => {}
        }

        Ok(())
    }

    /// Reads `field` from the gauge into the record.
    pub fn learned(&mut self, field: LearnedField) -> Result<u16, Error<E>> {
        let value = self.gauge.read_learned(field)?;
        self.learned.set(field, value);
        Ok(value)
    }

    /// Updates the record only. The gauge is written by [`Self::trigger_restore`].
    pub fn set_learned(&mut self, field: LearnedField, value: u16) {
        self.learned.set(field, value);
    }

    pub fn learned_params(&self) -> &LearnedParams {
        &self.learned
    }

    /// Writes the record back into the gauge when `trigger` is
    /// [`RESTORE_TRIGGER`]. Other values are ignored.
    pub fn trigger_restore(
        &mut self,
        trigger: u32,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<E>> {
        if trigger != RESTORE_TRIGGER {
            debug!("Ignoring restore trigger {}", trigger);
            return Ok(());
        }

        let params = self.learned;
        let result = self.gauge.restore_learned(&params, delay);
        if let Err(Error::VerificationMismatch { address, .. }) = result {
            let name = LearnedField::from_address(address).map_or("accumulator", |f| f.name());
            warn!("Restoring {} failed", name);
        }

        result
    }

    pub fn read_property(&mut self, property: Property) -> Result<PropertyValue, Error<E>> {
        self.gauge.read_property(property)
    }

    pub fn ain0(&mut self) -> Result<u16, Error<E>> {
        self.gauge.ain0()
    }
}
