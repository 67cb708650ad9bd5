//! Routes the shared PMIC interrupt line to the blocks that raised it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use max77818::system::{PendingSources, Pmic};
use register_access::RegisterAccess;

use crate::{
    bus::ModePublisher, charger::ChargerModeSubscriber, fuel_gauge::FuelGaugeDevice,
    shutdown::ShutdownTimer, IrqResult,
};

/// Services every pending source. Returns `NotHandled` if INTSRC can't be read
/// or no serviced source handled its interrupt.
pub fn dispatch_interrupt<RP, RF, RC, P, T, M>(
    pmic: &mut Pmic<RP>,
    fuel_gauge: &mut FuelGaugeDevice<'_, RF, P, T>,
    charger: &ChargerModeSubscriber<M, RC>,
) -> IrqResult
where
    RP: RegisterAccess<u8>,
    RF: RegisterAccess<u16>,
    RC: RegisterAccess<u8>,
    P: ModePublisher + ?Sized,
    T: ShutdownTimer,
    M: RawMutex,
{
    let pending = match pmic.pending_sources() {
        Ok(pending) => pending,
        Err(_) => {
            warn!("Failed to read interrupt sources");
            return IrqResult::NotHandled;
        }
    };

    dispatch_pending(pending, fuel_gauge, charger)
}

fn dispatch_pending<RF, RC, P, T, M>(
    pending: PendingSources,
    fuel_gauge: &mut FuelGaugeDevice<'_, RF, P, T>,
    charger: &ChargerModeSubscriber<M, RC>,
) -> IrqResult
where
    RF: RegisterAccess<u16>,
    RC: RegisterAccess<u8>,
    P: ModePublisher + ?Sized,
    T: ShutdownTimer,
    M: RawMutex,
{
    let mut result = IrqResult::NotHandled;

    if pending.system {
        debug!("System interrupt pending");
    }

    if pending.fuel_gauge && fuel_gauge.handle_interrupt() == IrqResult::Handled {
        result = IrqResult::Handled;
    }

    if pending.charger {
        match charger.with_charger(|charger| charger.handle_interrupt()) {
            Some(Ok(_)) => result = IrqResult::Handled,
            Some(Err(_)) => warn!("Failed to read charger interrupts"),
            None => warn!("Charger busy, interrupt deferred"),
        }
    }

    result
}
