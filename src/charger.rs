//! Charger side of the mode bus.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use max77818::{
    charger::{Charger, ChargerMode},
    Error,
};
use register_access::RegisterAccess;

use crate::bus::{ModeCode, ModeSubscriber};

/// Owns the charger and applies mode codes received from the bus.
pub struct ChargerModeSubscriber<M: RawMutex, R> {
    charger: Mutex<M, RefCell<Charger<R>>>,
}

impl<M: RawMutex, R> ChargerModeSubscriber<M, R> {
    pub const fn new(charger: Charger<R>) -> Self {
        Self {
            charger: Mutex::new(RefCell::new(charger)),
        }
    }

    /// Runs `f` with exclusive access to the charger. Returns `None` if the
    /// charger is already in use on this flow.
    pub fn with_charger<T>(&self, f: impl FnOnce(&mut Charger<R>) -> T) -> Option<T> {
        self.charger.lock(|charger| {
            let mut charger = charger.try_borrow_mut().ok()?;
            Some(f(&mut charger))
        })
    }

    pub fn into_inner(self) -> Charger<R> {
        self.charger.into_inner().into_inner()
    }
}

/// Whether `code` is a value the bus or the CNFG_00 mode field defines.
pub fn is_known_mode(code: u8) -> bool {
    ModeCode::from_code(code).is_some() || ChargerMode::from_code(code).is_some()
}

impl<M, R, E> ModeSubscriber for ChargerModeSubscriber<M, R>
where
    M: RawMutex,
    R: RegisterAccess<u8, Error = E>,
{
    fn on_mode(&self, code: u8) {
        info!("Charger mode {} requested", code);

        if !is_known_mode(code) {
            warn!("Unrecognized mode code {}, writing {:#x}", code, code & 0x0F);
        }

        match self.with_charger(|charger| charger.set_mode(code)) {
            Some(Ok(())) => {}
            Some(Err(Error::Transport(_))) => error!("Failed to write charger mode"),
            Some(Err(_)) => error!("Charger rejected mode {}", code),
            None => warn!("Charger busy, mode {} dropped", code),
        }
    }
}
