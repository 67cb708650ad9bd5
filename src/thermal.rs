//! Temperature band tracking driven by the fuel gauge temperature alerts.

use crate::bus::ModeCode;

/// Alert window that only triggers at the sensor limits: max 127 C, min -128 C.
pub const EMERGENCY_BAND: u16 = 0x7F80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermalState {
    Low,
    Normal,
    High,
}

impl ThermalState {
    pub const fn name(self) -> &'static str {
        match self {
            ThermalState::Low => "low",
            ThermalState::Normal => "normal",
            ThermalState::High => "high",
        }
    }

    /// The mode the charger should run in while in this state.
    pub fn mode(self) -> ModeCode {
        match self {
            ThermalState::Normal => ModeCode::Normal,
            ThermalState::Low | ThermalState::High => ModeCode::Reduced,
        }
    }
}

/// TAlrtTh windows bracketing each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertBands {
    pub low: u16,
    pub normal: u16,
    pub high: u16,
}

impl AlertBands {
    pub fn for_state(&self, state: ThermalState) -> u16 {
        match state {
            ThermalState::Low => self.low,
            ThermalState::Normal => self.normal,
            ThermalState::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownAction {
    None,
    Arm,
    Cancel,
}

/// What the owner of the alert registers has to do after an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: ThermalState,
    pub to: ThermalState,
    /// New TAlrtTh value.
    pub threshold: u16,
    pub publish: Option<ModeCode>,
    pub shutdown: ShutdownAction,
}

pub struct ThermalMonitor {
    state: ThermalState,
    bands: AlertBands,
}

impl ThermalMonitor {
    pub const fn new(bands: AlertBands) -> Self {
        Self {
            state: ThermalState::Normal,
            bands,
        }
    }

    pub fn state(&self) -> ThermalState {
        self.state
    }

    pub fn bands(&self) -> &AlertBands {
        &self.bands
    }

    /// Back to NORMAL, returning the window to program.
    pub fn reset(&mut self) -> u16 {
        self.state = ThermalState::Normal;
        self.bands.normal
    }

    /// Picks the transition for a temperature alert without taking it. The
    /// below-minimum flag wins if both are set. Returns `None` if neither flag
    /// is set.
    pub fn on_alert(&self, below_min: bool, above_max: bool) -> Option<Transition> {
        let from = self.state;

        let transition = match (from, below_min, above_max) {
            (_, false, false) => return None,

            (ThermalState::Low, true, _) | (ThermalState::High, false, true) => Transition {
                from,
                to: from,
                threshold: EMERGENCY_BAND,
                publish: None,
                shutdown: ShutdownAction::Arm,
            },

            (ThermalState::Low, false, true) | (ThermalState::High, true, _) => Transition {
                from,
                to: ThermalState::Normal,
                threshold: self.bands.normal,
                publish: Some(ModeCode::Normal),
                shutdown: ShutdownAction::Cancel,
            },

            (ThermalState::Normal, true, _) => Transition {
                from,
                to: ThermalState::Low,
                threshold: self.bands.low,
                publish: Some(ModeCode::Reduced),
                shutdown: ShutdownAction::None,
            },

            (ThermalState::Normal, false, true) => Transition {
                from,
                to: ThermalState::High,
                threshold: self.bands.high,
                publish: Some(ModeCode::Reduced),
                shutdown: ShutdownAction::None,
            },
        };

        Some(transition)
    }

    /// Enters the state of a transition once its side effects are applied.
    pub fn commit(&mut self, transition: &Transition) {
        self.state = transition.to;
    }
}
