//! Decoded fuel gauge measurements.

use device_descriptor::{Proxy, ReadOnlyRegister};
use register_access::RegisterAccess;

use crate::{
    charger::ChargeStatus,
    codec::{self, CapacityLevel},
    descriptors::fg,
    Error, FuelGauge,
};

pub const MODEL_NAME: &str = "max77818-fuelgauge";
pub const MANUFACTURER: &str = "maxim";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Property {
    Status,
    CycleCount,
    VoltageNow,
    VoltageAvg,
    VoltageOcv,
    VoltageMax,
    VoltageMin,
    CurrentNow,
    CurrentAvg,
    ChargeFullDesign,
    ChargeFull,
    ChargeNow,
    ChargeAvg,
    Capacity,
    CapacityLevel,
    Temp,
    TempMax,
    TempMin,
    TimeToEmptyNow,
    TimeToFullNow,
    ModelName,
    Manufacturer,
}

impl Property {
    pub const ALL: [Self; 22] = [
        Self::Status,
        Self::CycleCount,
        Self::VoltageNow,
        Self::VoltageAvg,
        Self::VoltageOcv,
        Self::VoltageMax,
        Self::VoltageMin,
        Self::CurrentNow,
        Self::CurrentAvg,
        Self::ChargeFullDesign,
        Self::ChargeFull,
        Self::ChargeNow,
        Self::ChargeAvg,
        Self::Capacity,
        Self::CapacityLevel,
        Self::Temp,
        Self::TempMax,
        Self::TempMin,
        Self::TimeToEmptyNow,
        Self::TimeToFullNow,
        Self::ModelName,
        Self::Manufacturer,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PropertyValue {
    Status(ChargeStatus),
    Count(u16),
    Microvolts(u32),
    Microamps(i32),
    MicroampHours(u32),
    Percent(u8),
    Level(CapacityLevel),
    /// Tenths of a degree Celsius.
    DeciCelsius(i32),
    Seconds(u32),
    Text(&'static str),
}

impl<R, E> FuelGauge<R>
where
    R: RegisterAccess<u16, Error = E>,
{
    pub fn read_property(&mut self, property: Property) -> Result<PropertyValue, Error<E>> {
        let value = match property {
            Property::Status => PropertyValue::Status(ChargeStatus::Unknown),
            Property::CycleCount => PropertyValue::Count(self.cycle_count()?),
            Property::VoltageNow => PropertyValue::Microvolts(self.voltage_now()?),
            Property::VoltageAvg => PropertyValue::Microvolts(self.voltage_avg()?),
            Property::VoltageOcv => PropertyValue::Microvolts(self.voltage_ocv()?),
            Property::VoltageMax => PropertyValue::Microvolts(self.voltage_max()?),
            Property::VoltageMin => PropertyValue::Microvolts(self.voltage_min()?),
            Property::CurrentNow => PropertyValue::Microamps(self.current_now()?),
            Property::CurrentAvg => PropertyValue::Microamps(self.current_avg()?),
            Property::ChargeFullDesign => PropertyValue::MicroampHours(self.design_charge()?),
            Property::ChargeFull => PropertyValue::MicroampHours(self.full_charge()?),
            Property::ChargeNow => PropertyValue::MicroampHours(self.charge_now()?),
            Property::ChargeAvg => PropertyValue::MicroampHours(self.charge_avg()?),
            Property::Capacity => PropertyValue::Percent(self.capacity()?),
            Property::CapacityLevel => PropertyValue::Level(self.capacity_level()?),
            Property::Temp => PropertyValue::DeciCelsius(self.temperature()?),
            Property::TempMax => PropertyValue::DeciCelsius(self.temperature_max()?),
            Property::TempMin => PropertyValue::DeciCelsius(self.temperature_min()?),
            Property::TimeToEmptyNow => PropertyValue::Seconds(self.time_to_empty()?),
            Property::TimeToFullNow => PropertyValue::Seconds(self.time_to_full()?),
            Property::ModelName => PropertyValue::Text(MODEL_NAME),
            Property::Manufacturer => PropertyValue::Text(MANUFACTURER),
        };

        Ok(value)
    }

    pub fn cycle_count(&mut self) -> Result<u16, Error<E>> {
        self.read(fg::Cycles::ADDRESS)
    }

    pub fn voltage_now(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::VCell::ADDRESS).map(codec::raw_voltage_to_uV)
    }

    pub fn voltage_avg(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::AvgVCell::ADDRESS).map(codec::raw_voltage_to_uV)
    }

    pub fn voltage_ocv(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::VFOCV::ADDRESS).map(codec::raw_voltage_to_uV)
    }

    pub fn voltage_max(&mut self) -> Result<u32, Error<E>> {
        let reg = self.regs.read_register::<fg::MaxMinVolt>()?;
        Ok(codec::raw_tracked_voltage_to_uV(reg.max().read_field_bits() as u8))
    }

    pub fn voltage_min(&mut self) -> Result<u32, Error<E>> {
        let reg = self.regs.read_register::<fg::MaxMinVolt>()?;
        Ok(codec::raw_tracked_voltage_to_uV(reg.min().read_field_bits() as u8))
    }

    pub fn current_now(&mut self) -> Result<i32, Error<E>> {
        self.read(fg::Current::ADDRESS).map(codec::raw_current_to_uA)
    }

    pub fn current_avg(&mut self) -> Result<i32, Error<E>> {
        self.read(fg::AvgCurrent::ADDRESS)
            .map(codec::raw_avg_current_to_uA)
    }

    pub fn design_charge(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::DesignCap::ADDRESS).map(codec::raw_capacity_to_uAh)
    }

    pub fn full_charge(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::FullCap::ADDRESS).map(codec::raw_capacity_to_uAh)
    }

    pub fn charge_now(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::RepCap::ADDRESS).map(codec::raw_capacity_to_uAh)
    }

    pub fn charge_avg(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::AvCap::ADDRESS).map(codec::raw_capacity_to_uAh)
    }

    /// Reported state of charge in whole percent.
    pub fn capacity(&mut self) -> Result<u8, Error<E>> {
        self.read(fg::RepSOC::ADDRESS).map(codec::raw_soc_to_percent)
    }

    pub fn capacity_level(&mut self) -> Result<CapacityLevel, Error<E>> {
        self.capacity().map(CapacityLevel::from_percent)
    }

    pub fn temperature(&mut self) -> Result<i32, Error<E>> {
        self.read(fg::Temp::ADDRESS)
            .map(codec::raw_temperature_to_decidegrees)
    }

    /// Highest temperature seen since the tracker was last reset.
    pub fn temperature_max(&mut self) -> Result<i32, Error<E>> {
        let reg = self.regs.read_register::<fg::MaxMinTemp>()?;
        Ok(codec::raw_tracked_temperature_to_decidegrees(
            reg.max().read_field_bits() as u8,
        ))
    }

    pub fn temperature_min(&mut self) -> Result<i32, Error<E>> {
        let reg = self.regs.read_register::<fg::MaxMinTemp>()?;
        Ok(codec::raw_tracked_temperature_to_decidegrees(
            reg.min().read_field_bits() as u8,
        ))
    }

    pub fn time_to_empty(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::TTE::ADDRESS).map(codec::raw_time_to_seconds)
    }

    pub fn time_to_full(&mut self) -> Result<u32, Error<E>> {
        self.read(fg::TTF::ADDRESS).map(codec::raw_time_to_seconds)
    }

    /// Raw temperature word, as compared against the TAlrtTh window.
    pub fn raw_temperature(&mut self) -> Result<u16, Error<E>> {
        let temp = self.regs.read_register::<fg::Temp>()?;
        Ok(temp.bits())
    }
}
