//! Conversions between raw fuel gauge register words and physical units.

/// Magnitude of a negative 16 bit two's complement word.
#[inline]
fn negative_magnitude(raw: u16) -> u32 {
    ((!raw & 0x7FFF) as u32) + 1
}

#[inline]
fn is_negative(raw: u16) -> bool {
    raw & 0x8000 != 0
}

/// Converts a VCell, AvgVCell or VFOCV word to μV.
///
/// ```rust
/// # use max77818::codec::raw_voltage_to_uV;
/// assert_eq!(raw_voltage_to_uV(0), 0);
/// assert_eq!(raw_voltage_to_uV(0x1000), 320_000);
/// assert_eq!(raw_voltage_to_uV(0xFFFF), 5_119_921);
/// ```
#[allow(non_snake_case)]
#[inline]
pub fn raw_voltage_to_uV(raw: u16) -> u32 {
    (raw as u32 * 625) / 8
}

/// Converts the Current register to μA. Negative values mean discharge.
///
/// ```rust
/// # use max77818::codec::raw_current_to_uA;
/// assert_eq!(raw_current_to_uA(0), 0);
/// assert_eq!(raw_current_to_uA(1), 156);
/// assert_eq!(raw_current_to_uA(0xFFFF), -156);
/// ```
#[allow(non_snake_case)]
#[inline]
pub fn raw_current_to_uA(raw: u16) -> i32 {
    if is_negative(raw) {
        -((negative_magnitude(raw) as i64 * 15625 / 100) as i32)
    } else {
        (raw as i64 * 15625 / 100) as i32
    }
}

/// Converts the AvgCurrent register to μA.
///
/// ```rust
/// # use max77818::codec::raw_avg_current_to_uA;
/// assert_eq!(raw_avg_current_to_uA(2), 312);
/// assert_eq!(raw_avg_current_to_uA(0xFFFE), -312);
/// ```
#[allow(non_snake_case)]
#[inline]
pub fn raw_avg_current_to_uA(raw: u16) -> i32 {
    if is_negative(raw) {
        -((negative_magnitude(raw) as i64 * 156250 / 1000) as i32)
    } else {
        (raw as i64 * 156250 / 1000) as i32
    }
}

/// Converts the Temp register to tenths of a degree Celsius.
///
/// ```rust
/// # use max77818::codec::raw_temperature_to_decidegrees;
/// assert_eq!(raw_temperature_to_decidegrees(0x1900), 250);
/// assert_eq!(raw_temperature_to_decidegrees(0xE700), -250);
/// ```
#[inline]
pub fn raw_temperature_to_decidegrees(raw: u16) -> i32 {
    if is_negative(raw) {
        -((negative_magnitude(raw) * 10 / 256) as i32)
    } else {
        (raw as u32 * 10 / 256) as i32
    }
}

/// Converts one byte of the MaxMinTemp register to tenths of a degree.
///
/// Negative values use the gauge's own linear fit, not a two's complement
/// decode.
///
/// ```rust
/// # use max77818::codec::raw_tracked_temperature_to_decidegrees;
/// assert_eq!(raw_tracked_temperature_to_decidegrees(25), 250);
/// assert_eq!(raw_tracked_temperature_to_decidegrees(0xFF), 10);
/// assert_eq!(raw_tracked_temperature_to_decidegrees(0x80), -1260);
/// ```
#[inline]
pub fn raw_tracked_temperature_to_decidegrees(raw: u8) -> i32 {
    if raw & 0x80 != 0 {
        -10 * ((!raw & 0x7F) as i32) + 10
    } else {
        raw as i32 * 10
    }
}

/// Converts one byte of the MaxMinVolt register to μV.
#[allow(non_snake_case)]
#[inline]
pub fn raw_tracked_voltage_to_uV(raw: u8) -> u32 {
    raw as u32 * 20_000
}

/// Converts a capacity register (DesignCap, FullCap, AvCap, RepCap) to μAh.
///
/// ```rust
/// # use max77818::codec::raw_capacity_to_uAh;
/// assert_eq!(raw_capacity_to_uAh(0), 0);
/// assert_eq!(raw_capacity_to_uAh(6000), 3_000_000);
/// ```
#[allow(non_snake_case)]
#[inline]
pub fn raw_capacity_to_uAh(raw: u16) -> u32 {
    raw as u32 * 500
}

/// Converts the TTE or TTF register to seconds.
///
/// The word holds hours in bits 10..16, 1.5 minute units in bits 4..10 and
/// 5.625 s units in bits 0..4.
///
/// ```rust
/// # use max77818::codec::raw_time_to_seconds;
/// assert_eq!(raw_time_to_seconds(0), 0);
/// assert_eq!(raw_time_to_seconds(1 << 10), 5760);
/// assert_eq!(raw_time_to_seconds(1 << 4), 90);
/// ```
#[inline]
pub fn raw_time_to_seconds(raw: u16) -> u32 {
    let raw = raw as u32;

    ((raw & 0xFC00) >> 10) * 5760 + ((raw & 0x03F0) >> 4) * 90 + (raw & 0x000F) * 5625 / 1000
}

/// Whole percent part of the RepSOC register.
#[inline]
pub fn raw_soc_to_percent(raw: u16) -> u8 {
    (raw >> 8) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapacityLevel {
    Unknown,
    Critical,
    Low,
    Normal,
    High,
    Full,
}

impl CapacityLevel {
    const FULL: u8 = 95;
    const HIGH: u8 = 80;
    const NORMAL: u8 = 20;
    const LOW: u8 = 5;
    const CRITICAL: u8 = 1;

    pub fn from_percent(soc: u8) -> Self {
        match soc {
            s if s >= Self::FULL => Self::Full,
            s if s >= Self::HIGH => Self::High,
            s if s >= Self::NORMAL => Self::Normal,
            s if s >= Self::LOW => Self::Low,
            s if s >= Self::CRITICAL => Self::Critical,
            _ => Self::Unknown,
        }
    }
}
