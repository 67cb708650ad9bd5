#![no_std]

use core::{convert::TryFrom, marker::PhantomData};

pub trait RegisterWidthType: Copy + PartialEq {
    const WIDTH: u8;

    fn from_32(data: u32) -> Self;
    fn to_32(self) -> u32;
}

impl RegisterWidthType for u8 {
    const WIDTH: u8 = 8;

    fn from_32(data: u32) -> Self {
        debug_assert!(data <= u8::MAX as u32);
        data as u8
    }

    fn to_32(self) -> u32 {
        self as u32
    }
}

impl RegisterWidthType for u16 {
    const WIDTH: u8 = 16;

    fn from_32(data: u32) -> Self {
        debug_assert!(data <= u16::MAX as u32);
        data as u16
    }

    fn to_32(self) -> u32 {
        self as u32
    }
}

/// A typed view of a raw register word.
pub trait Proxy: Copy {
    type RegisterWidth: RegisterWidthType;

    fn bits(&self) -> Self::RegisterWidth;
    fn from_bits(bits: Self::RegisterWidth) -> Self;
}

pub trait ReadOnlyRegister: Proxy {
    const ADDRESS: u8;
    const NAME: &'static str;
}

/// Registers that declare a reset value are writable.
pub trait Register: ReadOnlyRegister {
    const DEFAULT_VALUE: Self::RegisterWidth;

    /// Builds a register value starting from the reset value.
    #[inline(always)]
    fn new(f: impl FnOnce(Self) -> Self) -> Self {
        f(Self::from_bits(Self::DEFAULT_VALUE))
    }

    #[inline(always)]
    fn modify(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }
}

/// A `WIDTH` bit wide slice of a register, starting at bit `POS`.
pub struct Field<const POS: u8, const WIDTH: u8, DataType, P> {
    _marker: PhantomData<DataType>,
    reg: P,
}

impl<const POS: u8, const WIDTH: u8, DataType, P> Field<POS, WIDTH, DataType, P>
where
    DataType: TryFrom<P::RegisterWidth> + Into<P::RegisterWidth>,
    P: Proxy,
{
    const MASK: u32 = (1 << WIDTH) - 1;

    #[inline(always)]
    pub fn new(reg: P) -> Self {
        Field {
            _marker: PhantomData,
            reg,
        }
    }

    /// The field's bits in register position, usable as an `update_bits` mask.
    #[inline(always)]
    pub fn mask() -> P::RegisterWidth {
        P::RegisterWidth::from_32(Self::MASK << POS)
    }

    #[inline(always)]
    pub fn read_field_bits(&self) -> P::RegisterWidth {
        P::RegisterWidth::from_32((self.reg.bits().to_32() >> POS) & Self::MASK)
    }

    /// Returns `None` if the bits don't encode a known `DataType` value.
    #[inline(always)]
    pub fn read(&self) -> Option<DataType> {
        DataType::try_from(self.read_field_bits()).ok()
    }

    /// Mask and register bits for a read-modify-write of this field alone.
    #[inline(always)]
    pub fn update_bits(self, value: DataType) -> (P::RegisterWidth, P::RegisterWidth) {
        (Self::mask(), self.write(value).bits())
    }

    #[inline(always)]
    pub fn write(self, value: DataType) -> P {
        let value = value.into().to_32();
        debug_assert!(value <= Self::MASK);

        let cleared = self.reg.bits().to_32() & !(Self::MASK << POS);
        P::from_bits(P::RegisterWidth::from_32(
            cleared | ((value & Self::MASK) << POS),
        ))
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! field_width {
    ($pos:literal) => {
        1
    };
    ($pos:literal .. $end:literal) => {
        $end - $pos
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! field_enum {
    ($type:ident { $($name:ident = $value:literal),+ }) => {
        #[derive(Debug, PartialEq, Eq, Copy, Clone)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $type {
            $($name = $value),+
        }

        impl core::convert::TryFrom<u8> for $type {
            type Error = u8;

            fn try_from(data: u8) -> ::core::result::Result<Self, Self::Error> {
                match data {
                    $($value => ::core::result::Result::Ok($type::$name),)+
                    _ => ::core::result::Result::Err(data),
                }
            }
        }

        impl core::convert::TryFrom<u16> for $type {
            type Error = u16;

            fn try_from(data: u16) -> ::core::result::Result<Self, Self::Error> {
                match data {
                    $($value => ::core::result::Result::Ok($type::$name),)+
                    _ => ::core::result::Result::Err(data),
                }
            }
        }

        impl From<$type> for u8 {
            fn from(data: $type) -> u8 {
                data as u8
            }
        }

        impl From<$type> for u16 {
            fn from(data: $type) -> u16 {
                data as u16
            }
        }
    };
}

#[macro_export]
macro_rules! register {
    (
        $(#[$reg_attr:meta])*
        $reg:ident($rwt:ident @ $addr:literal $(, default = $default:literal)?) {
            $(
                $(#[$field_attr:meta])*
                $field:ident @ $pos:literal $(.. $end:literal)? => $type:ident $({
                    $($name:ident = $value:literal),+ $(,)?
                })?
            ),* $(,)?
        }
    ) => {
        $(#[$reg_attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        #[must_use]
        #[allow(non_camel_case_types)]
        pub struct $reg {
            value: $rwt,
        }

        impl $crate::Proxy for $reg {
            type RegisterWidth = $rwt;

            #[inline(always)]
            fn bits(&self) -> $rwt {
                self.value
            }

            #[inline(always)]
            fn from_bits(bits: $rwt) -> Self {
                Self { value: bits }
            }
        }

        impl $crate::ReadOnlyRegister for $reg {
            const ADDRESS: u8 = $addr;
            const NAME: &'static str = stringify!($reg);
        }

        $(
            impl $crate::Register for $reg {
                const DEFAULT_VALUE: $rwt = $default;
            }

            impl Default for $reg {
                #[inline(always)]
                fn default() -> Self {
                    Self { value: $default }
                }
            }
        )?

        #[allow(dead_code)]
        impl $reg {
            $(
                $(#[$field_attr])*
                #[inline(always)]
                #[allow(non_snake_case)]
                pub fn $field(
                    self,
                ) -> $crate::Field<$pos, { $crate::field_width!($pos $(.. $end)?) }, $type, Self> {
                    $crate::Field::new(self)
                }
            )*
        }

        $($(
            $crate::field_enum!($type { $($name = $value),+ });
        )?)*
    };
}

/// Declares a register space.
///
/// ```ignore
/// device! {
///     Status(u16 @ 0x00, default = 0x0002) {
///         tmx @ 13 => Alert { Alert = 1, NoAlert = 0 },
///         tmn @ 9 => Alert,
///         por @ 1 => PowerOnReset { Reset = 1, NoReset = 0 }
///     }
///     Temp(u16 @ 0x08) {}
/// }
/// ```
///
/// A field enum is declared once, at its first use. Registers without a
/// `default` are read-only.
#[macro_export]
macro_rules! device {
    ($(
        $(#[$reg_attr:meta])*
        $reg:ident($($proto:tt)*) {
            $($fields:tt)*
        }
    )*) => {
        $(
            $crate::register! {
                $(#[$reg_attr])*
                $reg($($proto)*) { $($fields)* }
            }
        )*
    };
}

#[cfg(test)]
mod test {
    use super::*;

    device! {
        /// Status flags
        Status(u16 @ 0x00, default = 0x0002) {
            tmx @ 13 => Alert {
                Alert = 1,
                NoAlert = 0
            },
            tmn @ 9 => Alert,
            por @ 1 => PowerOnReset {
                Reset = 1,
                NoReset = 0
            }
        }
        Mode(u8 @ 0xB7, default = 0x04) {
            mode @ 0..4 => u8,
            wdten @ 4 => Watchdog {
                Disabled = 0,
                Enabled = 1
            }
        }
        Id(u8 @ 0x20) {}
    }

    #[test]
    fn register_constants() {
        assert_eq!(Status::ADDRESS, 0x00);
        assert_eq!(Status::NAME, "Status");
        assert_eq!(Mode::DEFAULT_VALUE, 0x04);
        assert_eq!(Id::ADDRESS, 0x20);
        assert_eq!(Status::default().bits(), 0x0002);
    }

    #[test]
    fn read_fields() {
        let status = Status::from_bits(0x2202);

        assert_eq!(status.tmx().read(), Some(Alert::Alert));
        assert_eq!(status.tmn().read(), Some(Alert::Alert));
        assert_eq!(status.por().read(), Some(PowerOnReset::Reset));

        let mode = Mode::from_bits(0x1C);
        assert_eq!(mode.mode().read(), Some(0x0C));
        assert_eq!(mode.wdten().read(), Some(Watchdog::Enabled));
    }

    #[test]
    fn write_preserves_other_bits() {
        let status = Status::from_bits(0xFFFF).tmx().write(Alert::NoAlert);
        assert_eq!(status.bits(), 0xDFFF);

        let mode = Mode::new(|r| r.mode().write(0x05));
        assert_eq!(mode.bits(), 0x05);

        let mode = mode.modify(|r| r.wdten().write(Watchdog::Enabled));
        assert_eq!(mode.bits(), 0x15);
    }

    #[test]
    fn field_mask() {
        assert_eq!(Field::<0, 4, u8, Mode>::mask(), 0x0F);
        assert_eq!(Field::<13, 1, Alert, Status>::mask(), 0x2000);
    }

    #[test]
    fn update_bits_pair() {
        let (mask, bits) = Mode::from_bits(0).mode().update_bits(0x05);
        assert_eq!((mask, bits), (0x0F, 0x05));

        let (mask, bits) = Status::from_bits(0).tmn().update_bits(Alert::Alert);
        assert_eq!((mask, bits), (0x0200, 0x0200));
    }

    #[test]
    fn unknown_enum_value() {
        assert_eq!(Alert::try_from(2u8), Err(2));
        assert_eq!(u16::from(PowerOnReset::Reset), 1);
    }
}
