//! Register maps of the three MAX77818 register spaces.

/// Fuel gauge (ModelGauge m5) registers, 16 bit words.
pub mod fg {
    use device_descriptor::*;

    /// First word of the 48 word open-circuit-voltage model table.
    pub const OCV_TABLE_START: u8 = 0x80;

    device! {
        /// The Status register maintains all flags related to
        /// alert thresholds and battery insertion or removal.
        Status(u16 @ 0x00, default = 0x0002) {
            br @ 15 => BatteryRemoval {
                BatteryRemoved = 1,
                NoRemovalEvent = 0
            },
            smx @ 14 => Alert {
                Alert = 1,
                NoAlert = 0
            },
            /// Maximum temperature alert threshold exceeded.
            tmx @ 13 => Alert,
            vmx @ 12 => Alert,
            bi @ 11 => BatteryInsertion {
                BatteryInserted = 1,
                NoInsertionEvent = 0
            },
            smn @ 10 => Alert,
            /// Minimum temperature alert threshold exceeded.
            tmn @ 9 => Alert,
            vmn @ 8 => Alert,
            /// State of charge crossed an integer percentage boundary.
            dSOCi @ 7 => Alert,
            bst @ 3 => BatteryStatus {
                BatteryAbsent = 1,
                BatteryPresent = 0
            },
            /// Set on power-up. Cleared by software once the model is loaded.
            por @ 1 => PowerOnReset {
                Reset = 1,
                NoReset = 0
            }
        }
        /// Voltage alert thresholds: max in the high byte, min in the low byte.
        VAlrtTh(u16 @ 0x01, default = 0xFF00) {
            max @ 8..16 => u8,
            min @ 0..8 => u8
        }
        /// Temperature alert thresholds in signed 1 degree steps:
        /// max in the high byte, min in the low byte.
        TAlrtTh(u16 @ 0x02, default = 0x7F80) {
            max @ 8..16 => u8,
            min @ 0..8 => u8
        }
        /// State of charge alert thresholds: max in the high byte, min in the low byte.
        SAlrtTh(u16 @ 0x03, default = 0xFF00) {
            max @ 8..16 => u8,
            min @ 0..8 => u8
        }
        /// Host software should write the AtRate register with a negative two's-complement 16-bit
        /// value of a theoretical load current prior to reading any of the at-rate output registers.
        AtRate(u16 @ 0x04, default = 0x0000) {}
        /// Reported remaining capacity. Protected from making sudden jumps during load changes.
        RepCap(u16 @ 0x05, default = 0x0000) {}
        /// Reported state of charge, 1/256 % per LSB.
        RepSOC(u16 @ 0x06) {
            percent @ 8..16 => u8
        }
        Temp(u16 @ 0x08) {}
        VCell(u16 @ 0x09) {}
        Current(u16 @ 0x0A) {}
        AvgCurrent(u16 @ 0x0B) {}
        MixCap(u16 @ 0x0F) {}
        /// Temperature compensated full capacity.
        FullCap(u16 @ 0x10) {}
        /// Time to empty: hours, tens-of-minutes and fractional fields.
        TTE(u16 @ 0x11) {}
        QRTable00(u16 @ 0x12, default = 0x0000) {}
        FullSocThr(u16 @ 0x13, default = 0x5F05) {}
        /// Odometer style accumulation of battery cycles, 1% per LSB.
        Cycles(u16 @ 0x17, default = 0x0000) {}
        DesignCap(u16 @ 0x18, default = 0x0000) {}
        AvgVCell(u16 @ 0x19) {}
        /// Writing the default value restarts the tracker.
        MaxMinTemp(u16 @ 0x1A, default = 0x007F) {
            max @ 8..16 => u8,
            min @ 0..8 => u8
        }
        /// Max and min VCELL in 20 mV steps.
        MaxMinVolt(u16 @ 0x1B) {
            max @ 8..16 => u8,
            min @ 0..8 => u8
        }
        Config(u16 @ 0x1D, default = 0x2210) {
            /// (Temperature ALRT Sticky) => When TS = 1, temperature alerts can only be cleared
            /// through software.
            ts @ 13 => Bit {
                Set = 1,
                NotSet = 0
            },
            ten @ 9 => Bit,
            /// (Enable ALRT Pin Output) => When Aen = 1, violation of any of the alert threshold
            /// register values by temperature, voltage, current, or SOC triggers an alert.
            aen @ 2 => Bit
        }
        IChgTerm(u16 @ 0x1E, default = 0x0640) {}
        AvCap(u16 @ 0x1F) {}
        TTF(u16 @ 0x20) {}
        QRTable10(u16 @ 0x22, default = 0x0000) {}
        FullCapNom(u16 @ 0x23, default = 0x0000) {}
        /// Trimmed ratiometric AIN0 measurement.
        AIN0(u16 @ 0x27) {}
        LearnCfg(u16 @ 0x28, default = 0x4486) {}
        FilterCfg(u16 @ 0x29, default = 0xCEA4) {}
        RelaxCfg(u16 @ 0x2A, default = 0x2039) {}
        TGain(u16 @ 0x2C, default = 0xEE56) {}
        TOff(u16 @ 0x2D, default = 0x1DA4) {}
        QRTable20(u16 @ 0x32, default = 0x0000) {}
        /// Full capacity as reported to the application.
        FullCapRep(u16 @ 0x35, default = 0x0000) {}
        IAvgEmpty(u16 @ 0x36, default = 0x0000) {}
        RComp0(u16 @ 0x38, default = 0x0000) {}
        TempCo(u16 @ 0x39, default = 0x0000) {}
        VEmpty(u16 @ 0x3A, default = 0xA561) {}
        QRTable30(u16 @ 0x42, default = 0x0000) {}
        dQAcc(u16 @ 0x45, default = 0x0017) {}
        dPAcc(u16 @ 0x46, default = 0x0190) {}
        /// State of charge captured at the time of the last reset.
        VFSOC0(u16 @ 0x48, default = 0x0000) {}
        ConvgCfg(u16 @ 0x49, default = 0x2241) {}
        /// Write protection of VFSOC0.
        VFSOC0Enable(u16 @ 0x60, default = 0x0000) {
            enable @ 7 => Bit
        }
        MLOCKReg1(u16 @ 0x62, default = 0x0000) {}
        MLOCKReg2(u16 @ 0x63, default = 0x0000) {}
        /// Mix capacity when constant voltage charging has been observed.
        CV_MixCap(u16 @ 0xB6, default = 0x0000) {}
        CV_HalfTime(u16 @ 0xB7, default = 0x0000) {}
        /// Thermistor curvature adjustment.
        Curve(u16 @ 0xB9, default = 0x0000) {}
        Config2(u16 @ 0xBB, default = 0x3658) {
            /// Enable the 1% state of charge change alert.
            dSOCen @ 7 => Bit,
            /// Enable temperature alerts.
            t_alrt_en @ 6 => Bit,
            /// Write 1 to make the firmware process a newly loaded model.
            /// Clears when processing is complete.
            ld_mdl @ 5 => Bit
        }
        SmartChgCfg(u16 @ 0xDB, default = 0x0000) {}
        /// Open circuit voltage as estimated by the voltage fuel gauge.
        VFOCV(u16 @ 0xFB) {}
        /// State of charge as estimated by the voltage fuel gauge.
        VFSOC(u16 @ 0xFF) {}
    }
}

/// Charger registers, 8 bit.
pub mod chg {
    use device_descriptor::*;

    device! {
        /// Interrupt sources, cleared on read.
        ChgInt(u8 @ 0xB0) {
            aicl @ 7 => Event {
                Changed = 1,
                Unchanged = 0
            },
            chgin @ 6 => Event,
            wcin @ 5 => Event,
            chg @ 4 => Event,
            bat @ 3 => Event,
            batp @ 2 => Event,
            byp @ 0 => Event
        }
        ChgIntOk(u8 @ 0xB2) {
            aicl_ok @ 7 => InputStatus {
                Valid = 1,
                Invalid = 0
            },
            /// High voltage input valid.
            chgin_ok @ 6 => InputStatus,
            wcin_ok @ 5 => InputStatus,
            chg_ok @ 4 => InputStatus,
            bat_ok @ 3 => InputStatus,
            /// Battery present.
            batp_ok @ 2 => InputStatus,
            byp_ok @ 0 => InputStatus
        }
        Details00(u8 @ 0xB3) {
            chgin_dtls @ 5..7 => u8,
            wcin_dtls @ 3..5 => u8,
            batp_dtls @ 0 => u8
        }
        Details01(u8 @ 0xB4) {
            /// Junction temperature regulation loop active.
            treg @ 7 => Treg {
                Regulating = 1,
                Normal = 0
            },
            bat_dtls @ 4..7 => BatteryDetails {
                NoBattery = 0,
                Prequalification = 1,
                TimerExpired = 2,
                Good = 3,
                LowVoltage = 4,
                OverVoltage = 5,
                OverCurrent = 6
            },
            chg_dtls @ 0..4 => ChargeDetails {
                Prequalification = 0,
                FastConstantCurrent = 1,
                FastConstantVoltage = 2,
                TopOff = 3,
                Done = 4,
                WatchdogExpired = 5,
                TimerExpired = 6,
                DetbatSuspend = 7,
                Off = 8,
                OverTemperature = 0x0A
            }
        }
        Details02(u8 @ 0xB5) {
            byp_dtls @ 0..4 => u8
        }
        Cnfg00(u8 @ 0xB7, default = 0x04) {
            /// Smart power selector mode.
            mode @ 0..4 => u8
        }
        Cnfg01(u8 @ 0xB8, default = 0x91) {
            chg_rstrt @ 4..6 => u8,
            /// Fast-charge timer, 0 disables it.
            fchgtime @ 0..3 => u8
        }
        Cnfg02(u8 @ 0xB9, default = 0x07) {
            otg_ilim @ 6..8 => u8,
            /// Fast-charge current, 50 mA per LSB.
            chg_cc @ 0..6 => u8
        }
        Cnfg03(u8 @ 0xBA, default = 0x00) {
            to_time @ 3..6 => u8,
            to_ith @ 0..3 => u8
        }
        Cnfg04(u8 @ 0xBB, default = 0x54) {
            minvsys @ 6..8 => u8,
            /// Primary charge termination voltage.
            chg_cv_prm @ 0..6 => u8
        }
        Cnfg06(u8 @ 0xBD, default = 0x00) {
            /// Write 0b11 to unlock the protected charger settings.
            chgprot @ 2..4 => u8
        }
        Cnfg07(u8 @ 0xBE, default = 0x30) {
            regtemp @ 5..7 => u8
        }
        Cnfg09(u8 @ 0xC0, default = 0x0F) {
            chgin_ilim @ 0..7 => u8
        }
        Cnfg10(u8 @ 0xC1, default = 0x19) {
            wcin_ilim @ 0..6 => u8
        }
        Cnfg12(u8 @ 0xC3, default = 0x65) {
            vchgin_reg @ 3..5 => u8,
            b2sovrc @ 0..3 => u8
        }
    }
}

/// Top level PMIC registers, 8 bit.
pub mod pmic {
    use device_descriptor::*;

    device! {
        PmicId(u8 @ 0x20) {}
        PmicRev(u8 @ 0x21) {
            version @ 3..8 => u8,
            revision @ 0..3 => u8
        }
        /// Pending interrupt sources.
        IntSrc(u8 @ 0x22) {
            sys @ 2 => Pending {
                Pending = 1,
                Idle = 0
            },
            fg @ 1 => Pending,
            chgr @ 0 => Pending
        }
    }
}
