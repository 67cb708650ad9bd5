//! Board supplied battery and charger parameters.

use max77818::{
    calibration::{ModelTable, OCV_TABLE_LENGTH},
    charger::ChargerConfig,
    init::FuelGaugeConfig,
};

use crate::thermal::AlertBands;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A required parameter is absent.
    Missing(&'static str),
    /// A parameter is out of range or has the wrong length.
    Invalid(&'static str),
}

/// Named integer parameters.
pub trait ConfigSource {
    fn u32(&self, key: &str) -> Option<u32>;

    /// Copies the array `key` into `out`, returning its full length.
    fn u16_array(&self, key: &str, out: &mut [u16]) -> Option<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigValue<'a> {
    Int(u32),
    Array(&'a [u16]),
}

/// A config source backed by a constant table.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfig<'a> {
    entries: &'a [(&'a str, ConfigValue<'a>)],
}

impl<'a> StaticConfig<'a> {
    pub const fn new(entries: &'a [(&'a str, ConfigValue<'a>)]) -> Self {
        Self { entries }
    }

    fn get(&self, key: &str) -> Option<ConfigValue<'a>> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }
}

impl ConfigSource for StaticConfig<'_> {
    fn u32(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            ConfigValue::Int(value) => Some(value),
            ConfigValue::Array(_) => None,
        }
    }

    fn u16_array(&self, key: &str, out: &mut [u16]) -> Option<usize> {
        match self.get(key)? {
            ConfigValue::Array(values) => {
                let n = values.len().min(out.len());
                out[..n].copy_from_slice(&values[..n]);
                Some(values.len())
            }
            ConfigValue::Int(_) => None,
        }
    }
}

pub trait LoadConfig: Sized {
    fn load(source: &impl ConfigSource) -> Result<Self, ConfigError>;
}

fn required_u16(source: &impl ConfigSource, key: &'static str) -> Result<u16, ConfigError> {
    let value = source.u32(key).ok_or(ConfigError::Missing(key))?;
    u16::try_from(value).map_err(|_| ConfigError::Invalid(key))
}

fn optional_u16(source: &impl ConfigSource, key: &'static str) -> Result<u16, ConfigError> {
    match source.u32(key) {
        Some(value) => u16::try_from(value).map_err(|_| ConfigError::Invalid(key)),
        None => Ok(0),
    }
}

impl LoadConfig for FuelGaugeConfig {
    fn load(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        const MODEL_KEY: &str = "battery_ocv_model";

        let mut battery_ocv_model: ModelTable = [0; OCV_TABLE_LENGTH];
        let len = source
            .u16_array(MODEL_KEY, &mut battery_ocv_model)
            .ok_or(ConfigError::Missing(MODEL_KEY))?;
        if len != OCV_TABLE_LENGTH {
            warn!("OCV model has {} entries", len);
            return Err(ConfigError::Invalid(MODEL_KEY));
        }

        Ok(FuelGaugeConfig {
            design_cap: required_u16(source, "design_cap")?,
            config: required_u16(source, "config")?,
            config2: required_u16(source, "config2")?,
            dpacc: required_u16(source, "dpacc")?,
            dqacc: required_u16(source, "dqacc")?,
            filter_cfg: required_u16(source, "filter_cfg")?,
            full_cap_nom: required_u16(source, "full_cap_nom")?,
            full_cap_rep: required_u16(source, "full_cap_rep")?,
            full_soc_thr: required_u16(source, "full_soc_thr")?,
            iavg_empty: required_u16(source, "iavg_empty")?,
            i_chg_term: required_u16(source, "i_chg_term")?,
            learn_cfg: required_u16(source, "learn_cfg")?,
            qresidual00: required_u16(source, "qresidual00")?,
            qresidual10: required_u16(source, "qresidual10")?,
            qresidual20: required_u16(source, "qresidual20")?,
            qresidual30: required_u16(source, "qresidual30")?,
            rcomp0: required_u16(source, "rcomp0")?,
            relax_cfg: required_u16(source, "relax_cfg")?,
            temp_co: required_u16(source, "temp_co")?,
            v_empty: required_u16(source, "v_empty")?,
            tgain: required_u16(source, "tgain")?,
            toff: required_u16(source, "toff")?,
            curve: required_u16(source, "curve")?,
            at_rate: required_u16(source, "at_rate")?,
            smartchgcfg: required_u16(source, "smartchgcfg")?,
            convg_cfg: required_u16(source, "convg_cfg")?,
            cv_mixcap: optional_u16(source, "cv_mixcap")?,
            cv_halftime: optional_u16(source, "cv_halftime")?,
            talrt_low: required_u16(source, "talrt_low")?,
            talrt_norm: required_u16(source, "talrt_norm")?,
            talrt_high: required_u16(source, "talrt_high")?,
            battery_ocv_model,
        })
    }
}

impl LoadConfig for ChargerConfig {
    fn load(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let defaults = ChargerConfig::default();
        let value = |key: &str, default: u32| source.u32(key).unwrap_or(default);

        Ok(ChargerConfig {
            fast_charge_timer_timeout: value(
                "fast_charge_timer_timeout",
                defaults.fast_charge_timer_timeout,
            ),
            charge_current_limit: value("charge_current_limit", defaults.charge_current_limit),
            otg_output_current_limit: value(
                "otg_output_current_limit",
                defaults.otg_output_current_limit,
            ),
            topoff_current_threshold: value(
                "topoff_current_threshold",
                defaults.topoff_current_threshold,
            ),
            topoff_timer_timeout: value("topoff_timer_timeout", defaults.topoff_timer_timeout),
            prim_charge_term_voltage: value(
                "prim_charge_term_voltage",
                defaults.prim_charge_term_voltage,
            ),
            min_system_reg_voltage: value(
                "min_system_reg_voltage",
                defaults.min_system_reg_voltage,
            ),
            thermal_reg_temperature: value(
                "thermal_reg_temperature",
                defaults.thermal_reg_temperature,
            ),
            chgin_input_current_limit: value(
                "chgin_input_current_limit",
                defaults.chgin_input_current_limit,
            ),
            wchgin_input_current_limit: value(
                "wchgin_input_current_limit",
                defaults.wchgin_input_current_limit,
            ),
            battery_overcurrent_threshold: value(
                "battery_overcurrent_threshold",
                defaults.battery_overcurrent_threshold,
            ),
            chgin_input_voltage_threshold: value(
                "chgin_input_voltage_threshold",
                defaults.chgin_input_voltage_threshold,
            ),
        })
    }
}

impl From<&FuelGaugeConfig> for AlertBands {
    fn from(config: &FuelGaugeConfig) -> Self {
        AlertBands {
            low: config.talrt_low,
            normal: config.talrt_norm,
            high: config.talrt_high,
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub const OCV_MODEL: [u16; OCV_TABLE_LENGTH] = [0x9A00; OCV_TABLE_LENGTH];

    pub const FUEL_GAUGE_ENTRIES: &[(&str, ConfigValue<'static>)] = &[
        ("design_cap", ConfigValue::Int(0x0BB8)),
        ("config", ConfigValue::Int(0x2210)),
        ("config2", ConfigValue::Int(0x3658)),
        ("dpacc", ConfigValue::Int(0x0C80)),
        ("dqacc", ConfigValue::Int(0x02EE)),
        ("filter_cfg", ConfigValue::Int(0xCEA4)),
        ("full_cap_nom", ConfigValue::Int(0x0BB8)),
        ("full_cap_rep", ConfigValue::Int(0x0BB8)),
        ("full_soc_thr", ConfigValue::Int(0x5F05)),
        ("iavg_empty", ConfigValue::Int(0xFA9C)),
        ("i_chg_term", ConfigValue::Int(0x0333)),
        ("learn_cfg", ConfigValue::Int(0x4486)),
        ("qresidual00", ConfigValue::Int(0x1050)),
        ("qresidual10", ConfigValue::Int(0x0812)),
        ("qresidual20", ConfigValue::Int(0x0306)),
        ("qresidual30", ConfigValue::Int(0x0304)),
        ("rcomp0", ConfigValue::Int(0x0070)),
        ("relax_cfg", ConfigValue::Int(0x2039)),
        ("temp_co", ConfigValue::Int(0x223E)),
        ("v_empty", ConfigValue::Int(0xA561)),
        ("tgain", ConfigValue::Int(0xEE56)),
        ("toff", ConfigValue::Int(0x1DA4)),
        ("curve", ConfigValue::Int(0x0025)),
        ("at_rate", ConfigValue::Int(0x0000)),
        ("smartchgcfg", ConfigValue::Int(0x0000)),
        ("convg_cfg", ConfigValue::Int(0x2241)),
        ("talrt_low", ConfigValue::Int(0x0A00)),
        ("talrt_norm", ConfigValue::Int(0x2D05)),
        ("talrt_high", ConfigValue::Int(0x7F28)),
        ("battery_ocv_model", ConfigValue::Array(&OCV_MODEL)),
    ];

    pub fn fuel_gauge_config() -> FuelGaugeConfig {
        FuelGaugeConfig::load(&StaticConfig::new(FUEL_GAUGE_ENTRIES)).unwrap()
    }

    #[test]
    fn fuel_gauge_config_loads() {
        let config = fuel_gauge_config();

        assert_eq!(config.design_cap, 0x0BB8);
        assert_eq!(config.cv_mixcap, 0);
        assert_eq!(config.battery_ocv_model, OCV_MODEL);
        assert_eq!(
            AlertBands::from(&config),
            AlertBands {
                low: 0x0A00,
                normal: 0x2D05,
                high: 0x7F28
            }
        );
    }

    #[test]
    fn missing_key_is_reported() {
        let entries = FUEL_GAUGE_ENTRIES
            .iter()
            .copied()
            .filter(|(key, _)| *key != "talrt_high")
            .collect::<Vec<_>>();

        assert_eq!(
            FuelGaugeConfig::load(&StaticConfig::new(&entries)),
            Err(ConfigError::Missing("talrt_high"))
        );
    }

    #[test]
    fn short_model_is_invalid() {
        let short = [0u16; 12];
        let mut entries = FUEL_GAUGE_ENTRIES.to_vec();
        entries.retain(|(key, _)| *key != "battery_ocv_model");
        entries.push(("battery_ocv_model", ConfigValue::Array(&short)));

        assert_eq!(
            FuelGaugeConfig::load(&StaticConfig::new(&entries)),
            Err(ConfigError::Invalid("battery_ocv_model"))
        );
    }

    #[test]
    fn oversized_word_is_invalid() {
        let mut entries = FUEL_GAUGE_ENTRIES.to_vec();
        entries.push(("cv_mixcap", ConfigValue::Int(0x1_0000)));

        assert_eq!(
            FuelGaugeConfig::load(&StaticConfig::new(&entries)),
            Err(ConfigError::Invalid("cv_mixcap"))
        );
    }

    #[test]
    fn charger_config_defaults() {
        let config = ChargerConfig::load(&StaticConfig::new(&[
            ("charge_current_limit", ConfigValue::Int(1_000_000)),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ChargerConfig {
                charge_current_limit: 1_000_000,
                ..ChargerConfig::default()
            }
        );
    }
}
