//! Default object table shipped with the crate.
//!
//! Covers a handful of commonly read objects of RCT Power inverters, one per
//! data type at least. Load the full table of a device from JSON with
//! [`Registry::from_json_file`](super::Registry::from_json_file).

use super::{ObjectDescriptor, Registry};
use crate::codec::{DataType, Value};

fn descriptors() -> Vec<ObjectDescriptor> {
    vec![
        ObjectDescriptor::new(0x959930BF, "battery.soc", DataType::Float)
            .description("Battery state of charge (SOC)")
            .sim_value(Value::Float(0.5)),
        ObjectDescriptor::new(0x8B9FF008, "battery.soc_target", DataType::Float)
            .description("Target SOC"),
        ObjectDescriptor::new(0xC0DF2978, "battery.cycles", DataType::Int32)
            .description("Battery charge / discharge cycles")
            .sim_value(Value::Integer(312)),
        ObjectDescriptor::new(0x400F015B, "g_sync.p_acc_lp", DataType::Float)
            .description("Battery power (positive if discharge)")
            .unit("W"),
        ObjectDescriptor::new(0xDB2D69AE, "g_sync.p_ac_sum_lp", DataType::Float)
            .description("AC power")
            .unit("W")
            .sim_value(Value::Float(1234.5)),
        ObjectDescriptor::new(0x1C4A665F, "grid_pll[0].f", DataType::Float)
            .description("Grid frequency")
            .unit("Hz")
            .sim_value(Value::Float(50.0)),
        ObjectDescriptor::new(0x90B53336, "temperature.sink_temp_power_reduction", DataType::Float)
            .description("Heat sink temperature target")
            .unit("°C"),
        ObjectDescriptor::new(0x7924ABD9, "inverter_sn", DataType::String)
            .description("Inverter serial number")
            .sim_value(Value::String("123456789012".to_string())),
        ObjectDescriptor::new(0xEBC62737, "android_description", DataType::String)
            .description("Device name")
            .sim_value(Value::String("Simulator".to_string())),
        ObjectDescriptor::new(0x5F33284E, "prim_sm.state", DataType::Uint8)
            .description("Inverter status"),
        ObjectDescriptor::new(0x682CDDA1, "power_mng.battery_type", DataType::Enum)
            .description("Battery type"),
        ObjectDescriptor::new(0x36A9E9A6, "power_mng.use_grid_power_enable", DataType::Bool)
            .description("Use grid power to charge the battery"),
        ObjectDescriptor::new(0x3623D82A, "prim_sm.island_flag", DataType::Uint16)
            .description("Grid-separated"),
        ObjectDescriptor::new(0x4E49AEC5, "g_sync.p_ac_load_sum_lp", DataType::Float)
            .description("Household power consumption")
            .unit("W"),
        ObjectDescriptor::new(0x27BE51D9, "rb485.f_wr[0]", DataType::Int16)
            .description("Power storage phase 1 frequency offset")
            .unit("mHz"),
        ObjectDescriptor::new(0x2A449E89, "power_mng.soc_strategy", DataType::Int8)
            .description("SOC target selection"),
        ObjectDescriptor::new(0xA7FA5C5D, "logger.minutes_ubat_log_ts", DataType::Uint32)
            .description("Battery voltage log timestamp"),
    ]
}

impl Registry {
    /// The default object table.
    pub fn builtin() -> Self {
        Self::new(descriptors()).expect("built-in table has unique IDs and names")
    }
}
