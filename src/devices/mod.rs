use serde::Serialize;
use std::sync::{Arc, Mutex};

/* Plain data records for the emulated devices. Mutated only by the
simulation engine (physics fields) and by the property adapters
(flags/setpoints) — never by anything else. */

#[derive(Debug, Clone, Serialize)]
pub struct SmartMeter {
    pub is_running: bool,
    /// Instantaneous power at the grid connection (W).
    /// Positive: buying, negative: selling.
    pub instant_current_power: f64,
    pub cumulative_power_buy_kwh: f64,
    pub cumulative_power_sell_kwh: f64,
}

impl Default for SmartMeter {
    fn default() -> Self {
        return SmartMeter {
            is_running: true,
            instant_current_power: 0.0,
            cumulative_power_buy_kwh: 0.0,
            cumulative_power_sell_kwh: 0.0,
        };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solar {
    pub is_running: bool,
    pub instant_generation_power: f64,
    pub cumulative_generation_kwh: f64,
}

impl Default for Solar {
    fn default() -> Self {
        return Solar {
            is_running: true,
            instant_generation_power: 0.0,
            cumulative_generation_kwh: 0.0,
        };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Battery {
    pub is_running: bool,
    pub is_charging: bool,
    pub is_discharging: bool,
    /// Executed charge/discharge power (W), not a request value.
    pub instant_charge_power: f64,
    pub instant_discharge_power: f64,
    /// State of charge (%)
    pub soc: f64,
    pub rated_capacity_wh: f64,
    /// Power applied when a charge/discharge mode is commanded (W).
    pub max_power_w: f64,
    pub cumulative_charge_wh: f64,
    pub cumulative_discharge_wh: f64,
}

impl Default for Battery {
    fn default() -> Self {
        return Battery {
            is_running: true,
            is_charging: false,
            is_discharging: false,
            instant_charge_power: 0.0,
            instant_discharge_power: 0.0,
            soc: 50.0,
            rated_capacity_wh: 10000.0,
            max_power_w: 5000.0,
            cumulative_charge_wh: 0.0,
            cumulative_discharge_wh: 0.0,
        };
    }
}

impl Battery {
    /// Stored energy derived from SOC (Wh).
    pub fn stored_wh(&self) -> f64 {
        return self.rated_capacity_wh * self.soc / 100.0;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterHeater {
    pub is_running: bool,
    /// 0x41: automatic, 0x42: manual heating, 0x43: manual stop
    pub auto_setting: u8,
    pub is_heating: bool,
    /// Raw gauge units, clamped to [0, tank_capacity].
    pub remaining_hot_water: f64,
    pub tank_capacity: f64,
    /// Power drawn while heating (W).
    pub heating_power_w: f64,
    /// 0xE3 bath automatic mode, stored pass-through
    pub bath_auto_setting: u8,
    /// 0xC0 daytime reheating permission, stored pass-through
    pub daytime_reheating: u8,
}

impl Default for WaterHeater {
    fn default() -> Self {
        return WaterHeater {
            is_running: true,
            auto_setting: 0x41,
            is_heating: false,
            remaining_hot_water: 0.0,
            tank_capacity: 370.0,
            heating_power_w: 1000.0,
            bath_auto_setting: 0x42,
            daytime_reheating: 0x41,
        };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct V2h {
    pub is_running: bool,
    pub vehicle_connected: bool,
    /// 0x42: charge, 0x43: discharge, 0x44: standby, 0x47: stopped
    pub operation_mode: u8,
    pub battery_capacity_wh: f64,
    pub remaining_capacity_wh: f64,
    /// Configured setpoints (W), settable through 0xEB/0xEC.
    pub charge_power_w: f64,
    pub discharge_power_w: f64,
    /// Engine-computed actual flows (W).
    pub current_charge_w: f64,
    pub current_discharge_w: f64,
    pub cumulative_charge_wh: f64,
    pub cumulative_discharge_wh: f64,
}

impl Default for V2h {
    fn default() -> Self {
        return V2h {
            is_running: true,
            vehicle_connected: false,
            operation_mode: 0x47,
            battery_capacity_wh: 20000.0,
            remaining_capacity_wh: 10000.0,
            charge_power_w: 3000.0,
            discharge_power_w: 3000.0,
            current_charge_w: 0.0,
            current_discharge_w: 0.0,
            cumulative_charge_wh: 0.0,
            cumulative_discharge_wh: 0.0,
        };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AirConditioner {
    pub is_running: bool,
    pub instant_power_w: f64,
    pub cumulative_energy_wh: f64,
    /// 0x41: power saving, 0x42: normal
    pub power_saving: u8,
    pub fan_speed: u8,
    pub mode: u8,
    pub target_temperature: u8,
}

impl Default for AirConditioner {
    fn default() -> Self {
        return AirConditioner {
            is_running: false,
            instant_power_w: 0.0,
            cumulative_energy_wh: 0.0,
            power_saving: 0x42,
            fan_speed: 0x41,
            mode: 0x41,
            target_temperature: 25,
        };
    }
}

/// All emulated device state plus the scenario-driven household load.
///
/// Shared as `Arc<Mutex<EmsState>>` between the simulation service and the
/// protocol adapters. Single-writer discipline: the engine is the only
/// writer of physics fields (powers, SOC, cumulative counters), adapters
/// write only flags and setpoints; every critical section is short and
/// never spans an await point.
#[derive(Debug, Clone, Serialize)]
pub struct EmsState {
    pub household_load_w: f64,
    pub smart_meter: SmartMeter,
    pub solar: Solar,
    pub battery: Battery,
    pub water_heater: WaterHeater,
    pub v2h: V2h,
    pub air_conditioner: AirConditioner,
}

impl Default for EmsState {
    fn default() -> Self {
        return EmsState {
            /* Base household load until a scenario takes over */
            household_load_w: 500.0,
            smart_meter: SmartMeter::default(),
            solar: Solar::default(),
            battery: Battery::default(),
            water_heater: WaterHeater::default(),
            v2h: V2h::default(),
            air_conditioner: AirConditioner::default(),
        };
    }
}

pub type SharedEms = Arc<Mutex<EmsState>>;

pub fn new_shared(state: EmsState) -> SharedEms {
    return Arc::new(Mutex::new(state));
}
