use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_yml;
use std::fs;

fn log_level_default() -> String { return "info".to_string() }

#[derive(Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    #[serde(default="log_level_default")]
    pub log_level: String,
}

fn echonet_port_default() -> u16 { return 3610 }
fn multicast_group_default() -> String { return "224.0.23.0".to_string() }
fn wisun_device_default() -> String { return "/dev/ttyUSB0".to_string() }
fn wisun_baudrate_default() -> u32 { return 115200 }
fn b_route_cred_default() -> String { return "".to_string() }

#[derive(Deserialize, Serialize, Clone)]
pub struct CommunicationConfig {
    #[serde(default="echonet_port_default")]
    pub echonet_port: u16,
    #[serde(default="multicast_group_default")]
    pub multicast_group: String,
    #[serde(default="wisun_device_default")]
    pub wisun_device: String,
    #[serde(default="wisun_baudrate_default")]
    pub wisun_baudrate: u32,
    #[serde(default="b_route_cred_default")]
    pub b_route_id: String,
    #[serde(default="b_route_cred_default")]
    pub b_route_password: String,
}

fn update_interval_default() -> f64 { return 1.0 }
fn use_scenario_default() -> bool { return true }
fn scenario_file_default() -> String { return "data/default_scenario.csv".to_string() }

#[derive(Deserialize, Serialize, Clone)]
pub struct SimulationConfig {
    #[serde(default="update_interval_default")]
    pub update_interval_sec: f64,
    #[serde(default="use_scenario_default")]
    pub use_scenario: bool,
    #[serde(default="scenario_file_default")]
    pub scenario_file: String,
}

fn identification_default() -> String { return "".to_string() }

#[derive(Deserialize, Serialize, Clone)]
pub struct SmartMeterConfig {
    #[serde(default="identification_default")]
    pub identification: String,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct SolarConfig {
    #[serde(default="identification_default")]
    pub identification: String,
}

fn battery_capacity_default() -> f64 { return 10000.0 }
fn battery_max_power_default() -> f64 { return 5000.0 }
fn battery_initial_soc_default() -> f64 { return 50.0 }

#[derive(Deserialize, Serialize, Clone)]
pub struct BatteryConfig {
    #[serde(default="identification_default")]
    pub identification: String,
    #[serde(default="battery_capacity_default")]
    pub rated_capacity_wh: f64,
    #[serde(default="battery_max_power_default")]
    pub max_power_w: f64,
    #[serde(default="battery_initial_soc_default")]
    pub initial_soc: f64,
}

fn tank_capacity_default() -> f64 { return 370.0 }
fn heating_power_default() -> f64 { return 1000.0 }

#[derive(Deserialize, Serialize, Clone)]
pub struct WaterHeaterConfig {
    #[serde(default="identification_default")]
    pub identification: String,
    #[serde(default="tank_capacity_default")]
    pub tank_capacity: f64,
    #[serde(default="heating_power_default")]
    pub heating_power_w: f64,
}

fn v2h_capacity_default() -> f64 { return 20000.0 }
fn v2h_power_default() -> f64 { return 3000.0 }

#[derive(Deserialize, Serialize, Clone)]
pub struct V2hConfig {
    #[serde(default="identification_default")]
    pub identification: String,
    #[serde(default="v2h_capacity_default")]
    pub battery_capacity_wh: f64,
    #[serde(default="v2h_power_default")]
    pub charge_power_w: f64,
    #[serde(default="v2h_power_default")]
    pub discharge_power_w: f64,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct AirConditionerConfig {
    #[serde(default="identification_default")]
    pub identification: String,
}

fn wifi_devices_default() -> Vec<String> {
    return vec![
        "solar".to_string(),
        "battery".to_string(),
        "water_heater".to_string(),
        "v2h".to_string(),
        "air_conditioner".to_string(),
    ];
}
fn manufacturer_code_default() -> u32 { return 0x00007E }
fn smart_meter_default() -> SmartMeterConfig { return SmartMeterConfig { identification: identification_default() } }
fn solar_default() -> SolarConfig { return SolarConfig { identification: identification_default() } }
fn battery_default() -> BatteryConfig {
    return BatteryConfig {
        identification: identification_default(),
        rated_capacity_wh: battery_capacity_default(),
        max_power_w: battery_max_power_default(),
        initial_soc: battery_initial_soc_default(),
    }
}
fn water_heater_default() -> WaterHeaterConfig {
    return WaterHeaterConfig {
        identification: identification_default(),
        tank_capacity: tank_capacity_default(),
        heating_power_w: heating_power_default(),
    }
}
fn v2h_default() -> V2hConfig {
    return V2hConfig {
        identification: identification_default(),
        battery_capacity_wh: v2h_capacity_default(),
        charge_power_w: v2h_power_default(),
        discharge_power_w: v2h_power_default(),
    }
}
fn air_conditioner_default() -> AirConditionerConfig {
    return AirConditionerConfig { identification: identification_default() }
}

#[derive(Deserialize, Serialize, Clone)]
pub struct DevicesConfig {
    /// Device classes served on the Wi-Fi facing registry. The smart meter
    /// is always served over the B-route and never listed here.
    #[serde(default="wifi_devices_default")]
    pub wifi_devices: Vec<String>,
    #[serde(default="manufacturer_code_default")]
    pub manufacturer_code: u32,
    #[serde(default="smart_meter_default")]
    pub smart_meter: SmartMeterConfig,
    #[serde(default="solar_default")]
    pub solar: SolarConfig,
    #[serde(default="battery_default")]
    pub battery: BatteryConfig,
    #[serde(default="water_heater_default")]
    pub water_heater: WaterHeaterConfig,
    #[serde(default="v2h_default")]
    pub v2h: V2hConfig,
    #[serde(default="air_conditioner_default")]
    pub air_conditioner: AirConditionerConfig,
}

fn system_default() -> SystemConfig { return SystemConfig { log_level: log_level_default() } }
fn communication_default() -> CommunicationConfig {
    return CommunicationConfig {
        echonet_port: echonet_port_default(),
        multicast_group: multicast_group_default(),
        wisun_device: wisun_device_default(),
        wisun_baudrate: wisun_baudrate_default(),
        b_route_id: b_route_cred_default(),
        b_route_password: b_route_cred_default(),
    }
}
fn simulation_default() -> SimulationConfig {
    return SimulationConfig {
        update_interval_sec: update_interval_default(),
        use_scenario: use_scenario_default(),
        scenario_file: scenario_file_default(),
    }
}
fn devices_default() -> DevicesConfig {
    return DevicesConfig {
        wifi_devices: wifi_devices_default(),
        manufacturer_code: manufacturer_code_default(),
        smart_meter: smart_meter_default(),
        solar: solar_default(),
        battery: battery_default(),
        water_heater: water_heater_default(),
        v2h: v2h_default(),
        air_conditioner: air_conditioner_default(),
    }
}

#[derive(Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default="system_default")]
    pub system: SystemConfig,
    #[serde(default="communication_default")]
    pub communication: CommunicationConfig,
    #[serde(default="simulation_default")]
    pub simulation: SimulationConfig,
    #[serde(default="devices_default")]
    pub devices: DevicesConfig,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            system: system_default(),
            communication: communication_default(),
            simulation: simulation_default(),
            devices: devices_default(),
        };
    }
}

impl Config {
    /// Probe the two config locations; an absent or broken file falls back
    /// to built-in defaults so the emulator always comes up.
    pub fn load() -> Self {
        for path in ["config/emu.yaml", "emu.yaml"] {
            let contents = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(_) => continue,
            };
            match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {path}");
                    return config;
                }
                Err(e) => {
                    warn!("Unable to parse {path}: {e}, using defaults");
                    return Config::default();
                }
            }
        }
        warn!("No config file found at config/emu.yaml or emu.yaml, using defaults");
        return Config::default();
    }
}
