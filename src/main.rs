use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use log::{info, warn};
use tokio::task::JoinHandle;

use echonet_emu::adapters::{
    AirConditionerAdapter, BatteryAdapter, DeviceIdentity, NodeProfileAdapter, SmartMeterAdapter,
    SolarAdapter, V2hAdapter, WaterHeaterAdapter,
};
use echonet_emu::devices::{new_shared, EmsState, SharedEms};
use echonet_emu::echonet::{EchonetController, ObjectKey};
use echonet_emu::sim::scenario::Scenario;
use echonet_emu::{Config, SimulationEngine, SimulationService, UdpManager, WiSunManager};

/* Class codes of the emulated objects */
const EOJ_AIR_CONDITIONER: ObjectKey = (0x01, 0x30, 0x01);
const EOJ_WATER_HEATER: ObjectKey = (0x02, 0x6B, 0x01);
const EOJ_SOLAR: ObjectKey = (0x02, 0x79, 0x01);
const EOJ_BATTERY: ObjectKey = (0x02, 0x7D, 0x01);
const EOJ_V2H: ObjectKey = (0x02, 0x7E, 0x01);
const EOJ_SMART_METER: ObjectKey = (0x02, 0x88, 0x01);

#[tokio::main]
async fn main() {
    let config = Config::load();

    /* EMU_LOG_LEVEL wins over the configured level */
    let default_filter =
        std::env::var("EMU_LOG_LEVEL").unwrap_or(config.system.log_level.clone());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let state = build_state(&config);

    let scenario = load_scenario(&config);
    let engine = SimulationEngine::new(
        Arc::clone(&state),
        scenario,
        config.simulation.use_scenario,
    );

    let wifi_controller = Arc::new(build_wifi_controller(&config, &state));
    let wisun_controller = Arc::new(build_wisun_controller(&config, &state));

    let mut threads: Vec<JoinHandle<()>> = Vec::new();

    let mut simulation = SimulationService::new(engine, config.simulation.update_interval_sec);
    threads.push(tokio::spawn(async move {
        simulation.start_thread().await;
    }));

    let mut udp = UdpManager::new(Arc::clone(&wifi_controller), &config.communication);
    threads.push(tokio::spawn(async move {
        udp.start_thread().await;
    }));

    let mut wisun = WiSunManager::new(Arc::clone(&wisun_controller), &config.communication);
    threads.push(tokio::spawn(async move {
        wisun.start_thread().await;
    }));

    info!("All modules started");
    join_all(threads).await;
}

fn build_state(config: &Config) -> SharedEms {
    let mut state = EmsState::default();
    let devices = &config.devices;

    state.battery.rated_capacity_wh = devices.battery.rated_capacity_wh;
    state.battery.max_power_w = devices.battery.max_power_w;
    state.battery.soc = devices.battery.initial_soc.clamp(0.0, 100.0);

    state.water_heater.tank_capacity = devices.water_heater.tank_capacity;
    state.water_heater.heating_power_w = devices.water_heater.heating_power_w;

    state.v2h.battery_capacity_wh = devices.v2h.battery_capacity_wh;
    state.v2h.remaining_capacity_wh = devices.v2h.battery_capacity_wh / 2.0;
    state.v2h.charge_power_w = devices.v2h.charge_power_w;
    state.v2h.discharge_power_w = devices.v2h.discharge_power_w;

    return new_shared(state);
}

fn load_scenario(config: &Config) -> Option<Scenario> {
    if !config.simulation.use_scenario {
        return None;
    }
    match Scenario::from_csv_path(Path::new(&config.simulation.scenario_file)) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(
                "Scenario file {} not usable ({e}), holding base values",
                config.simulation.scenario_file
            );
            None
        }
    }
}

/// Wi-Fi facing registry: node profile plus every enabled device class.
fn build_wifi_controller(config: &Config, state: &SharedEms) -> EchonetController {
    let devices = &config.devices;
    let code = devices.manufacturer_code;
    let mut controller = EchonetController::new();

    let enabled = |name: &str| devices.wifi_devices.iter().any(|d| d == name);

    let mut instances: Vec<ObjectKey> = Vec::new();
    if enabled("air_conditioner") {
        instances.push(EOJ_AIR_CONDITIONER);
    }
    if enabled("water_heater") {
        instances.push(EOJ_WATER_HEATER);
    }
    if enabled("solar") {
        instances.push(EOJ_SOLAR);
    }
    if enabled("battery") {
        instances.push(EOJ_BATTERY);
    }
    if enabled("v2h") {
        instances.push(EOJ_V2H);
    }

    controller.register_instance(
        0x0E,
        0xF0,
        0x01,
        Box::new(NodeProfileAdapter::new(
            instances,
            DeviceIdentity::new("", code),
        )),
    );

    if enabled("air_conditioner") {
        controller.register_instance(
            EOJ_AIR_CONDITIONER.0,
            EOJ_AIR_CONDITIONER.1,
            EOJ_AIR_CONDITIONER.2,
            Box::new(AirConditionerAdapter::new(
                Arc::clone(state),
                DeviceIdentity::new(&devices.air_conditioner.identification, code),
            )),
        );
    }
    if enabled("water_heater") {
        controller.register_instance(
            EOJ_WATER_HEATER.0,
            EOJ_WATER_HEATER.1,
            EOJ_WATER_HEATER.2,
            Box::new(WaterHeaterAdapter::new(
                Arc::clone(state),
                DeviceIdentity::new(&devices.water_heater.identification, code),
            )),
        );
    }
    if enabled("solar") {
        controller.register_instance(
            EOJ_SOLAR.0,
            EOJ_SOLAR.1,
            EOJ_SOLAR.2,
            Box::new(SolarAdapter::new(
                Arc::clone(state),
                DeviceIdentity::new(&devices.solar.identification, code),
            )),
        );
    }
    if enabled("battery") {
        controller.register_instance(
            EOJ_BATTERY.0,
            EOJ_BATTERY.1,
            EOJ_BATTERY.2,
            Box::new(BatteryAdapter::new(
                Arc::clone(state),
                DeviceIdentity::new(&devices.battery.identification, code),
            )),
        );
    }
    if enabled("v2h") {
        controller.register_instance(
            EOJ_V2H.0,
            EOJ_V2H.1,
            EOJ_V2H.2,
            Box::new(V2hAdapter::new(
                Arc::clone(state),
                DeviceIdentity::new(&devices.v2h.identification, code),
            )),
        );
    }

    return controller;
}

/// B-route registry: node profile plus the smart meter.
fn build_wisun_controller(config: &Config, state: &SharedEms) -> EchonetController {
    let devices = &config.devices;
    let code = devices.manufacturer_code;
    let mut controller = EchonetController::new();

    controller.register_instance(
        0x0E,
        0xF0,
        0x01,
        Box::new(NodeProfileAdapter::new(
            vec![EOJ_SMART_METER],
            DeviceIdentity::new("", code),
        )),
    );
    controller.register_instance(
        EOJ_SMART_METER.0,
        EOJ_SMART_METER.1,
        EOJ_SMART_METER.2,
        Box::new(SmartMeterAdapter::new(
            Arc::clone(state),
            DeviceIdentity::new(&devices.smart_meter.identification, code),
        )),
    );

    return controller;
}
