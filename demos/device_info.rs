//! Prints a snapshot of an RDS110.R's current readings. Parallels the original
//! connector's `examples/device_info.py`.
//!
//! ```text
//! device_info 192.0.2.10:47808
//! ```

use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;

use siemens_rds110_bacnet::device::SiemensThermostat;
use siemens_rds110_bacnet::transport::{ClientConfig, Tracer};

/// Instance id of the DEVICE object itself; 4194303 is BACnet's "unknown/any" device
/// instance, used by the original connector's demo as a placeholder.
const DEFAULT_DEVICE_ID: u32 = 4_194_303;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(addr_arg) = args.next() else {
        eprintln!("usage: device_info <device-ip>[:port]");
        return ExitCode::FAILURE;
    };

    let addr: SocketAddr = match addr_arg.parse() {
        Ok(addr) => addr,
        Err(_) => match format!("{addr_arg}:47808").parse() {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("invalid device address {addr_arg}: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let config = ClientConfig::new(addr);
    let mut thermostat = match SiemensThermostat::connect(config, DEFAULT_DEVICE_ID, Tracer::from_env()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to connect to {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = thermostat.update() {
        eprintln!("failed to read device state: {e}");
        return ExitCode::FAILURE;
    }

    println!("device name:              {:?}", thermostat.device_name());
    println!("room temperature:         {:?}", thermostat.room_temperature());
    println!("room temperature result:  {:?}", thermostat.room_temperature_result());
    println!("room relative humidity:   {:?}", thermostat.room_relative_humidity());
    println!("present heating setpoint: {:?}", thermostat.present_heating_setpoint());
    println!("heating setpoint comfort: {:?}", thermostat.heating_setpoint_comfort());
    println!("pump position:            {:?}", thermostat.pump_position());
    println!("room presence detected:   {:?}", thermostat.room_presence_detection());
    println!("room window state:        {:?}", thermostat.room_window_state());

    ExitCode::SUCCESS
}
