// SPDX-License-Identifier: MPL-2.0

use std::process;

use clap::Parser;
use env_logger::Env;
use stmvl53l0_uapi::DeviceFile;
use vl53l0_reg::{Announcement, Cli, access_register};

/// The exit status of every failure past argument parsing.
const EXIT_FAILURE: i32 = -1;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let request = cli.request();
    eprintln!("{}", Announcement(&request));

    let device = match DeviceFile::open(&cli.device) {
        Ok(device) => device,
        Err(err) => {
            eprintln!("Error open stmvl53l0_ranging device: {}", err);
            process::exit(EXIT_FAILURE);
        }
    };

    match access_register(&device, request) {
        Ok(reply) => eprintln!(
            " VL53L0 register data:0x{:x}, error status:{}",
            reply.reg_data, reply.status
        ),
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(EXIT_FAILURE);
        }
    }
}
