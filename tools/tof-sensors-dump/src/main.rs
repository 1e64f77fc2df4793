// SPDX-License-Identifier: MPL-2.0

use std::{io, process, thread};

use cancel_token::{CancelToken, block_interrupt, spawn_interrupt_watcher};
use clap::Parser;
use env_logger::Env;
use log::warn;
use tof_sensors_dump::{
    cli::Cli,
    dumper::{Interrupted, SensorsHal, dump, interrupt},
    module::HalModule,
};

/// The exit status of every failure past loading the HAL.
const EXIT_FAILURE: i32 = -1;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let options = cli.options();
    if options.flush.is_some() {
        println!("Test Flush functionality");
    }

    // Must precede loading the HAL, which may start threads of its own.
    let interrupt_blocked = match block_interrupt() {
        Ok(()) => true,
        Err(errno) => {
            println!(
                "Unable to register signal_handler for SIGINT: {}",
                errno.desc()
            );
            false
        }
    };

    // A HAL that cannot be loaded means there is nothing to dump.
    let module = match HalModule::load(&cli.library) {
        Ok(module) => module,
        Err(err) => {
            println!("{}", err);
            process::exit(0);
        }
    };
    let device = match module.open_poll_device() {
        Ok(device) => device,
        Err(errno) => {
            println!("Failing to open sensor module! Error:{}!", errno.desc());
            process::exit(EXIT_FAILURE);
        }
    };

    let sensors = device.sensors();

    let token = CancelToken::new();
    let result = thread::scope(|scope| {
        let watcher = if interrupt_blocked {
            let on_interrupt = || {
                if interrupt(&device, &sensors, &mut io::stdout()) == Interrupted::ShutDown {
                    process::exit(0);
                }
            };
            spawn_interrupt_watcher(scope, &token, on_interrupt)
                .inspect_err(|errno| warn!("cannot watch for SIGINT: {}", errno))
                .ok()
        } else {
            None
        };

        let result = dump(&device, &sensors, &options, &token, &mut io::stdout());

        token.cancel();
        if let Some(watcher) = watcher {
            watcher.shutdown();
        }
        result
    });
    drop(device);

    if let Err(err) = result {
        println!("{}", err);
        process::exit(EXIT_FAILURE);
    }
}
