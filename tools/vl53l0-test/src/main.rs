// SPDX-License-Identifier: MPL-2.0

use std::{io, process, thread};

use cancel_token::{CancelToken, block_interrupt, spawn_interrupt_watcher};
use clap::Parser;
use env_logger::Env;
use log::warn;
use stmvl53l0_uapi::DeviceFile;
use vl53l0_test::{cli::Cli, config::Settings, run};

/// The exit status of every failure past argument parsing.
const EXIT_FAILURE: i32 = -1;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(EXIT_FAILURE);
        }
    };

    // Must precede every thread spawn so that only the watcher sees SIGINT.
    let interrupt_blocked = match block_interrupt() {
        Ok(()) => true,
        Err(errno) => {
            eprintln!("Can't catch SIGINT: {}", errno.desc());
            false
        }
    };

    let device = match DeviceFile::open_sync(&settings.device) {
        Ok(device) => device,
        Err(err) => {
            eprintln!("Error open stmvl53l0_ranging device: {}", err);
            process::exit(EXIT_FAILURE);
        }
    };

    let token = CancelToken::new();
    let result = thread::scope(|scope| {
        let watcher = if interrupt_blocked {
            spawn_interrupt_watcher(scope, &token, || {})
                .inspect_err(|errno| warn!("cannot watch for SIGINT: {}", errno))
                .ok()
        } else {
            None
        };

        let result = run(&device, &settings, &token, &mut io::stderr());

        token.cancel();
        if let Some(watcher) = watcher {
            watcher.shutdown();
        }
        result
    });
    drop(device);

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(EXIT_FAILURE);
    }
}
