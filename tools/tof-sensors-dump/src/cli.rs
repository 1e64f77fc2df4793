// SPDX-License-Identifier: MPL-2.0

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::dumper::{FlushPlan, Options};

/// Where the HAL is looked up when no path is given.
pub const DEFAULT_LIBRARY: &str = "hw/sensors.hal.tof.so";

#[derive(Debug, Parser)]
#[command(
    name = "tof_sensors_dump",
    version,
    about = "Dump the events of the time-of-flight sensors of a sensors HAL",
    after_help = "Interrupt with Ctrl-C to stop."
)]
pub struct Cli {
    #[arg(short = 'f', long, help = "Flush the first sensor three times while polling")]
    pub flush: bool,
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_LIBRARY,
        help = "The HAL shared object"
    )]
    pub library: PathBuf,
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 5,
        help = "The sampling period of the time-of-flight sensors"
    )]
    pub delay_ms: u64,
}

impl Cli {
    pub fn options(&self) -> Options {
        Options {
            delay: Duration::from_millis(self.delay_ms),
            flush: self.flush.then(FlushPlan::default),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["tof_sensors_dump"]).unwrap();
        assert_eq!(cli.library, PathBuf::from(DEFAULT_LIBRARY));
        assert_eq!(
            cli.options(),
            Options {
                delay: Duration::from_millis(5),
                flush: None,
            }
        );
    }

    #[test]
    fn flush_and_delay() {
        let cli = Cli::try_parse_from(["tof_sensors_dump", "-f", "--delay-ms", "30"]).unwrap();
        let options = cli.options();
        assert_eq!(options.delay, Duration::from_millis(30));
        assert_eq!(options.flush, Some(FlushPlan::default()));
        assert!(Cli::try_parse_from(["tof_sensors_dump", "--delay-ms", "-1"]).is_err());
    }
}
