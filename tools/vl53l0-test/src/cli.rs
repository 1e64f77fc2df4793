// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use stmvl53l0_uapi::types::{DeviceMode, GpioFunctionality};

#[derive(Debug, Parser)]
#[command(
    name = "vl53l0_test",
    version,
    about = "Range with a VL53L0 sensor or calibrate it",
    after_help = "Ranging is the default; interrupt with Ctrl-C to stop."
)]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        overrides_with = "offset_calibration",
        help = "Run the crosstalk calibration"
    )]
    pub xtalk_calibration: bool,
    #[arg(
        short = 'o',
        long,
        overrides_with = "xtalk_calibration",
        help = "Run the offset calibration"
    )]
    pub offset_calibration: bool,
    #[arg(short = 'u', long, help = "Cycle through the use cases while ranging")]
    pub use_case_cycle: bool,
    #[arg(
        short = 'O',
        long = "out-thresholds",
        num_args = 2,
        action = ArgAction::Set,
        value_names = ["LOW", "HIGH"],
        overrides_with_all = ["low_threshold", "high_threshold"],
        help = "Interrupt when the range leaves [LOW, HIGH]"
    )]
    pub out_thresholds: Option<Vec<u32>>,
    #[arg(
        short = 'L',
        long,
        value_name = "LOW",
        overrides_with_all = ["out_thresholds", "high_threshold"],
        help = "Interrupt when the range drops below LOW"
    )]
    pub low_threshold: Option<u32>,
    #[arg(
        short = 'H',
        long,
        value_name = "HIGH",
        overrides_with_all = ["out_thresholds", "low_threshold"],
        help = "Interrupt when the range rises above HIGH"
    )]
    pub high_threshold: Option<u32>,
    #[arg(long, value_name = "FILE", help = "Read settings from a TOML file")]
    pub config: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "The driver node")]
    pub device: Option<PathBuf>,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.xtalk_calibration {
            Mode::XtalkCalibration
        } else if self.offset_calibration {
            Mode::OffsetCalibration
        } else {
            Mode::Range
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        match (
            self.out_thresholds.as_deref(),
            self.low_threshold,
            self.high_threshold,
        ) {
            (Some(&[low, high]), _, _) => Thresholds::Out { low, high },
            (_, Some(low), _) => Thresholds::Low(low),
            (_, _, Some(high)) => Thresholds::High(high),
            _ => Thresholds::Disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Range,
    XtalkCalibration,
    OffsetCalibration,
}

/// The interrupt thresholds to program before ranging, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thresholds {
    Disabled,
    Out { low: u32, high: u32 },
    Low(u32),
    High(u32),
}

impl Thresholds {
    pub fn gpio_functionality(self) -> GpioFunctionality {
        match self {
            Thresholds::Disabled => GpioFunctionality::NewMeasureReady,
            Thresholds::Out { .. } => GpioFunctionality::ThresholdCrossedOut,
            Thresholds::Low(_) => GpioFunctionality::ThresholdCrossedLow,
            Thresholds::High(_) => GpioFunctionality::ThresholdCrossedHigh,
        }
    }

    pub fn device_mode(self) -> DeviceMode {
        match self {
            Thresholds::Disabled => DeviceMode::ContinuousRanging,
            _ => DeviceMode::ContinuousTimedRanging,
        }
    }

    /// The low threshold to program, unless only the high one is used.
    pub fn low(self) -> Option<u32> {
        match self {
            Thresholds::Out { low, .. } => Some(low),
            Thresholds::Low(low) => Some(low),
            Thresholds::Disabled | Thresholds::High(_) => None,
        }
    }

    /// The high threshold to program, unless only the low one is used.
    pub fn high(self) -> Option<u32> {
        match self {
            Thresholds::Out { high, .. } => Some(high),
            Thresholds::High(high) => Some(high),
            Thresholds::Disabled | Thresholds::Low(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vl53l0_test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn ranging_is_the_default() {
        let cli = parse(&[]);
        assert_eq!(cli.mode(), Mode::Range);
        assert_eq!(cli.thresholds(), Thresholds::Disabled);
        assert!(!cli.use_case_cycle);
    }

    #[test]
    fn last_mode_flag_wins() {
        assert_eq!(parse(&["-c"]).mode(), Mode::XtalkCalibration);
        assert_eq!(parse(&["-o"]).mode(), Mode::OffsetCalibration);
        assert_eq!(parse(&["-c", "-o"]).mode(), Mode::OffsetCalibration);
        assert_eq!(parse(&["-o", "-c"]).mode(), Mode::XtalkCalibration);
    }

    #[test]
    fn out_thresholds_take_two_values() {
        let thresholds = parse(&["-O", "100", "300"]).thresholds();
        let expected = Thresholds::Out {
            low: 100,
            high: 300,
        };
        assert_eq!(thresholds, expected);
        assert_eq!(thresholds.low(), Some(100));
        assert_eq!(thresholds.high(), Some(300));
        assert!(Cli::try_parse_from(["vl53l0_test", "-O", "100"]).is_err());
    }

    #[test]
    fn last_threshold_flag_wins() {
        assert_eq!(
            parse(&["-O", "1", "2", "-L", "50"]).thresholds(),
            Thresholds::Low(50)
        );
        assert_eq!(
            parse(&["-L", "50", "-H", "70"]).thresholds(),
            Thresholds::High(70)
        );
        assert_eq!(
            parse(&["-H", "70", "-O", "1", "2"]).thresholds(),
            Thresholds::Out { low: 1, high: 2 }
        );
    }

    #[test]
    fn negative_thresholds_are_rejected() {
        assert!(Cli::try_parse_from(["vl53l0_test", "-L", "-5"]).is_err());
    }

    #[test]
    fn thresholds_select_gpio_and_mode() {
        assert_eq!(
            Thresholds::Disabled.gpio_functionality(),
            GpioFunctionality::NewMeasureReady
        );
        assert_eq!(
            Thresholds::Disabled.device_mode(),
            DeviceMode::ContinuousRanging
        );

        let high = Thresholds::High(10);
        assert_eq!(
            high.gpio_functionality(),
            GpioFunctionality::ThresholdCrossedHigh
        );
        assert_eq!(high.device_mode(), DeviceMode::ContinuousTimedRanging);
        assert_eq!(high.low(), None);
        assert_eq!(Thresholds::Low(3).high(), None);
        assert_eq!(
            Thresholds::Out { low: 1, high: 2 }.gpio_functionality(),
            GpioFunctionality::ThresholdCrossedOut
        );
    }
}
