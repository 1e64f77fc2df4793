// SPDX-License-Identifier: MPL-2.0

//! A background worker that keeps switching the measurement profile while
//! the main loop is ranging.

use std::{io::Write, time::Duration};

use cancel_token::CancelToken;
use log::{info, warn};
use stmvl53l0_uapi::{
    Device, Result,
    defs::{ActivateCustomUseCase, ActivateUseCase},
    types::{CustomUseCase, UseCase},
};

/// Returns the use case activated after `use_case`.
fn following(use_case: UseCase) -> UseCase {
    match use_case {
        UseCase::HighAccuracy => UseCase::HighSpeed,
        UseCase::HighSpeed => UseCase::Custom,
        UseCase::Custom | UseCase::LongDistance => UseCase::HighAccuracy,
    }
}

fn activate<D: Device>(device: &D, use_case: UseCase) -> Result<()> {
    match use_case {
        UseCase::Custom => {
            let mut profile = CustomUseCase::HIGH_SPEED;
            device.ioctl::<ActivateCustomUseCase>(&mut profile)
        }
        _ => device.ioctl::<ActivateUseCase>(&mut (use_case as u8)),
    }
}

/// Activates high accuracy, high speed and then the custom high speed profile,
/// in a cycle, one every `interval`, until `token` is cancelled.
///
/// Failures are logged and the cycle goes on.
pub fn cycle_use_cases<D: Device, W: Write>(
    device: &D,
    interval: Duration,
    token: &CancelToken,
    out: &mut W,
) {
    info!("use case worker started");
    report(writeln!(out, "\n\nTest Use Case Change Thread starting"));

    let mut next = UseCase::HighAccuracy;
    while !token.wait_timeout(interval) {
        report(writeln!(
            out,
            "Thread setting test case = {}\n\n",
            next as u8
        ));
        if let Err(err) = activate(device, next) {
            warn!("activating {:?} failed: {}", next, err);
        }
        next = following(next);
    }

    info!("use case worker stopped");
}

fn report(result: std::io::Result<()>) {
    if let Err(err) = result {
        warn!("cannot write to the terminal: {}", err);
    }
}
