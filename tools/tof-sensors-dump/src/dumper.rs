// SPDX-License-Identifier: MPL-2.0

use std::{
    fmt,
    io::{self, Write},
    panic, thread,
    time::Duration,
};

use cancel_token::CancelToken;
use log::{info, warn};
use nix::errno::Errno;
use zerocopy::FromZeros;

use crate::hal::{
    META_DATA_FLUSH_COMPLETE, SENSOR_TYPE_LIGHT, SENSOR_TYPE_META_DATA, SENSOR_TYPE_PROXIMITY,
    SENSOR_TYPE_TIME_OF_FLIGHT, SensorsEvent,
};

/// The number of events fetched by one poll.
const POLL_EVENTS: usize = 16;

/// The operations of an opened sensors HAL poll device.
///
/// Implementations must accept calls from several threads at once: the
/// main thread blocks in [`poll`](Self::poll) while others flush.
pub trait SensorsHal: Sync {
    fn sensors(&self) -> Vec<SensorInfo>;

    fn activate(&self, handle: i32, enabled: bool) -> Result<(), Errno>;

    fn batch(&self, handle: i32, sampling_period: Duration) -> Result<(), Errno>;

    /// Blocks until events are available and returns how many were stored.
    fn poll(&self, events: &mut [SensorsEvent]) -> Result<usize, Errno>;

    /// Asks for a flush-complete event once pending events are delivered.
    fn flush(&self, handle: i32) -> Result<(), Errno>;

    /// Closes the device. Every later call fails with `ENODEV`.
    fn close(&self) -> Result<(), Errno>;
}

/// A sensor as listed by the HAL.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorInfo {
    pub name: String,
    pub vendor: String,
    pub version: i32,
    pub handle: i32,
    pub sensor_type: i32,
    pub max_range: f32,
    pub resolution: f32,
    pub power: f32,
}

impl SensorInfo {
    pub fn is_time_of_flight(&self) -> bool {
        self.sensor_type == SENSOR_TYPE_TIME_OF_FLIGHT
    }
}

#[derive(Debug)]
pub enum Error {
    /// A HAL call on one sensor failed.
    Hal {
        op: &'static str,
        sensor: String,
        errno: Errno,
    },
    Poll(Errno),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Hal { op, sensor, errno } => {
                write!(f, "{}() for '{}' failed ({})", op, sensor, errno.desc())
            }
            Error::Poll(errno) => write!(f, "poll() failed ({})", errno.desc()),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// How the optional flush worker behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPlan {
    pub rounds: u32,
    /// The wait before announcing a flush.
    pub announce_after: Duration,
    /// The wait between the announcement and the flush.
    pub flush_after: Duration,
}

impl Default for FlushPlan {
    fn default() -> Self {
        FlushPlan {
            rounds: 3,
            announce_after: Duration::from_secs(4),
            flush_after: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The sampling period requested from the time-of-flight sensors.
    pub delay: Duration,
    /// Runs a worker flushing the first listed sensor, if set.
    pub flush: Option<FlushPlan>,
}

pub fn print_sensors<W: Write>(sensors: &[SensorInfo], out: &mut W) -> io::Result<()> {
    writeln!(out, "{} sensors found:", sensors.len())?;
    for sensor in sensors {
        writeln!(
            out,
            "{}\n\tvendor: {}\n\tversion: {}\n\thandle: {}\n\ttype: {}\n\tmaxRange: {:.6}\n\tresolution: {:.6}\n\tpower: {:.6} mA",
            sensor.name,
            sensor.vendor,
            sensor.version,
            sensor.handle,
            sensor.sensor_type,
            sensor.max_range,
            sensor.resolution,
            sensor.power
        )?;
    }
    Ok(())
}

/// Restarts every time-of-flight sensor at the sampling period of `delay`.
pub fn enable_time_of_flight<H: SensorsHal, W: Write>(
    hal: &H,
    sensors: &[SensorInfo],
    delay: Duration,
    out: &mut W,
) -> Result<(), Error> {
    let tof_sensors = || sensors.iter().filter(|sensor| sensor.is_time_of_flight());

    disable_time_of_flight(hal, sensors, out)?;

    for sensor in tof_sensors() {
        writeln!(out, "Activating sensor {}", sensor.name)?;
        hal.activate(sensor.handle, true)
            .map_err(|errno| hal_error("activate", sensor, errno))?;
        writeln!(out, "Change the rate via Batch")?;
        hal.batch(sensor.handle, delay)
            .map_err(|errno| hal_error("batch", sensor, errno))?;
        writeln!(out, "Set Delay_ms = {}", delay.as_millis())?;
    }
    Ok(())
}

pub fn disable_time_of_flight<H: SensorsHal, W: Write>(
    hal: &H,
    sensors: &[SensorInfo],
    out: &mut W,
) -> Result<(), Error> {
    for sensor in sensors.iter().filter(|sensor| sensor.is_time_of_flight()) {
        hal.activate(sensor.handle, false)
            .map_err(|errno| hal_error("deactivate", sensor, errno))?;
        writeln!(out, "Deactivated sensor {}", sensor.name)?;
    }
    Ok(())
}

fn hal_error(op: &'static str, sensor: &SensorInfo, errno: Errno) -> Error {
    Error::Hal {
        op,
        sensor: sensor.name.clone(),
        errno,
    }
}

/// Returns the milliseconds between two microsecond readings taken less than
/// a second apart, across a wrap of the microsecond counter.
pub fn elapsed_ms(prev_usec: u32, cur_usec: u32) -> u32 {
    if cur_usec < prev_usec {
        1_000_000u32.wrapping_sub(prev_usec).wrapping_add(cur_usec) / 1000
    } else {
        (cur_usec - prev_usec) / 1000
    }
}

/// Prints events, keeping the timestamp of the last time-of-flight sample.
#[derive(Debug, Default)]
pub struct EventPrinter {
    prev_usec: u32,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print<W: Write>(
        &mut self,
        index: usize,
        count: usize,
        event: &SensorsEvent,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(
            out,
            "i:{}, event type as:{}, count = {}",
            index, event.sensor_type, count
        )?;

        let data = &event.data;
        match event.sensor_type {
            SENSOR_TYPE_PROXIMITY => writeln!(out, "i: {} distance: {:.6} cm", index, data[0]),
            SENSOR_TYPE_LIGHT => writeln!(
                out,
                "i: {} lux: {:.6} Lux++++++++++++++++++++",
                index, data[0]
            ),
            SENSOR_TYPE_META_DATA if event.meta_data_what() == META_DATA_FLUSH_COMPLETE => {
                writeln!(out, "Sensors : Flush Complete event received")
            }
            SENSOR_TYPE_TIME_OF_FLIGHT => self.print_time_of_flight(index, data, out),
            other => writeln!(out, "Unknown Event type = {}", other),
        }
    }

    fn print_time_of_flight<W: Write>(
        &mut self,
        index: usize,
        data: &[f32; 16],
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "\ni: {}", index)?;
        write!(out, "tv_sec: {:.6}\t", data[0])?;
        write!(out, "tv_usec: {:.6}\t", data[1])?;
        writeln!(out, "distance: {:.6} mm\t", data[2])?;

        // Seconds do not survive the float conversion; only microseconds are used.
        let cur_usec = data[1] as u32;
        writeln!(out, "Rate(msec) : {}", elapsed_ms(self.prev_usec, cur_usec))?;
        self.prev_usec = cur_usec;

        writeln!(out, "Confidence: {:.6}\t", data[3])?;
        writeln!(out, "Near Range: {:.6} ", data[4])?;
        writeln!(out, "Far Range: {:.6}\t", data[5])?;
        writeln!(out, "signalRate : {:.6} ", data[6] / 65536.0)?;
        writeln!(out, "rtnAmbRate : {:.6}\t", data[7] / 65536.0)?;
        writeln!(out, "rtnConvTIme: {:.6}\t", data[8])?;
        writeln!(out, "Sigma      : {:.6}\t", data[9] / 65536.0)?;
        writeln!(out, "Spad Count : {} ", data[10] as i32 / 256)?;
        writeln!(out, "ErrorCode  : {:.6}\t", data[11])
    }
}

/// Prints polled events until `token` is cancelled.
///
/// The token is checked between polls only; cancelling it does not interrupt
/// a blocked poll, a flush does.
pub fn poll_events<H: SensorsHal, W: Write>(
    hal: &H,
    token: &CancelToken,
    out: &mut W,
) -> Result<(), Error> {
    let mut events = [SensorsEvent::new_zeroed(); POLL_EVENTS];
    let mut printer = EventPrinter::new();

    writeln!(out, "Starting to poll")?;
    while !token.is_cancelled() {
        let count = hal.poll(&mut events).map_err(Error::Poll)?;
        writeln!(out, "\nSensor Poll returned {} events", count)?;
        writeln!(out, "read {} ", count)?;
        for (index, event) in events[..count.min(POLL_EVENTS)].iter().enumerate() {
            printer.print(index, count, event, out)?;
        }
    }
    Ok(())
}

/// Flushes `handle` a few times, announcing each flush on `out`.
pub fn flush_periodically<H: SensorsHal, W: Write>(
    hal: &H,
    handle: i32,
    plan: &FlushPlan,
    token: &CancelToken,
    out: &mut W,
) {
    for _ in 0..plan.rounds {
        if token.wait_timeout(plan.announce_after) {
            return;
        }
        if let Err(err) = writeln!(out, "Sensor : Flush ") {
            warn!("cannot write to the terminal: {}", err);
        }
        if token.wait_timeout(plan.flush_after) {
            return;
        }
        if let Err(errno) = hal.flush(handle) {
            warn!("flush() of sensor {} failed: {}", handle, errno);
        }
    }
    info!("flush worker done");
}

/// Restarts the time-of-flight sensors and prints their events until `token`
/// is cancelled, then stops them again.
///
/// The flush worker, if any, is stopped and joined before returning.
pub fn dump<H: SensorsHal, W: Write>(
    hal: &H,
    sensors: &[SensorInfo],
    options: &Options,
    token: &CancelToken,
    out: &mut W,
) -> Result<(), Error> {
    print_sensors(sensors, out)?;
    enable_time_of_flight(hal, sensors, options.delay, out)?;

    let worker_token = CancelToken::new();
    let polled = thread::scope(|scope| {
        let worker = match (&options.flush, sensors.first()) {
            (Some(plan), Some(sensor)) => Some(scope.spawn(|| {
                flush_periodically(hal, sensor.handle, plan, &worker_token, &mut io::stdout())
            })),
            (Some(_), None) => {
                warn!("no sensor to flush");
                None
            }
            (None, _) => None,
        };

        let polled = poll_events(hal, token, out);

        worker_token.cancel();
        if let Some(Err(payload)) = worker.map(|worker| worker.join()) {
            panic::resume_unwind(payload);
        }
        polled
    });

    let disabled = disable_time_of_flight(hal, sensors, out);
    polled.and(disabled)
}

/// What [`interrupt`] did to end a running [`dump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The first time-of-flight sensor was flushed. The blocked poll returns
    /// and the dump winds down by itself.
    Woken,
    /// The poll could not be woken up. The time-of-flight sensors were
    /// stopped and the device closed; the caller has to exit.
    ShutDown,
}

/// Handles `SIGINT` received while another thread runs [`dump`] with a
/// cancelled token.
pub fn interrupt<H: SensorsHal, W: Write>(
    hal: &H,
    sensors: &[SensorInfo],
    out: &mut W,
) -> Interrupted {
    if let Err(err) = writeln!(out, "Signal is SIGINT") {
        warn!("cannot write to the terminal: {}", err);
    }

    match sensors.iter().find(|sensor| sensor.is_time_of_flight()) {
        Some(sensor) => match hal.flush(sensor.handle) {
            Ok(()) => return Interrupted::Woken,
            Err(errno) => warn!("flush() of sensor {} failed: {}", sensor.handle, errno),
        },
        None => warn!("no time-of-flight sensor to flush"),
    }

    if let Err(err) = disable_time_of_flight(hal, sensors, out) {
        warn!("{}", err);
    }
    if let Err(errno) = hal.close() {
        warn!("closing the poll device failed: {}", errno);
    }
    Interrupted::ShutDown
}
