/// Real-time clock source for the GET_* time commands.
///
/// The drive reports wall-clock time to the IPL as packed BCD. The source
/// is injectable so tests and replays see a fixed time.
use chrono::{Datelike, Timelike};

/// Calendar time as the drive RTC sees it. `month` is 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

pub trait Clock {
    fn now(&self) -> RtcTime;
}

/// Host local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> RtcTime {
        let now = chrono::Local::now();
        RtcTime {
            year: now.year(),
            month: now.month() as u8,
            day: now.day() as u8,
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
        }
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub RtcTime);

impl Clock for FixedClock {
    fn now(&self) -> RtcTime {
        self.0
    }
}

/// Two-digit packed BCD: 59 -> 0x59.
pub fn bcd(value: u8) -> u32 {
    (((value / 10) << 4) | (value % 10)) as u32
}
