//! NAV-PVT: navigation position, velocity and time solution
//!
//! Only the time, position and accuracy fields are kept. The calendar fields
//! are converted to Unix seconds as UTC, which is what the receiver reports.

use chrono::NaiveDate;

use super::{DecodeContext, MessageSpec, NAV_PVT, PayloadShape};
use crate::Result;
use crate::types::{FieldGroup, PositionTime, le_field::read};

pub const NAME: &str = "NAV-PVT";
pub const SHAPE: PayloadShape = PayloadShape::Fixed(92);

pub const SPEC: MessageSpec = MessageSpec { name: NAME, message: NAV_PVT, shape: SHAPE, decode };

const YEAR: usize = 4;
const MONTH: usize = 6;
const DAY: usize = 7;
const HOUR: usize = 8;
const MIN: usize = 9;
const SEC: usize = 10;
const VALID: usize = 11;
const LON: usize = 24;
const LAT: usize = 28;
const HEIGHT: usize = 32;
const H_ACC: usize = 40;
const V_ACC: usize = 44;

/// validDate and validTime
const VALID_DATE_TIME: u8 = 0x03;

pub fn parse(payload: &[u8], _context: &DecodeContext) -> Result<PositionTime> {
    super::expect_length(NAME, payload, SHAPE, 0)?;

    let valid: u8 = read(payload, VALID)?;
    let timestamp = unix_seconds(
        read(payload, YEAR)?,
        read(payload, MONTH)?,
        read(payload, DAY)?,
        read(payload, HOUR)?,
        read(payload, MIN)?,
        read(payload, SEC)?,
    );

    Ok(PositionTime {
        time_valid: valid & VALID_DATE_TIME == VALID_DATE_TIME && timestamp.is_some(),
        timestamp: timestamp.unwrap_or(0),
        lat: read(payload, LAT)?,
        lon: read(payload, LON)?,
        height: read(payload, HEIGHT)?,
        h_acc: read(payload, H_ACC)?,
        v_acc: read(payload, V_ACC)?,
    })
}

/// UTC calendar fields to Unix seconds.
///
/// A leap second (sec = 60) rolls into the next minute.
fn unix_seconds(year: u16, month: u8, day: u8, hour: u8, min: u8, sec: u8) -> Option<i64> {
    if sec > 60 {
        return None;
    }
    let minute_start = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())?
        .and_hms_opt(hour.into(), min.into(), 0)?
        .and_utc()
        .timestamp();
    Some(minute_start + i64::from(sec))
}

fn decode(payload: &[u8], context: &DecodeContext) -> Result<FieldGroup> {
    parse(payload, context).map(FieldGroup::PositionTime)
}
