// src/process/date_parser.rs

use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone};

/// Parse a dump timestamp into epoch milliseconds, falling back to the host's
/// local zone when the text carries no offset.
///
/// Accepted shape: `yyyy[-/]MM[-/]dd[T ]HH[:]mm[:]ss[.f{1,9}][ ][offset]` with
/// every bracketed separator optional, colons used throughout the time or not
/// at all, and `offset` one of `Z`, `+HH`, `+HHMM`, `+HH:MM`.
///
/// Unzoned results depend on the zone of the machine doing the decoding. Use
/// [`parse_timestamp_millis_in`] when that matters.
pub fn parse_timestamp_millis(s: &str) -> Result<i64, String> {
    parse_timestamp_millis_in(s, &Local)
}

/// Same as [`parse_timestamp_millis`] but with an explicit fallback zone.
pub fn parse_timestamp_millis_in<Tz: TimeZone>(s: &str, fallback: &Tz) -> Result<i64, String> {
    let (naive, offset) =
        parse_parts(s).ok_or_else(|| format!("unrecognised timestamp {:?}", s))?;

    match offset {
        Some(offset) => Ok(naive.and_utc().timestamp_millis()
            - i64::from(offset.local_minus_utc()) * 1000),
        None => local_to_millis(&naive, fallback)
            .ok_or_else(|| format!("cannot place {} in the local time zone", naive)),
    }
}

/// Ambiguous wall-clock times take the earlier instant. Times that fall in a
/// gap use the offset in force just before it, which moves them forward by
/// the gap length.
fn local_to_millis<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> Option<i64> {
    if let Some(dt) = tz.from_local_datetime(naive).earliest() {
        return Some(dt.timestamp_millis());
    }

    [1, 3, 24].iter().find_map(|hours| {
        let probe = *naive - TimeDelta::hours(*hours);
        let before = tz.from_local_datetime(&probe).earliest()?;
        let offset = before.offset().fix();
        Some(naive.and_utc().timestamp_millis() - i64::from(offset.local_minus_utc()) * 1000)
    })
}

struct Cursor<'a> {
    b: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.b.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &[u8]) -> bool {
        match self.peek() {
            Some(c) if set.contains(&c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn digits(&mut self, n: usize) -> Option<u32> {
        let end = self.pos + n;
        let slice = self.b.get(self.pos..end)?;
        if !slice.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos = end;
        Some(slice.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
    }

    fn done(&self) -> bool {
        self.pos == self.b.len()
    }
}

fn parse_parts(s: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    let mut c = Cursor {
        b: s.as_bytes(),
        pos: 0,
    };

    let year = c.digits(4)? as i32;
    c.eat_any(b"-/");
    let month = c.digits(2)?;
    c.eat_any(b"-/");
    let day = c.digits(2)?;
    c.eat_any(b"T ");

    let hour = c.digits(2)?;
    let colons = c.eat(b':');
    let minute = c.digits(2)?;
    if colons != c.eat(b':') {
        return None;
    }
    let second = c.digits(2)?;

    let mut nanos = 0u32;
    if c.eat(b'.') {
        let start = c.pos;
        while c.peek().is_some_and(|d| d.is_ascii_digit()) && c.pos - start < 9 {
            c.pos += 1;
        }
        let frac = &c.b[start..c.pos];
        if frac.is_empty() {
            return None;
        }
        let value = frac.iter().fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
        nanos = value * 10u32.pow(9 - frac.len() as u32);
    }

    c.eat(b' ');
    let offset = parse_offset(&mut c)?;
    if !c.done() {
        return None;
    }

    let naive =
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_nano_opt(hour, minute, second, nanos)?;
    Some((naive, offset))
}

/// `Some(None)` when there is no offset at all, `None` when one is present
/// but malformed.
fn parse_offset(c: &mut Cursor<'_>) -> Option<Option<FixedOffset>> {
    if c.done() {
        return Some(None);
    }
    if c.eat(b'Z') {
        return Some(FixedOffset::east_opt(0));
    }

    let sign = match c.peek()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    c.pos += 1;

    let hours = c.digits(2)?;
    let minutes = if c.done() {
        0
    } else {
        c.eat(b':');
        c.digits(2)?
    };
    if hours > 18 || minutes > 59 {
        return None;
    }
    let secs = sign * (hours * 3600 + minutes * 60) as i32;
    FixedOffset::east_opt(secs).map(Some)
}
