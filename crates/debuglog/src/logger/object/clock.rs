use time::{
    Duration, OffsetDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::logger::object::LoggerTimeZone;

/// Current instant in the configured zone, truncated to whole seconds.
pub(crate) fn now(tz: LoggerTimeZone) -> OffsetDateTime {
    let ts = OffsetDateTime::now_utc().to_offset(tz.offset());
    ts - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// RFC 3339 rendering used for the `time` field.
pub(crate) fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| "<invalid-time>".to_string())
}

const FILE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// `YYYYMMDD_HHMMSS` stamp used in timestamped file names.
pub(crate) fn file_stamp(ts: OffsetDateTime) -> String {
    ts.format(FILE_STAMP)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}
