use crate::record::EnrichedRecord;

/// Copy of `record` holding only what is known before the command runs.
///
/// The command line is cleared and every "after" field takes its "before"
/// value, so nothing about the outcome can leak into ranking. Errors found
/// on the source record do not carry over.
pub fn stripped(record: &EnrichedRecord) -> EnrichedRecord {
    let mut r = record.clone();
    r.errors.clear();
    r.set_cmd_line("");

    let base = r.base_mut();
    base.pwd_after = base.pwd.clone();
    base.real_pwd_after = base.real_pwd.clone();
    base.timezone_after = base.timezone_before.clone();
    base.realtime_after = base.realtime_before;
    base.realtime_after_local = base.realtime_before_local;
    base.realtime_duration = 0.0;

    r.last_record_of_session = false;
    r
}
