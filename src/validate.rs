use crate::record::Record;
use thiserror::Error;

/// Required-field violations, in the order they are checked.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    #[error("There is no CmdLine")]
    NoCmdLine,
    #[error("There is no Time")]
    NoTime,
    #[error("There is no Local Time")]
    NoLocalTime,
    #[error("There is no Real Pwd")]
    NoRealPwd,
    #[error("There is no Pwd")]
    NoPwd,
}

/// Check required fields, reporting only the first rule that fails.
pub fn validate(record: &Record) -> Result<(), Violation> {
    let r = record.base();
    if r.cmd_line.is_empty() {
        return Err(Violation::NoCmdLine);
    }
    if r.realtime_before == 0.0 || r.realtime_after == 0.0 {
        return Err(Violation::NoTime);
    }
    if r.realtime_before_local == 0.0 || r.realtime_after_local == 0.0 {
        return Err(Violation::NoLocalTime);
    }
    if r.real_pwd.is_empty() || r.real_pwd_after.is_empty() {
        return Err(Violation::NoRealPwd);
    }
    if r.pwd.is_empty() || r.pwd_after.is_empty() {
        return Err(Violation::NoPwd);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::BaseRecord;

    pub(crate) fn valid_record() -> Record {
        Record {
            base: BaseRecord {
                cmd_line: "cargo build".to_string(),
                realtime_before: 1_700_000_000.0,
                realtime_after: 1_700_000_003.5,
                realtime_before_local: 1_700_007_200.0,
                realtime_after_local: 1_700_007_203.5,
                pwd: "/home/me/src".to_string(),
                pwd_after: "/home/me/src".to_string(),
                real_pwd: "/data/me/src".to_string(),
                real_pwd_after: "/data/me/src".to_string(),
                ..Default::default()
            },
            cols: "80".to_string(),
            lines: "24".to_string(),
        }
    }

    #[test]
    fn test_valid_record() {
        assert_eq!(validate(&valid_record()), Ok(()));
    }

    #[test]
    fn test_each_rule() {
        let mut r = valid_record();
        r.base.realtime_after = 0.0;
        assert_eq!(validate(&r), Err(Violation::NoTime));

        let mut r = valid_record();
        r.base.realtime_before_local = 0.0;
        assert_eq!(validate(&r), Err(Violation::NoLocalTime));

        let mut r = valid_record();
        r.base.real_pwd_after.clear();
        assert_eq!(validate(&r), Err(Violation::NoRealPwd));

        let mut r = valid_record();
        r.base.pwd.clear();
        assert_eq!(validate(&r), Err(Violation::NoPwd));
    }

    #[test]
    fn test_first_violation_wins() {
        assert_eq!(validate(&Record::default()), Err(Violation::NoCmdLine));

        let mut r = valid_record();
        r.base.realtime_before_local = 0.0;
        r.base.pwd.clear();
        r.base.real_pwd.clear();
        assert_eq!(validate(&r), Err(Violation::NoLocalTime));
    }

    #[test]
    fn test_violation_messages() {
        assert_eq!(Violation::NoCmdLine.to_string(), "There is no CmdLine");
        assert_eq!(Violation::NoPwd.to_string(), "There is no Pwd");
    }
}
