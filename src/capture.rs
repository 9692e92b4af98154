//! Building a raw [`Record`] from values captured by the shell hook at
//! session start.

use crate::error::{Error, Result};
use crate::record::{BaseRecord, Record};
use chrono::format::{parse, Parsed, StrftimeItems};
use tracing::warn;

/// Version and revision of the running tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub revision: String,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            revision: revision.into(),
        }
    }

    /// Build info of this binary. The revision comes from `SHCTX_REVISION`
    /// at compile time, when set.
    pub fn current() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION"),
            option_env!("SHCTX_REVISION").unwrap_or("unknown"),
        )
    }

    /// A shell session started by another build must be reloaded. Empty
    /// requirements always pass.
    pub fn check_required(&self, version: &str, revision: &str) -> Result<()> {
        if !version.is_empty() && version != self.version {
            return Err(Error::VersionMismatch {
                what: "version",
                running: self.version.clone(),
                required: version.to_string(),
            });
        }
        if !revision.is_empty() && revision != self.revision {
            return Err(Error::VersionMismatch {
                what: "revision",
                running: self.revision.clone(),
                required: revision.to_string(),
            });
        }
        Ok(())
    }
}

/// Raw values as the shell hands them over.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInit {
    pub shell: String,
    pub uname: String,
    pub session_id: String,

    pub cols: String,
    pub lines: String,
    pub home: String,
    pub lang: String,
    pub lc_all: String,
    pub login: String,
    pub shell_env: String,
    pub term: String,

    pub pid: i64,
    pub session_pid: i64,
    pub shlvl: i64,
    pub host: String,
    pub hosttype: String,
    pub ostype: String,
    pub machtype: String,

    pub timezone_before: String,

    pub os_release_id: String,
    pub os_release_version_id: String,
    pub os_release_id_like: String,
    pub os_release_name: String,
    pub os_release_pretty_name: String,

    /// `$EPOCHREALTIME` before the command.
    pub realtime_before: String,
    /// `$EPOCHREALTIME` at session start.
    pub realtime_session: String,
    /// Seconds since boot at session start.
    pub realtime_sess_since_boot: String,

    pub machine_id: String,
    pub instance_uuid: String,
}

impl Default for SessionInit {
    fn default() -> Self {
        Self {
            shell: String::new(),
            uname: String::new(),
            session_id: String::new(),
            cols: "-1".to_string(),
            lines: "-1".to_string(),
            home: String::new(),
            lang: String::new(),
            lc_all: String::new(),
            login: String::new(),
            shell_env: String::new(),
            term: String::new(),
            pid: -1,
            session_pid: -1,
            shlvl: -1,
            host: String::new(),
            hosttype: String::new(),
            ostype: String::new(),
            machtype: String::new(),
            timezone_before: String::new(),
            os_release_id: String::new(),
            os_release_version_id: String::new(),
            os_release_id_like: String::new(),
            os_release_name: String::new(),
            os_release_pretty_name: String::new(),
            realtime_before: "-1".to_string(),
            realtime_session: "-1".to_string(),
            realtime_sess_since_boot: "-1".to_string(),
            machine_id: String::new(),
            instance_uuid: String::new(),
        }
    }
}

/// Offset of a `+HHMM` / `-HH:MM` timezone string in seconds.
pub fn timezone_offset_seconds(tz: &str) -> Option<i32> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, tz.trim(), StrftimeItems::new("%z")).ok()?;
    parsed.to_fixed_offset().ok().map(|off| off.local_minus_utc())
}

fn parse_seconds(field: &'static str, value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| Error::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Assemble the session-start record. After-execution fields stay empty.
pub fn session_record(init: &SessionInit, build: &BuildInfo) -> Result<Record> {
    let realtime_before = parse_seconds("realtimeBefore", &init.realtime_before)?;
    let realtime_session = parse_seconds("realtimeSession", &init.realtime_session)?;
    let sess_since_boot = parse_seconds("realtimeSessSinceBoot", &init.realtime_sess_since_boot)?;

    let since_session_start = realtime_before - realtime_session;
    let tz_offset = timezone_offset_seconds(&init.timezone_before).unwrap_or_else(|| {
        warn!(timezone = %init.timezone_before, "unparsable timezone offset, assuming UTC");
        0
    });

    Ok(Record {
        base: BaseRecord {
            shell: init.shell.clone(),
            uname: init.uname.clone(),
            session_id: init.session_id.clone(),

            home: init.home.clone(),
            lang: init.lang.clone(),
            lc_all: init.lc_all.clone(),
            login: init.login.clone(),
            shell_env: init.shell_env.clone(),
            term: init.term.clone(),

            pid: init.pid,
            session_pid: init.session_pid,
            host: init.host.clone(),
            hosttype: init.hosttype.clone(),
            ostype: init.ostype.clone(),
            machtype: init.machtype.clone(),
            shlvl: init.shlvl,

            timezone_before: init.timezone_before.clone(),
            realtime_before,
            realtime_before_local: realtime_before + f64::from(tz_offset),
            realtime_since_session_start: since_session_start,
            realtime_since_boot: sess_since_boot + since_session_start,

            machine_id: init.machine_id.clone(),
            os_release_id: or_default(&init.os_release_id, "linux"),
            os_release_version_id: init.os_release_version_id.clone(),
            os_release_id_like: init.os_release_id_like.clone(),
            os_release_name: or_default(&init.os_release_name, "Linux"),
            os_release_pretty_name: or_default(&init.os_release_pretty_name, "Linux"),

            instance_uuid: init.instance_uuid.clone(),
            tool_version: build.version.clone(),
            tool_revision: build.revision.clone(),
            ..Default::default()
        },
        cols: init.cols.clone(),
        lines: init.lines.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timezone_offset() {
        assert_eq!(timezone_offset_seconds("+0200"), Some(7200));
        assert_eq!(timezone_offset_seconds("-0530"), Some(-19800));
        assert_eq!(timezone_offset_seconds("+0000"), Some(0));
        assert_eq!(timezone_offset_seconds(""), None);
        assert_eq!(timezone_offset_seconds("CEST"), None);
    }

    #[test]
    fn test_session_record() -> Result<()> {
        let init = SessionInit {
            shell: "zsh".to_string(),
            session_id: "sess".to_string(),
            cols: "132".to_string(),
            lines: "43".to_string(),
            timezone_before: "+0100".to_string(),
            realtime_before: "1000.5".to_string(),
            realtime_session: "900.5".to_string(),
            realtime_sess_since_boot: "50".to_string(),
            os_release_name: "Fedora Linux".to_string(),
            ..Default::default()
        };
        let build = BuildInfo::new("2.1.0", "abc123");

        let record = session_record(&init, &build)?;
        let b = record.base();
        assert_eq!(b.realtime_before, 1000.5);
        assert_eq!(b.realtime_before_local, 4600.5);
        assert_eq!(b.realtime_since_session_start, 100.0);
        assert_eq!(b.realtime_since_boot, 150.0);
        assert_eq!(b.os_release_id, "linux");
        assert_eq!(b.os_release_name, "Fedora Linux");
        assert_eq!(b.os_release_pretty_name, "Linux");
        assert_eq!(b.tool_version, "2.1.0");
        assert_eq!(b.tool_revision, "abc123");
        assert_eq!(record.cols, "132");
        assert!(b.cmd_line.is_empty());
        assert_eq!(b.realtime_after, 0.0);
        Ok(())
    }

    #[test]
    fn test_session_record_rejects_bad_timestamp() {
        let init = SessionInit {
            realtime_before: "yesterday".to_string(),
            ..Default::default()
        };
        let err = session_record(&init, &BuildInfo::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { field: "realtimeBefore", .. }));
    }

    #[test]
    fn test_bad_timezone_falls_back_to_utc() -> Result<()> {
        let init = SessionInit {
            realtime_before: "10".to_string(),
            timezone_before: "garbage".to_string(),
            ..Default::default()
        };
        let record = session_record(&init, &BuildInfo::default())?;
        assert_eq!(record.base.realtime_before_local, 10.0);
        Ok(())
    }

    #[test]
    fn test_check_required() {
        let build = BuildInfo::new("1.0.0", "deadbeef");
        assert!(build.check_required("", "").is_ok());
        assert!(build.check_required("1.0.0", "deadbeef").is_ok());
        assert!(matches!(
            build.check_required("0.9.0", ""),
            Err(Error::VersionMismatch { what: "version", .. })
        ));
        assert!(matches!(
            build.check_required("", "cafe"),
            Err(Error::VersionMismatch { what: "revision", .. })
        ));
    }
}
