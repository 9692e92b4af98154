//! Wire shapes of a captured shell command.
//!
//! Two schemas exist on the wire. They differ only in how terminal geometry
//! is encoded: the current [`Record`] carries `cols`/`lines` as strings, the
//! legacy [`FallbackRecord`] as integers. [`decode_record`] probes the current
//! shape first and migrates legacy payloads.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Reads `null` as the field's zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Attributes shared by every schema version.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BaseRecord {
    // identity
    #[serde(deserialize_with = "null_as_default")]
    pub cmd_line: String,
    #[serde(deserialize_with = "null_as_default")]
    pub exit_code: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub shell: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,

    // posix environment
    #[serde(deserialize_with = "null_as_default")]
    pub home: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lang: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lc_all: String,
    #[serde(deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pwd: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pwd_after: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shell_env: String,
    #[serde(deserialize_with = "null_as_default")]
    pub term: String,

    // non-posix environment
    #[serde(deserialize_with = "null_as_default")]
    pub real_pwd: String,
    #[serde(deserialize_with = "null_as_default")]
    pub real_pwd_after: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub session_pid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hosttype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ostype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub machtype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shlvl: i64,

    // timing
    #[serde(deserialize_with = "null_as_default")]
    pub timezone_before: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timezone_after: String,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_before: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_after: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_before_local: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_after_local: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_duration: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_since_session_start: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub realtime_since_boot: f64,

    // git
    #[serde(deserialize_with = "null_as_default")]
    pub git_dir: String,
    #[serde(deserialize_with = "null_as_default")]
    pub git_real_dir: String,
    #[serde(deserialize_with = "null_as_default")]
    pub git_origin_remote: String,

    // device and tool metadata
    #[serde(deserialize_with = "null_as_default")]
    pub machine_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_release_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_release_version_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_release_id_like: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_release_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub os_release_pretty_name: String,
    #[serde(rename = "reshUuid", deserialize_with = "null_as_default")]
    pub instance_uuid: String,
    #[serde(rename = "reshVersion", deserialize_with = "null_as_default")]
    pub tool_version: String,
    #[serde(rename = "reshRevision", deserialize_with = "null_as_default")]
    pub tool_revision: String,

    // set by the sanitizer only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd_length: Option<usize>,
}

/// Current schema: terminal geometry as strings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Record {
    #[serde(flatten)]
    pub base: BaseRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cols: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lines: String,
}

impl Record {
    pub fn base(&self) -> &BaseRecord {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.base
    }
}

/// Legacy schema: terminal geometry as integers.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FallbackRecord {
    #[serde(flatten)]
    pub base: BaseRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cols: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lines: i64,
}

impl From<FallbackRecord> for Record {
    fn from(legacy: FallbackRecord) -> Self {
        Record {
            base: legacy.base,
            cols: legacy.cols.to_string(),
            lines: legacy.lines.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorKind {
    Tokenize,
    Validation,
}

/// One problem found while enriching a record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub kind: RecordErrorKind,
    pub message: String,
}

impl RecordError {
    pub fn tokenize(message: impl Into<String>) -> Self {
        Self {
            kind: RecordErrorKind::Tokenize,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: RecordErrorKind::Validation,
            message: message.into(),
        }
    }
}

/// A record plus the fields derived during enrichment.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,

    #[serde(default)]
    pub command: String,
    #[serde(default, rename = "firstWord")]
    pub first_token: String,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default)]
    pub seq_session_id: u64,
    #[serde(default)]
    pub last_record_of_session: bool,
    #[serde(default)]
    pub debug_this_record: bool,
    #[serde(default)]
    pub errors: Vec<RecordError>,
}

impl EnrichedRecord {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn base(&self) -> &BaseRecord {
        &self.record.base
    }

    pub fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.record.base
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode one payload, migrating the legacy schema when the current one
/// does not fit.
pub fn decode_record(payload: &[u8]) -> Result<Record> {
    let current = match serde_json::from_slice::<Record>(payload) {
        Ok(record) => return Ok(record),
        Err(err) => err,
    };
    match serde_json::from_slice::<FallbackRecord>(payload) {
        Ok(legacy) => {
            debug!("migrating legacy record (cols/lines as integers): {current}");
            Ok(legacy.into())
        }
        Err(legacy) => Err(Error::SchemaDecode { current, legacy }),
    }
}
