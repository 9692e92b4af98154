use crate::command::command_and_first_token;
use crate::record::{EnrichedRecord, Record, RecordError};
use crate::validate::validate;
use std::collections::HashMap;
use tracing::warn;

/// Derive command fields and validate. Problems are recorded on the result,
/// never returned.
pub fn enrich(record: Record) -> EnrichedRecord {
    let mut enriched = EnrichedRecord {
        record,
        ..Default::default()
    };

    match command_and_first_token(&enriched.base().cmd_line) {
        Ok((command, first_token)) => {
            enriched.command = command;
            enriched.first_token = first_token;
        }
        Err(err) => {
            enriched.errors.push(RecordError::tokenize(err.to_string()));
            enriched.invalid = true;
        }
    }

    if let Err(violation) = validate(enriched.record()) {
        enriched
            .errors
            .push(RecordError::validation(violation.to_string()));
        enriched.invalid = true;
    }

    if enriched.invalid {
        match enriched.to_json_string() {
            Ok(json) => warn!("invalid record: {json}"),
            Err(err) => warn!("invalid record (unserializable: {err})"),
        }
    }
    enriched
}

/// Enrich records in input order, numbering each session's records from 0 and
/// flagging the last record seen for every session.
pub fn enrich_batch(records: impl IntoIterator<Item = Record>) -> Vec<EnrichedRecord> {
    let mut next_seq: HashMap<String, u64> = HashMap::new();
    let mut last_index: HashMap<String, usize> = HashMap::new();

    let mut enriched: Vec<EnrichedRecord> = Vec::new();
    for (idx, record) in records.into_iter().enumerate() {
        let mut rec = enrich(record);
        let session = rec.base().session_id.clone();
        let seq = next_seq.entry(session.clone()).or_insert(0);
        rec.seq_session_id = *seq;
        *seq += 1;
        last_index.insert(session, idx);
        enriched.push(rec);
    }

    for idx in last_index.into_values() {
        enriched[idx].last_record_of_session = true;
    }
    enriched
}

impl EnrichedRecord {
    /// Replace the command line and re-derive what depends on it. The
    /// validator is not re-run.
    pub fn set_cmd_line(&mut self, cmd_line: &str) {
        let base = self.base_mut();
        base.cmd_line = cmd_line.to_string();
        base.cmd_length = Some(cmd_line.len());
        base.exit_code = 0;

        self.invalid = false;
        match command_and_first_token(cmd_line) {
            Ok((command, first_token)) => {
                self.command = command;
                self.first_token = first_token;
            }
            Err(err) => {
                self.command.clear();
                self.first_token.clear();
                self.errors.push(RecordError::tokenize(err.to_string()));
                self.invalid = true;
            }
        }
    }
}
