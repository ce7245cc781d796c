// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Parse `squeue` reports into an aggregated `QueueSnapshot`.
//!
//! Expected input is one job per line with six comma-separated fields:
//! partition, user, job name, state, cores, memory. No header line.

use super::error::{ParseErrorKind, QueueError};
use super::types::{QueueRecord, QueueSnapshot};

/// Field separator used in the `squeue --format` string
pub const FIELD_DELIMITER: char = ',';

/// Number of fields per report line
pub const FIELD_COUNT: usize = 6;

/// Parse a raw `squeue` report.
///
/// Lines without the delimiter are skipped. Any other malformed line fails
/// the whole report, so callers never see a partial snapshot.
pub fn parse_queue(input: &[u8]) -> Result<QueueSnapshot, QueueError> {
    let text = String::from_utf8_lossy(input);
    let mut snapshot = QueueSnapshot::default();

    for (index, line) in text.lines().enumerate() {
        if !line.contains(FIELD_DELIMITER) {
            continue;
        }
        let record = parse_record(line).map_err(|kind| QueueError::Parse {
            line: index + 1,
            kind,
        })?;
        snapshot.add(&record);
    }

    Ok(snapshot)
}

/// Split one report line into a record. String fields are taken verbatim.
fn parse_record(line: &str) -> Result<QueueRecord<'_>, ParseErrorKind> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    let &[partition, user, name, state, cores, memory] = fields.as_slice() else {
        return Err(ParseErrorKind::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    };

    Ok(QueueRecord {
        partition,
        user,
        name,
        state,
        cores: parse_number("cores", cores)?,
        memory: parse_number("memory", memory)?,
    })
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ParseErrorKind> {
    value
        .parse::<f64>()
        .map_err(|source| ParseErrorKind::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}
