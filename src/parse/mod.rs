//! reading and parsing column based scan files
//!
//! Two header conventions are understood:
//!
//! * QTLab: the first line is `# Filename: ...`, followed by `# Timestamp: ...` and one
//!   `# Column n` block per column with `#\tname: ...` and optionally `#\tsize: ...` lines
//! * QCoDeS: three comment lines holding the column ids, the quoted column labels and the
//!   sizes of the setpoint columns
//!
//! After the header every non-empty, non-comment line is one record of tab separated
//! numbers. A QTLab `.set` file next to the data file is read into
//! [`ScanTable::settings`](`crate::ScanTable`).

mod error;

pub use error::ParseError;
pub use error::{Header, Records, Settings};

use crate::data::{Column, InstrumentSettings, ScanTable};
use crate::prelude::*;

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

const QTLAB_FILENAME: &str = "# Filename: ";
const QTLAB_TIMESTAMP: &str = "# Timestamp: ";
const QTLAB_NAME: &str = "#\tname";
const QTLAB_SIZE: &str = "#\tsize";

/// read in and parse an entire scan file (and its `.set` sidecar, if present) for a given path
pub fn read_dat<P: AsRef<Path>>(path: P) -> Result<ScanTable, ParseError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading scan file");

    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);

    let mut table = parse_dat(reader)?;

    if table.filename.is_empty() {
        table.filename = path.display().to_string();
    }

    let settings_path = path.with_extension("set");
    if settings_path.exists() {
        let file = std::fs::File::open(&settings_path)?;
        table.settings = parse_settings(std::io::BufReader::new(file))?;
    } else {
        tracing::warn!(path = %settings_path.display(), "could not find settings file");
    }

    Ok(table)
}

/// parse a scan file from any buffered reader
pub fn parse_dat<R: BufRead>(reader: R) -> Result<ScanTable, ParseError> {
    let mut lines = reader.lines().enumerate();

    let (_, first_line) = lines.next().ok_or(Header::Empty)?;
    let first_line = first_line?;
    let first_line = first_line.trim_end_matches(['\n', '\t', '\r']);

    let mut header = if first_line.starts_with(QTLAB_FILENAME) {
        tracing::debug!("reading QTLab header");
        read_qtlab_header(first_line, &mut lines)?
    } else {
        tracing::debug!("reading QCoDeS header");
        read_qcodes_header(first_line, &mut lines)?
    };

    let data = read_records(header.pending.take(), &mut lines, header.columns.len())?;

    Ok(ScanTable {
        filename: header.filename,
        timestamp: header.timestamp,
        columns: header.columns,
        data,
        settings: BTreeMap::new(),
    })
}

type Lines<R> = std::iter::Enumerate<std::io::Lines<R>>;

#[derive(Default)]
struct ParsedHeader {
    filename: String,
    timestamp: String,
    columns: Vec<Column>,
    /// the first record line, which QTLab headers have to consume to know they ended
    pending: Option<(usize, String)>,
}

fn split_value(line: &str) -> Option<&str> {
    line.split_once(": ").map(|(_, value)| value)
}

fn read_qtlab_header<R: BufRead>(
    first_line: &str,
    lines: &mut Lines<R>,
) -> Result<ParsedHeader, ParseError> {
    let mut header = ParsedHeader {
        filename: split_value(first_line).unwrap_or_default().to_string(),
        ..Default::default()
    };

    for (idx, line) in lines {
        let line = line?;
        let line = line.trim_end_matches(['\n', '\t', '\r']);
        let line_number = idx + 1;

        if line.starts_with(QTLAB_TIMESTAMP) {
            header.timestamp = split_value(line).unwrap_or_default().to_string();
        } else if line.starts_with(QTLAB_NAME) {
            let name = split_value(line).ok_or_else(|| {
                Header::from(error::MalformedLine::new(
                    line_number,
                    line.to_string(),
                    "missing column name",
                ))
            })?;
            header.columns.push(Column::new(name, 1));
        } else if line.starts_with(QTLAB_SIZE) {
            let size = split_value(line)
                .and_then(|size| size.trim().parse::<usize>().ok())
                .ok_or_else(|| {
                    Header::from(error::MalformedLine::new(
                        line_number,
                        line.to_string(),
                        "invalid column size",
                    ))
                })?;

            let column = header
                .columns
                .last_mut()
                .ok_or_else(|| Header::from(error::MissingColumnName::new(line_number)))?;
            column.size = size;
        } else if !line.is_empty() && !line.starts_with('#') {
            // a line starting with a number is the first record
            header.pending = Some((idx, line.to_string()));
            break;
        }
    }

    Ok(header)
}

fn read_qcodes_header<R: BufRead>(
    first_line: &str,
    lines: &mut Lines<R>,
) -> Result<ParsedHeader, ParseError> {
    let ids: Vec<&str> = first_line.split_whitespace().skip(1).collect();

    let mut next_comment = |what: &'static str| -> Result<String, ParseError> {
        match lines.next() {
            Some((idx, line)) => {
                let line = line?;
                let content = line
                    .trim()
                    .strip_prefix("# ")
                    .map(str::to_string)
                    .ok_or_else(|| Header::from(error::MalformedLine::new(idx + 1, line.clone(), what)))?;
                Ok(content)
            }
            None => Err(Header::Empty.into()),
        }
    };

    let labels = next_comment("expected a line of column labels")?;
    let sizes = next_comment("expected a line of column sizes")?;

    let labels: Vec<String> = labels
        .split('\t')
        .map(|label| label.trim_matches('"').to_string())
        .collect();

    let sizes = sizes
        .split_whitespace()
        .map(|size| size.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Header::from(error::MalformedLine::new(3, sizes.clone(), "invalid column size")))?;

    // the sizes belong to the leading setpoint columns
    let columns = ids
        .iter()
        .enumerate()
        .map(|(idx, id)| Column {
            id: id.to_string(),
            label: labels.get(idx).cloned().unwrap_or_else(|| id.to_string()),
            size: sizes.get(idx).copied().unwrap_or(1),
        })
        .collect();

    Ok(ParsedHeader {
        columns,
        ..Default::default()
    })
}

fn parse_record(line_number: usize, line: &str, expected: usize) -> Result<Vec<f64>, Records> {
    let values = line
        .split_whitespace()
        .enumerate()
        .map(|(column, token)| {
            token
                .parse::<f64>()
                .map_err(|_| error::MalformedValue::new(line_number, column + 1, token.to_string()))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() != expected {
        return Err(error::RaggedRow::new(line_number, expected, values.len()).into());
    }

    Ok(values)
}

fn read_records<R: BufRead>(
    pending: Option<(usize, String)>,
    lines: &mut Lines<R>,
    columns: usize,
) -> Result<Array2<f64>, ParseError> {
    let mut values: Vec<f64> = Vec::new();
    let mut records = 0;

    if let Some((idx, line)) = pending {
        values.extend(parse_record(idx + 1, &line, columns)?);
        records += 1;
    }

    for (idx, line) in lines {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        values.extend(parse_record(idx + 1, line, columns)?);
        records += 1;
    }

    // the length always matches since every record was checked against `columns`
    let data = Array2::from_shape_vec((records, columns), values)
        .unwrap_or_else(|_| Array2::zeros((0, columns)));

    Ok(data)
}

/// parse a QTLab `.set` settings file
///
/// Unindented lines either hold a top level entry (`Filename`, `Timestamp`) or start
/// a new instrument section; tab indented lines are parameters of the latest instrument.
pub fn parse_settings<R: BufRead>(
    reader: R,
) -> Result<BTreeMap<String, InstrumentSettings>, ParseError> {
    let mut settings: BTreeMap<String, InstrumentSettings> = BTreeMap::new();
    let mut current_instrument: Option<String> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\n', '\t', '\r']);
        let line_number = idx + 1;

        if line.is_empty() {
            continue;
        }

        let (name, value) = line.split_once(": ").ok_or_else(|| {
            Settings::from(error::MalformedLine::new(
                line_number,
                line.to_string(),
                "expected a `name: value` pair",
            ))
        })?;

        if !line.starts_with('\t') {
            if name == "Filename" || name == "Timestamp" {
                settings
                    .entry(String::new())
                    .or_default()
                    .push((name.to_string(), value.to_string()));
            } else {
                current_instrument = Some(value.to_string());
                settings.entry(value.to_string()).or_default();
            }
        } else {
            let parameter = name.trim().to_string();

            let instrument = current_instrument
                .as_ref()
                .ok_or_else(|| Settings::from(error::OrphanParameter::new(line_number, parameter.clone())))?;

            settings
                .entry(instrument.clone())
                .or_default()
                .push((parameter, value.to_string()));
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QTLAB: &str = "# Filename: sweep.dat
# Timestamp: Thu Jan 01 12:00:00 2015

# Column 1
#\tname: gate
#\tsize: 2
# Column 2
#\tname: bias
#\tsize: 3
# Column 3
#\tname: current

0.0\t-1.0\t1e-9
0.0\t0.0\t2e-9
0.0\t1.0\t3e-9

1.0\t-1.0\t4e-9
1.0\t0.0\tnan
1.0\t1.0\t6e-9
";

    const QCODES: &str = "# gate bias current
# \"Gate (V)\"\t\"Bias (V)\"\t\"Current (A)\"
# 2\t3
0.0\t-1.0\t1.0
0.0\t0.0\t2.0
";

    #[test]
    fn qtlab_header_and_records() {
        let table = parse_dat(QTLAB.as_bytes()).unwrap();

        assert_eq!(table.filename, "sweep.dat");
        assert_eq!(table.timestamp, "Thu Jan 01 12:00:00 2015");
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["gate", "bias", "current"]);
        assert_eq!(
            table.columns.iter().map(|c| c.size).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
        assert_eq!(table.data.dim(), (6, 3));
        assert_eq!(table.data[[3, 2]], 4e-9);
        assert!(table.data[[4, 2]].is_nan());
        assert_eq!(table.ndim(), 2);
    }

    #[test]
    fn qcodes_header_and_records() {
        let table = parse_dat(QCODES.as_bytes()).unwrap();

        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["gate", "bias", "current"]);
        assert_eq!(table.columns[1].label, "Bias (V)");
        assert_eq!(
            table.columns.iter().map(|c| c.size).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
        assert_eq!(table.data.dim(), (2, 3));
    }

    #[test]
    fn ragged_records_are_rejected() {
        let text = "# Filename: a.dat\n#\tname: a\n#\tname: b\n1.0\t2.0\n3.0\n";
        let err = parse_dat(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Records(Records::RaggedRow(_))));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let text = "# Filename: a.dat\n#\tname: a\n1.0\n2.0x\n";
        let err = parse_dat(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Records(Records::MalformedValue(_))));
    }

    #[test]
    fn settings_are_grouped_by_instrument() {
        let text = "Filename: sweep.set\nTimestamp: today\n\nInstrument: ivvi\n\tdac1: 0.5\n\tdac2: 1.5\nInstrument: keithley\n\trange: 10\n";
        let settings = parse_settings(text.as_bytes()).unwrap();

        assert_eq!(settings[""].len(), 2);
        assert_eq!(
            settings["ivvi"],
            vec![
                ("dac1".to_string(), "0.5".to_string()),
                ("dac2".to_string(), "1.5".to_string())
            ]
        );
        assert_eq!(settings["keithley"][0].1, "10");
    }

    #[test]
    fn parameter_without_instrument_is_an_error() {
        let err = parse_settings("\tdac1: 0.5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Settings(Settings::OrphanParameter(_))));
    }
}
