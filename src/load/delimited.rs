use crate::load::raw_table::{cell_value, header_name, RawTable};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::{borrow::Cow, fmt};
use tracing::{debug, trace};

/// Text encodings tried, in order, for delimited files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Iso8859_1,
    Cp1252,
}

pub const ENCODING_PRIORITY: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Iso8859_1,
    TextEncoding::Cp1252,
];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Iso8859_1 => "iso-8859-1",
            TextEncoding::Cp1252 => "cp1252",
        }
    }

    /// Strict decode; `None` when the bytes are not valid in this encoding.
    ///
    /// Latin-1 maps every byte, so C1 control characters (0x80..=0x9F) are
    /// treated as a mismatch: in these exports they only show up when the
    /// file is really cp1252.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(Cow::Borrowed)
            }
            TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
                if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
                    None
                } else {
                    Some(encoding_rs::mem::decode_latin1(bytes))
                }
            }
            TextEncoding::Cp1252 => {
                WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a single encoding attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    Undecodable,
    Malformed(String),
}

/// Delimiters considered by the sniffer, in tie-break order.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 20;

/// Count `delim` outside double-quoted sections of one line.
fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            n += 1;
        }
    }
    n
}

/// Guess the field delimiter from the leading lines of `text`.
///
/// A candidate scores by how many sample lines carry the same number of
/// delimiters as the header line; the header count breaks ties. Falls back to
/// a comma when nothing appears on the header line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let Some(header) = sample.first() else {
        return b',';
    };

    let mut best: Option<(u8, usize, usize)> = None;
    for &delim in &CANDIDATE_DELIMITERS {
        let expected = count_unquoted(header, delim);
        if expected == 0 {
            continue;
        }
        let consistent = sample
            .iter()
            .filter(|l| count_unquoted(l, delim) == expected)
            .count();
        trace!(delim = %(delim as char), expected, consistent, "delimiter candidate");
        let better = match best {
            None => true,
            Some((_, c, e)) => consistent > c || (consistent == c && expected > e),
        };
        if better {
            best = Some((delim, consistent, expected));
        }
    }
    best.map(|(d, _, _)| d).unwrap_or(b',')
}

/// Parse decoded text into a `RawTable`. Rows with more fields than the
/// header are rejected; shorter rows are padded. Blank lines are skipped by
/// the reader, but a line of bare delimiters is kept as an all-null row.
pub fn parse_text(text: &str) -> Result<RawTable, AttemptError> {
    let delimiter = sniff_delimiter(text);
    debug!(delimiter = %(delimiter as char), "parsing delimited text");

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| AttemptError::Malformed(e.to_string()))?;
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AttemptError::Malformed("no header row".into()));
    }
    let mut table = RawTable::new(
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| header_name(h, i))
            .collect(),
    );

    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| AttemptError::Malformed(e.to_string()))?;
        if record.len() > table.headers.len() {
            return Err(AttemptError::Malformed(format!(
                "expected {} fields in line {}, saw {}",
                table.headers.len(),
                idx + 2,
                record.len()
            )));
        }
        table.push_row(record.iter().map(cell_value).collect());
    }
    Ok(table)
}

/// Try each encoding in priority order; the first that decodes and parses wins.
pub fn parse_bytes(
    bytes: &[u8],
) -> Result<(RawTable, TextEncoding), Vec<(TextEncoding, AttemptError)>> {
    let mut failures = Vec::with_capacity(ENCODING_PRIORITY.len());
    for encoding in ENCODING_PRIORITY {
        let Some(text) = encoding.decode(bytes) else {
            debug!(%encoding, "decode failed");
            failures.push((encoding, AttemptError::Undecodable));
            continue;
        };
        match parse_text(&text) {
            Ok(table) => return Ok((table, encoding)),
            Err(err) => {
                debug!(%encoding, ?err, "parse failed");
                failures.push((encoding, err));
            }
        }
    }
    Err(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b\n1|2\n"), b'|');
        assert_eq!(sniff_delimiter("single\nvalue\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn sniffer_ignores_delimiters_inside_quotes() {
        let text = "Nota;Texto;Status\n1;\"troca, ajuste, teste\";ABERTO\n2;\"x, y\";ENCERRADO\n";
        assert_eq!(sniff_delimiter(text), b';');
    }

    #[test]
    fn parses_semicolon_export() {
        let text = "Nota;Status sistema;Data encermto.\n100;ABERTO;\n101;ENCERRADO;2024-01-15\n";
        let table = parse_text(text).unwrap();
        assert_eq!(table.headers, vec!["Nota", "Status sistema", "Data encermto."]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], None);
        assert_eq!(table.rows[1][2].as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn delimiter_only_rows_are_kept_as_nulls() {
        let text = "Nota;Status;Data\n1;MEDL;2024-01-01\n;;\n\n2;MEDE;2024-01-02\n";
        let table = parse_text(text).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], vec![None, None, None]);
        assert_eq!(table.rows[2][0].as_deref(), Some("2"));
    }

    #[test]
    fn rejects_rows_wider_than_header() {
        let text = "a,b\n1,2\n1,2,3\n";
        assert!(matches!(parse_text(text), Err(AttemptError::Malformed(_))));
    }

    #[test]
    fn utf8_wins_for_utf8_input() {
        let bytes = "Responsável,Status\nJOAO,MEDL\n".as_bytes();
        let (table, encoding) = parse_bytes(bytes).unwrap();
        assert_eq!(encoding, TextEncoding::Utf8);
        assert_eq!(table.headers[0], "Responsável");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"Status,Nota\nMEDL,1\n");
        let (table, _) = parse_bytes(&bytes).unwrap();
        assert_eq!(table.headers[0], "Status");
    }

    #[test]
    fn latin1_wins_for_plain_accented_bytes() {
        // "Dta.criação" in latin-1
        let bytes = b"Dta.cria\xE7\xE3o;Status\n2024-01-02;MEDE\n";
        let (table, encoding) = parse_bytes(bytes).unwrap();
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(table.headers[0], "Dta.criação");
    }

    #[test]
    fn cp1252_is_reached_after_utf8_and_latin1() {
        // "Responsável;Texto\nJOAO;Revisão – bomba\n" in cp1252 (0x96 is an en dash)
        let bytes = b"Respons\xE1vel;Texto\nJOAO;Revis\xE3o \x96 bomba\n";
        assert!(TextEncoding::Utf8.decode(bytes).is_none());
        assert!(TextEncoding::Latin1.decode(bytes).is_none());

        let (table, encoding) = parse_bytes(bytes).unwrap();
        assert_eq!(encoding, TextEncoding::Cp1252);
        assert_eq!(table.headers, vec!["Responsável", "Texto"]);
        assert_eq!(table.rows[0][1].as_deref(), Some("Revisão – bomba"));
    }

    #[test]
    fn every_encoding_failing_reports_each_attempt() {
        let err = parse_bytes(b"a,b\n1,2,3\n").unwrap_err();
        let tried: Vec<TextEncoding> = err.iter().map(|(e, _)| *e).collect();
        assert_eq!(tried, ENCODING_PRIORITY.to_vec());
    }
}
