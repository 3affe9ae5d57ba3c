use std::{collections::HashMap, fs::File, io::Read, path::{Path, PathBuf}};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, info};

use crate::talk::{decode_items, parse_count, parse_date, Talk};

/// Columns every corpus file must carry, in the order the scraper writes them.
pub const REQUIRED_COLUMNS: [&str; 19] = [
    "talk_id",
    "title",
    "speaker_1",
    "all_speakers",
    "occupations",
    "about_speakers",
    "views",
    "recorded_date",
    "published_date",
    "event",
    "native_lang",
    "available_lang",
    "comments",
    "duration",
    "topics",
    "related_talks",
    "url",
    "description",
    "transcript",
];

/// Fatal corpus-load failures. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus file could not be opened.
    #[error("opening corpus {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The header row could not be decoded.
    #[error("reading corpus header: {0}")]
    Header(#[source] csv::Error),
    /// A required column is absent from the header.
    #[error("corpus is missing required column `{0}`")]
    MissingColumn(&'static str),
    /// A record could not be decoded (bad quoting, wrong field count).
    #[error("corpus record {record}: {source}")]
    Record {
        /// One-based data record number.
        record: u64,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// A required numeric cell holds something other than a non-negative integer.
    #[error("corpus record {record}: column `{column}` has invalid value {value:?}")]
    InvalidValue {
        /// One-based data record number.
        record: u64,
        /// Offending column.
        column: &'static str,
        /// Raw cell content.
        value: String,
    },
}

/// Loads a corpus CSV file from disk.
///
/// # Errors
///
/// Fails when the file cannot be read, a required column is missing, or a record is malformed.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Talk>, CorpusError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let talks = read_corpus(file)?;
    info!(path = %path.display(), talks = talks.len(), "corpus loaded");
    Ok(talks)
}

/// Reads a corpus from any CSV source with a header row.
///
/// # Errors
///
/// Fails on a missing required column or a malformed record.
pub fn read_corpus<R: Read>(reader: R) -> Result<Vec<Talk>, CorpusError> {
    let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv.headers().map_err(CorpusError::Header)?.clone();
    let columns = ColumnIndex::resolve(&headers)?;
    debug!(columns = headers.len(), "corpus header resolved");

    let mut talks = Vec::new();
    for (idx, record) in csv.records().enumerate() {
        let number = idx as u64 + 1;
        let record = record.map_err(|source| CorpusError::Record {
            record: number,
            source,
        })?;
        talks.push(columns.talk(&record, number)?);
    }
    Ok(talks)
}

struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, CorpusError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|name| name.trim_start_matches('\u{feff}').trim())
            .collect();
        let mut positions = HashMap::with_capacity(REQUIRED_COLUMNS.len());
        for column in REQUIRED_COLUMNS {
            let position = names
                .iter()
                .position(|name| *name == column)
                .ok_or(CorpusError::MissingColumn(column))?;
            positions.insert(column, position);
        }
        Ok(Self { positions })
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &'static str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&position| record.get(position))
            .unwrap_or("")
    }

    fn required_count(
        &self,
        record: &StringRecord,
        column: &'static str,
        number: u64,
    ) -> Result<u64, CorpusError> {
        let raw = self.cell(record, column);
        parse_count(raw).ok_or_else(|| CorpusError::InvalidValue {
            record: number,
            column,
            value: raw.to_string(),
        })
    }

    fn talk(&self, record: &StringRecord, number: u64) -> Result<Talk, CorpusError> {
        let text = |column| self.cell(record, column).trim().to_string();
        Ok(Talk {
            talk_id: self.required_count(record, "talk_id", number)?,
            title: text("title"),
            speaker: text("speaker_1"),
            all_speakers: decode_items(self.cell(record, "all_speakers")),
            occupations: decode_items(self.cell(record, "occupations")),
            about_speakers: text("about_speakers"),
            views: self.required_count(record, "views", number)?,
            recorded_date: parse_date(self.cell(record, "recorded_date")),
            published_date: parse_date(self.cell(record, "published_date")),
            event: text("event"),
            native_lang: text("native_lang"),
            available_languages: decode_items(self.cell(record, "available_lang")).len(),
            comments: parse_count(self.cell(record, "comments")),
            duration_secs: parse_count(self.cell(record, "duration")),
            topics: decode_items(self.cell(record, "topics")),
            related_talks: text("related_talks"),
            url: text("url"),
            description: text("description"),
            transcript: self.cell(record, "transcript").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "talk_id,title,speaker_1,all_speakers,occupations,about_speakers,views,recorded_date,published_date,event,native_lang,available_lang,comments,duration,topics,related_talks,url,description,transcript";

    fn row(id: &str, views: &str, published: &str, transcript: &str) -> String {
        format!(
            "{id},Averting the climate crisis,Al Gore,{{0: 'Al Gore'}},\"{{0: ['climate advocate']}}\",Bio,{views},2006-02-25,{published},TED2006,en,\"['ar', 'bg', 'de']\",272,977,\"['climate change', 'global issues']\",\"{{}}\",https://ted.com/talks/1,Desc,\"{transcript}\""
        )
    }

    #[test]
    fn reads_full_row() {
        let csv = format!(
            "{HEADER}\n{}\n",
            row("1", "3523392", "2006-06-27", "Thank you so much, Chris.\nSecond line (Laughter)")
        );
        let talks = read_corpus(csv.as_bytes()).unwrap();
        assert_eq!(talks.len(), 1);
        let talk = &talks[0];
        assert_eq!(talk.talk_id, 1);
        assert_eq!(talk.views, 3_523_392);
        assert_eq!(talk.speaker, "Al Gore");
        assert_eq!(talk.all_speakers, vec!["Al Gore"]);
        assert_eq!(talk.occupations, vec!["climate advocate"]);
        assert_eq!(talk.available_languages, 3);
        assert_eq!(talk.comments, Some(272));
        assert_eq!(talk.duration_secs, Some(977));
        assert_eq!(talk.topics.len(), 2);
        assert_eq!(talk.publication_year(), Some(2006));
        assert!(talk.transcript.starts_with("Thank you so much, Chris.\n"));
    }

    #[test]
    fn missing_column_is_fatal_and_named() {
        let header = HEADER.replace(",transcript", "");
        let err = read_corpus(format!("{header}\n").as_bytes()).unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumn("transcript")));
        assert!(err.to_string().contains("transcript"));
    }

    #[test]
    fn invalid_views_report_record_and_value() {
        let csv = format!(
            "{HEADER}\n{}\n{}\n",
            row("1", "10", "2006-06-27", "a"),
            row("2", "lots", "2006-06-27", "b")
        );
        let err = read_corpus(csv.as_bytes()).unwrap_err();
        match err {
            CorpusError::InvalidValue { record, column, value } => {
                assert_eq!(record, 2);
                assert_eq!(column, "views");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unparseable_dates_and_blank_counts_degrade() {
        let csv = format!("{HEADER}\n{}\n", row("7", "10", "someday", "a"))
            .replace(",272,977,", ",,,");
        let talks = read_corpus(csv.as_bytes()).unwrap();
        assert_eq!(talks[0].published_date, None);
        assert_eq!(talks[0].comments, None);
        assert_eq!(talks[0].duration_secs, None);
    }

    #[test]
    fn load_corpus_reports_missing_file() {
        let err = load_corpus("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }

    #[test]
    fn load_corpus_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "{}", row("3", "99", "2010-01-01", "Hello.")).unwrap();
        let talks = load_corpus(file.path()).unwrap();
        assert_eq!(talks[0].talk_id, 3);
    }
}
