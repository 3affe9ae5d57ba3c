use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static QUOTED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)""#).unwrap());

/// One row of the talk corpus. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talk {
    /// Corpus identifier.
    pub talk_id: u64,
    /// Talk title.
    pub title: String,
    /// Primary speaker.
    pub speaker: String,
    /// Every credited speaker.
    pub all_speakers: Vec<String>,
    /// Raw occupation strings for the speakers.
    pub occupations: Vec<String>,
    /// Speaker biography text.
    pub about_speakers: String,
    /// View count.
    pub views: u64,
    /// Date the talk was recorded, if parseable.
    pub recorded_date: Option<NaiveDate>,
    /// Date the talk was published, if parseable.
    pub published_date: Option<NaiveDate>,
    /// Event name (`TED2006`, `TEDxBoston`, ...).
    pub event: String,
    /// Native language code.
    pub native_lang: String,
    /// Number of languages the talk is available in.
    pub available_languages: usize,
    /// Comment count, when present.
    pub comments: Option<u64>,
    /// Duration in seconds, when present.
    pub duration_secs: Option<u64>,
    /// Topic tags.
    pub topics: Vec<String>,
    /// Related talk references, kept verbatim.
    pub related_talks: String,
    /// Canonical URL.
    pub url: String,
    /// Short description.
    pub description: String,
    /// Full transcript text, possibly with annotation markers.
    pub transcript: String,
}

impl Talk {
    /// Creates a talk with only the fields the analysis needs; everything else is blank.
    #[must_use]
    pub fn new(talk_id: u64, title: impl Into<String>, views: u64, transcript: impl Into<String>) -> Self {
        Self {
            talk_id,
            title: title.into(),
            speaker: String::new(),
            all_speakers: Vec::new(),
            occupations: Vec::new(),
            about_speakers: String::new(),
            views,
            recorded_date: None,
            published_date: None,
            event: String::new(),
            native_lang: String::new(),
            available_languages: 0,
            comments: None,
            duration_secs: None,
            topics: Vec::new(),
            related_talks: String::new(),
            url: String::new(),
            description: String::new(),
            transcript: transcript.into(),
        }
    }

    /// Sets the primary speaker.
    #[must_use]
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = speaker.into();
        self
    }

    /// Sets the raw occupation strings.
    #[must_use]
    pub fn with_occupations(mut self, occupations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.occupations = occupations.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the publication date.
    #[must_use]
    pub fn with_published(mut self, date: Option<NaiveDate>) -> Self {
        self.published_date = date;
        self
    }

    /// Sets the event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Publication year, if the date parsed.
    #[must_use]
    pub fn publication_year(&self) -> Option<i32> {
        self.published_date.map(|date| date.year())
    }
}

/// Decodes a Python-literal list or dict cell into its quoted items.
///
/// `{0: ['climate advocate']}` yields `["climate advocate"]`. A cell without
/// quotes degrades to one item holding the trimmed text; blank cells and
/// `nan` yield nothing.
#[must_use]
pub fn decode_items(cell: &str) -> Vec<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Vec::new();
    }
    let items: Vec<String> = QUOTED_ITEM
        .captures_iter(trimmed)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().replace("\\'", "'").replace("\\\"", "\"").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if !items.is_empty() {
        return items;
    }
    let bare = trimmed.trim_matches(|c| matches!(c, '[' | ']' | '{' | '}')).trim();
    if bare.is_empty() {
        Vec::new()
    } else {
        vec![bare.to_string()]
    }
}

/// Parses `YYYY-MM-DD`, ignoring any trailing time component.
#[must_use]
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    let head = trimmed.get(..10)?;
    if trimmed.len() > 10 && !trimmed[10..].starts_with([' ', 'T']) {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parses a non-negative count, tolerating a `.0` float rendering.
#[must_use]
pub fn parse_count(cell: &str) -> Option<u64> {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(value);
    }
    let float = trimmed.parse::<f64>().ok()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
        Some(float as u64)
    } else {
        None
    }
}
