//! Fact store: turns the noisy output of the extraction step into fact records.
//!
//! Loading is a two-stage pipeline:
//!
//! 1. [`clean`] strips markdown fences and slices out the candidate JSON array,
//!    tolerating commentary a generative upstream step may add around it.
//! 2. [`parse`] strictly parses that candidate and checks required fields.
//!
//! Class and relation values are stored verbatim. The declared ontology
//! ([`ComponentClass`], [`Relation`]) is available for presentation, but a
//! fact is never rejected for using an undeclared class or relation.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::FactError;

/// Result type for fact loading.
pub type FactResult<T> = std::result::Result<T, FactError>;

/// Default location of the extracted fact file.
pub const DEFAULT_FACTS_PATH: &str = "kg/raw_facts.json";

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json|```").expect("fence pattern is valid"));

/// One extracted engineering fact: `subject --predicate--> object`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub subject: String,
    pub subject_class: String,
    pub predicate: String,
    pub object: String,
    pub object_class: String,
    /// Manual page the fact was read from, when the extractor reported one.
    pub source_page: Option<String>,
}

impl Fact {
    /// Build a fact without a source page.
    pub fn new(
        subject: impl Into<String>,
        subject_class: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        object_class: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            subject_class: subject_class.into(),
            predicate: predicate.into(),
            object: object.into(),
            object_class: object_class.into(),
            source_page: None,
        }
    }

    /// Attach the page the fact was extracted from.
    pub fn with_source_page(mut self, page: impl Into<String>) -> Self {
        self.source_page = Some(page.into());
        self
    }
}

/// Component classes declared by the extraction ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentClass {
    Compressor,
    Condenser,
    Evaporator,
    Valve,
    Pipe,
    Controller,
    Sensor,
}

impl ComponentClass {
    pub const ALL: [ComponentClass; 7] = [
        Self::Compressor,
        Self::Condenser,
        Self::Evaporator,
        Self::Valve,
        Self::Pipe,
        Self::Controller,
        Self::Sensor,
    ];

    /// Look up a declared class by its exact name. Returns `None` for anything
    /// outside the ontology.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compressor => "Compressor",
            Self::Condenser => "Condenser",
            Self::Evaporator => "Evaporator",
            Self::Valve => "Valve",
            Self::Pipe => "Pipe",
            Self::Controller => "Controller",
            Self::Sensor => "Sensor",
        }
    }
}

/// Relation kinds declared by the extraction ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Feeds,
    Regulates,
    ReturnsTo,
    ControlledBy,
    MeasuredBy,
    Triggers,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Self::Feeds,
        Self::Regulates,
        Self::ReturnsTo,
        Self::ControlledBy,
        Self::MeasuredBy,
        Self::Triggers,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feeds => "feeds",
            Self::Regulates => "regulates",
            Self::ReturnsTo => "returnsTo",
            Self::ControlledBy => "controlledBy",
            Self::MeasuredBy => "measuredBy",
            Self::Triggers => "triggers",
        }
    }
}

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text.trim(), "").trim().to_string()
}

/// Stage one: strip code fences and return the candidate JSON array text,
/// from the first `[` to the last `]` inclusive.
pub fn clean(raw: &str) -> FactResult<String> {
    let stripped = strip_fences(raw);
    let text = stripped.as_str();

    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if end > start => Ok(text[start..=end].to_string()),
        _ => Err(FactError::NoArray),
    }
}

/// Stage two: strictly parse a candidate array into facts.
pub fn parse(candidate: &str) -> FactResult<Vec<Fact>> {
    let records: Vec<Value> =
        serde_json::from_str(candidate).map_err(|e| FactError::InvalidJson {
            message: e.to_string(),
        })?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let map = record
                .as_object()
                .ok_or(FactError::NotAnObject { index })?;
            fact_from_record(index, map)
        })
        .collect()
}

/// Run both stages over raw extractor output.
pub fn load(raw: &str) -> FactResult<Vec<Fact>> {
    let candidate = clean(raw)?;
    let facts = parse(&candidate)?;
    tracing::debug!(facts = facts.len(), "parsed fact array");
    Ok(facts)
}

/// Read and load a fact file.
pub fn load_file(path: &Path) -> FactResult<Vec<Fact>> {
    let raw = std::fs::read_to_string(path).map_err(|e| FactError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let facts = load(&raw)?;
    tracing::info!(path = %path.display(), facts = facts.len(), "loaded facts");
    Ok(facts)
}

fn fact_from_record(index: usize, record: &Map<String, Value>) -> FactResult<Fact> {
    let required = |field: &'static str| -> FactResult<String> {
        match record.get(field) {
            None => Err(FactError::MissingField { index, field }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(FactError::InvalidField { index, field }),
        }
    };

    // The extractor is asked for "page number if mentioned", so numbers show up too.
    let source_page = match record.get("source_page") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(Fact {
        subject: required("subject")?,
        subject_class: required("subject_class")?,
        predicate: required("predicate")?,
        object: required("object")?,
        object_class: required("object_class")?,
        source_page,
    })
}
