//! Tokenizer and block parser for raw dataset text.
//!
//! The input is a sequence of blocks:
//!
//! ```text
//! Data set #1
//! Vehicle locations :117,290;120,176;
//! Target locations :176,8;90,158
//! Weights = 78,28
//! ```
//!
//! Lines are first classified into tokens (header, labelled field, stray
//! text) and then grouped into blocks at each header. Every block produces
//! its own `Result`, so one malformed dataset never hides the others.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use geo::Coord;
use thiserror::Error;

use crate::{DatasetId, Instance, InstanceError, Location, Precision, build_instance};

const HEADER_PREFIX: &str = "data set";

/// Vehicle locations, targets and weights of one dataset block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataset {
    /// Identifier taken from the block header.
    pub id: DatasetId,
    /// Depot of each vehicle, in input order.
    pub vehicle_locations: Vec<Location>,
    /// Locations that must be served.
    pub target_locations: Vec<Location>,
    /// Demand of each target, aligned with `target_locations`.
    pub weights: Vec<u64>,
}

impl RawDataset {
    /// Build the [`Instance`] described by this dataset.
    ///
    /// # Errors
    ///
    /// Propagates [`build_instance`] failures.
    pub fn build(&self, precision: Precision) -> Result<Instance, InstanceError> {
        build_instance(
            &self.vehicle_locations,
            &self.target_locations,
            &self.weights,
            precision,
        )
    }
}

/// The labelled lines that make up a block body, in their required order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `Vehicle locations : x,y;x,y;...`
    VehicleLocations,
    /// `Target locations : x,y;x,y;...`
    TargetLocations,
    /// `Weights = w,w,...`
    Weights,
}

impl Field {
    const fn label(self) -> &'static str {
        match self {
            Self::VehicleLocations => "Vehicle locations",
            Self::TargetLocations => "Target locations",
            Self::Weights => "Weights",
        }
    }

    fn matches(self, label: &str) -> bool {
        let normalised = label.split_whitespace().collect::<Vec<_>>().join(" ");
        normalised.eq_ignore_ascii_case(self.label())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A block that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}line {line}: {kind}", dataset_prefix(.dataset))]
pub struct ParseError {
    /// Dataset the block declared, when its header was readable.
    pub dataset: Option<DatasetId>,
    /// One-based line number of the offending line.
    pub line: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

fn dataset_prefix(dataset: &Option<DatasetId>) -> String {
    dataset.map_or_else(String::new, |id| format!("dataset {id}, "))
}

/// Reasons a block can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Text appeared before the first `Data set` header.
    #[error("expected a `Data set #<id>` header, found {text:?}")]
    MissingHeader {
        /// The stray line.
        text: String,
    },
    /// The header did not carry a numeric identifier.
    #[error("invalid dataset header {text:?}")]
    InvalidHeader {
        /// The header line.
        text: String,
    },
    /// The block ended before a required field.
    #[error("missing `{field}` line")]
    MissingField {
        /// The field that was expected next.
        field: Field,
    },
    /// A different line appeared where a field was required.
    #[error("expected `{expected}`, found {found:?}")]
    UnexpectedLine {
        /// The field that was expected.
        expected: Field,
        /// The line found instead.
        found: String,
    },
    /// A coordinate pair was not two comma-separated integers.
    #[error("invalid coordinate {token:?} in `{field}`")]
    InvalidCoordinate {
        /// Field containing the token.
        field: Field,
        /// The offending token.
        token: String,
    },
    /// A weight was not a non-negative integer.
    #[error("invalid weight {token:?}")]
    InvalidWeight {
        /// The offending token.
        token: String,
    },
    /// Targets and weights do not pair up.
    #[error("{targets} target locations but {weights} weights")]
    CountMismatch {
        /// Number of target coordinates.
        targets: usize,
        /// Number of weights.
        weights: usize,
    },
    /// Extra text followed the `Weights` line.
    #[error("unexpected trailing line {text:?}")]
    TrailingLine {
        /// The extra line.
        text: String,
    },
    /// An earlier block already used this identifier.
    #[error("dataset identifier already used")]
    DuplicateDataset,
}

/// Outcome of parsing a raw text: one tagged result per block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecords {
    blocks: Vec<Result<RawDataset, ParseError>>,
}

impl ParsedRecords {
    /// Per-block results in input order.
    #[must_use]
    pub fn blocks(&self) -> &[Result<RawDataset, ParseError>] {
        &self.blocks
    }

    /// Successfully parsed datasets in input order.
    pub fn records(&self) -> impl Iterator<Item = &RawDataset> {
        self.blocks.iter().filter_map(|block| block.as_ref().ok())
    }

    /// Rejected blocks in input order.
    pub fn failures(&self) -> impl Iterator<Item = &ParseError> {
        self.blocks.iter().filter_map(|block| block.as_ref().err())
    }

    /// Number of blocks seen, successful or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the text contained no blocks at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Successful datasets keyed by identifier.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<DatasetId, RawDataset> {
        self.blocks
            .into_iter()
            .filter_map(Result::ok)
            .map(|dataset| (dataset.id, dataset))
            .collect()
    }
}

impl IntoIterator for ParsedRecords {
    type Item = Result<RawDataset, ParseError>;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

/// Parse raw dataset text into per-block results.
///
/// # Examples
/// ```
/// use cvrp_core::{DatasetId, parse_records};
///
/// let raw = "Data set #7\n\
///            Vehicle locations :0,0;\n\
///            Target locations :3,4;6,8\n\
///            Weights = 2,5\n";
/// let records = parse_records(raw).into_map();
/// let dataset = &records[&DatasetId(7)];
/// assert_eq!(dataset.weights, vec![2, 5]);
/// assert_eq!(dataset.vehicle_locations.len(), 1);
/// ```
#[must_use]
pub fn parse_records(raw_text: &str) -> ParsedRecords {
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    let mut lines = tokenize(raw_text).peekable();

    while let Some(line) = lines.next() {
        let Token::Header(id_text) = line.token else {
            blocks.push(Err(ParseError {
                dataset: None,
                line: line.number,
                kind: ParseErrorKind::MissingHeader {
                    text: line.text.to_owned(),
                },
            }));
            // Skip to the next header so the preamble reports once.
            while lines.next_if(|next| !next.is_header()).is_some() {}
            continue;
        };

        let mut body = Vec::new();
        while let Some(next) = lines.next_if(|next| !next.is_header()) {
            body.push(next);
        }

        let result = parse_block(&line, id_text, &body).and_then(|dataset| {
            if seen.insert(dataset.id) {
                Ok(dataset)
            } else {
                Err(ParseError {
                    dataset: Some(dataset.id),
                    line: line.number,
                    kind: ParseErrorKind::DuplicateDataset,
                })
            }
        });
        blocks.push(result);
    }

    ParsedRecords { blocks }
}

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    /// Everything after `Data set`, e.g. ` #12`.
    Header(&'a str),
    Field { label: &'a str, value: &'a str },
    Text,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    text: &'a str,
    token: Token<'a>,
}

impl Line<'_> {
    const fn is_header(&self) -> bool {
        matches!(self.token, Token::Header(_))
    }
}

fn tokenize(raw_text: &str) -> impl Iterator<Item = Line<'_>> {
    raw_text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, text)| !text.is_empty())
        .map(|(number, text)| Line {
            number,
            text,
            token: classify(text),
        })
}

fn classify(text: &str) -> Token<'_> {
    let is_header = text
        .get(..HEADER_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(HEADER_PREFIX));
    if is_header {
        return Token::Header(text.get(HEADER_PREFIX.len()..).unwrap_or_default());
    }
    match text.split_once([':', '=']) {
        Some((label, value)) => Token::Field {
            label: label.trim(),
            value: value.trim(),
        },
        None => Token::Text,
    }
}

struct BlockCursor<'a, 'b> {
    dataset: DatasetId,
    last_line: usize,
    lines: std::slice::Iter<'b, Line<'a>>,
}

impl<'a> BlockCursor<'a, '_> {
    fn error(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            dataset: Some(self.dataset),
            line,
            kind,
        }
    }

    fn expect(&mut self, field: Field) -> Result<(usize, &'a str), ParseError> {
        let Some(line) = self.lines.next() else {
            return Err(self.error(self.last_line, ParseErrorKind::MissingField { field }));
        };
        self.last_line = line.number;
        match line.token {
            Token::Field { label, value } if field.matches(label) => Ok((line.number, value)),
            _ => Err(self.error(
                line.number,
                ParseErrorKind::UnexpectedLine {
                    expected: field,
                    found: line.text.to_owned(),
                },
            )),
        }
    }

    fn locations(&mut self, field: Field) -> Result<Vec<Location>, ParseError> {
        let (line, value) = self.expect(field)?;
        items(value, ';')
            .map(|token| {
                parse_coordinate(token).ok_or_else(|| {
                    self.error(
                        line,
                        ParseErrorKind::InvalidCoordinate {
                            field,
                            token: token.to_owned(),
                        },
                    )
                })
            })
            .collect()
    }

    fn weights(&mut self) -> Result<(usize, Vec<u64>), ParseError> {
        let (line, value) = self.expect(Field::Weights)?;
        let weights = items(value, ',')
            .map(|token| {
                token.parse::<u64>().map_err(|_| {
                    self.error(
                        line,
                        ParseErrorKind::InvalidWeight {
                            token: token.to_owned(),
                        },
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((line, weights))
    }
}

fn parse_block(header: &Line<'_>, id_text: &str, body: &[Line<'_>]) -> Result<RawDataset, ParseError> {
    let id = id_text
        .trim()
        .strip_prefix('#')
        .and_then(|digits| digits.trim().parse::<u32>().ok())
        .map(DatasetId)
        .ok_or_else(|| ParseError {
            dataset: None,
            line: header.number,
            kind: ParseErrorKind::InvalidHeader {
                text: header.text.to_owned(),
            },
        })?;

    let mut cursor = BlockCursor {
        dataset: id,
        last_line: header.number,
        lines: body.iter(),
    };
    let vehicle_locations = cursor.locations(Field::VehicleLocations)?;
    let target_locations = cursor.locations(Field::TargetLocations)?;
    let (weights_line, weights) = cursor.weights()?;

    if let Some(extra) = cursor.lines.next() {
        return Err(cursor.error(
            extra.number,
            ParseErrorKind::TrailingLine {
                text: extra.text.to_owned(),
            },
        ));
    }
    if target_locations.len() != weights.len() {
        return Err(cursor.error(
            weights_line,
            ParseErrorKind::CountMismatch {
                targets: target_locations.len(),
                weights: weights.len(),
            },
        ));
    }

    Ok(RawDataset {
        id,
        vehicle_locations,
        target_locations,
        weights,
    })
}

fn items(value: &str, separator: char) -> impl Iterator<Item = &str> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn parse_coordinate(token: &str) -> Option<Location> {
    let (x, y) = token.split_once(',')?;
    Some(Coord {
        x: x.trim().parse().ok()?,
        y: y.trim().parse().ok()?,
    })
}
