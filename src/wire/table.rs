//! Table-driven recognizer for the line grammar (spec §4.2): a
//! precomputed state-transition table over a small alphabet of character
//! classes drives segmentation, the way a generated scanner would (see
//! `original_source/src/pmdas/statsd/src/parser-ragel.h` for the
//! generated-automaton sibling this mirrors). Segmentation is the only
//! thing that differs from [`super::state_machine::StateMachineParser`];
//! both funnel into [`super::parser::assemble_from_parts`] for semantic
//! validation.

use super::parser::{assemble_from_parts, LineParser, RejectReason};
use super::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
enum Class {
    Colon = 0,
    Pipe = 1,
    Hash = 2,
    Other = 3,
}

const NUM_CLASSES: usize = 4;

fn classify(c: char) -> Class {
    match c {
        ':' => Class::Colon,
        '|' => Class::Pipe,
        '#' => Class::Hash,
        _ => Class::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
enum State {
    NameTags = 0,
    Value = 1,
    Type = 2,
    HashTags = 3,
    Reject = 4,
}

const NUM_STATES: usize = 5;

/// `TRANSITIONS[state][class]` gives the next state. Entries that require
/// one character of lookahead (the `|` that may start `|#`) are handled in
/// [`TableParser::parse_line`] rather than in the table itself, since a
/// plain state/class table has no lookahead.
const TRANSITIONS: [[State; NUM_CLASSES]; NUM_STATES] = [
    // NameTags
    [
        State::Value,    // Colon
        State::Reject,   // Pipe
        State::NameTags, // Hash (invalid in a name/tag, caught by assemble_from_parts)
        State::NameTags, // Other
    ],
    // Value
    [
        State::Reject, // Colon
        State::Type,   // Pipe
        State::Reject, // Hash
        State::Value,  // Other
    ],
    // Type (Pipe case is special-cased with lookahead by the driver)
    [
        State::Reject, // Colon
        State::Type,   // Pipe (placeholder; driver overrides)
        State::Type,   // Hash
        State::Type,   // Other
    ],
    // HashTags: consume everything to end of line.
    [
        State::HashTags,
        State::HashTags,
        State::HashTags,
        State::HashTags,
    ],
    // Reject: sink.
    [
        State::Reject,
        State::Reject,
        State::Reject,
        State::Reject,
    ],
];

/// Table-driven line parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableParser;

impl TableParser {
    /// Creates a new table-driven parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

const REJECT: RejectReason = RejectReason::Unparseable;

impl LineParser for TableParser {
    fn parse_line(&self, line: &str) -> Result<Sample, RejectReason> {
        let mut state = State::NameTags;
        let mut name_tags_end = None;
        let mut value_end = None;
        let mut type_end = None;
        let mut hashtags_start = None;

        let mut iter = line.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            let class = classify(c);

            if state == State::Type && class == Class::Pipe {
                match iter.peek() {
                    Some(&(_, '#')) => {
                        type_end = Some(i);
                        iter.next();
                        hashtags_start = Some(i + 2);
                        state = State::HashTags;
                        continue;
                    }
                    _ => return Err(REJECT),
                }
            }

            let next = TRANSITIONS[state as usize][class as usize];
            if next == State::Reject {
                return Err(REJECT);
            }
            if state == State::NameTags && next == State::Value {
                name_tags_end = Some(i);
            }
            if state == State::Value && next == State::Type {
                value_end = Some(i);
            }
            state = next;
        }

        if state != State::Type && state != State::HashTags {
            return Err(REJECT);
        }

        let name_tags_end = name_tags_end.ok_or(REJECT)?;
        let value_end = value_end.ok_or(REJECT)?;

        let right = &line[name_tags_end + 1..];
        let left = &line[..name_tags_end];
        let pipe_in_right = value_end - (name_tags_end + 1);
        let value_raw = &right[..pipe_in_right];

        let type_raw = match type_end {
            Some(te) => &right[pipe_in_right + 1..te - (name_tags_end + 1)],
            None => &right[pipe_in_right + 1..],
        };

        let hashtags_raw = hashtags_start.map(|hs| &line[hs..]);

        assemble_from_parts(left, value_raw, type_raw, hashtags_raw)
    }
}
