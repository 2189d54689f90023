//! Hand-written character-by-character recognizer for the line grammar
//! (spec §4.2), mirroring the control flow of the original
//! `parser-basic.c` (see
//! `original_source/src/pmdas/statsd/src/parser-basic.c`): an explicit
//! state enum advanced one character at a time, rather than a generated
//! table (see [`super::table::TableParser`]).

use super::parser::{assemble_from_parts, LineParser, RejectReason};
use super::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NameTags,
    Value,
    Type,
    HashTags,
}

/// Hand-written state-machine line parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct StateMachineParser;

impl StateMachineParser {
    /// Creates a new state-machine parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

const REJECT: RejectReason = RejectReason::Unparseable;

impl LineParser for StateMachineParser {
    fn parse_line(&self, line: &str) -> Result<Sample, RejectReason> {
        let mut state = State::NameTags;
        let mut name_tags_end = None;
        let mut value_end = None;
        let mut type_end = None;
        let mut hashtags_start = None;

        let mut iter = line.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            match state {
                State::NameTags => match c {
                    ':' => {
                        name_tags_end = Some(i);
                        state = State::Value;
                    }
                    '|' => return Err(REJECT),
                    _ => {}
                },
                State::Value => match c {
                    ':' => return Err(REJECT),
                    '|' => {
                        value_end = Some(i);
                        state = State::Type;
                    }
                    _ => {}
                },
                State::Type => match c {
                    ':' => return Err(REJECT),
                    '|' => {
                        // Lookahead: "|#" enters the hashtags section;
                        // any other following character is malformed.
                        match iter.peek() {
                            Some(&(_, '#')) => {
                                type_end = Some(i);
                                iter.next();
                                hashtags_start = Some(i + 2);
                                state = State::HashTags;
                            }
                            _ => return Err(REJECT),
                        }
                    }
                    _ => {}
                },
                State::HashTags => {}
            }
        }

        let name_tags_end = name_tags_end.ok_or(REJECT)?;
        let value_end = value_end.ok_or(REJECT)?;

        let (left, right) = (&line[..name_tags_end], &line[name_tags_end + 1..]);
        let value_start_in_right = 0;
        let pipe_in_right = value_end - (name_tags_end + 1);
        let value_raw = &right[value_start_in_right..pipe_in_right];

        let type_raw = match type_end {
            Some(te) => &right[pipe_in_right + 1..te - (name_tags_end + 1)],
            None => {
                if state != State::Type {
                    // Entered HashTags without recording type_end only
                    // happens if input ended mid-scan; guarded above.
                    return Err(REJECT);
                }
                &right[pipe_in_right + 1..]
            }
        };

        let hashtags_raw = hashtags_start.map(|hs| &line[hs..]);

        assemble_from_parts(left, value_raw, type_raw, hashtags_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Kind, Sign};

    fn p(line: &str) -> Result<Sample, RejectReason> {
        StateMachineParser::new().parse_line(line)
    }

    #[test]
    fn s1_simple_counter() {
        let s = p("example:1|c").unwrap();
        assert_eq!(s.name, "example");
        assert_eq!(s.kind, Kind::Counter);
        assert_eq!(s.value, 1.0);
        assert_eq!(s.sign, Sign::None);
        assert!(s.tags.is_none());
    }

    #[test]
    fn with_tags_and_hashtags() {
        let s = p("foo,tagY=20,tagX=10:10|c|#extra:1").unwrap();
        assert_eq!(s.name, "foo");
        assert_eq!(
            s.tags.unwrap().as_ref(),
            r#"{"extra":"1","tagX":"10","tagY":"20"}"#
        );
    }

    #[test]
    fn gauge_signed() {
        let s = p("example:+1|g").unwrap();
        assert_eq!(s.sign, Sign::Plus);
        let s = p("example:-2|g").unwrap();
        assert_eq!(s.sign, Sign::Minus);
    }

    #[test]
    fn duration() {
        let s = p("bar:100|ms").unwrap();
        assert_eq!(s.kind, Kind::Duration);
        assert_eq!(s.value, 100.0);
    }

    #[test]
    fn rejects_bad_type() {
        assert!(p("foo:1|x").is_err());
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(p("foo1|c").is_err());
    }

    #[test]
    fn rejects_missing_pipe() {
        assert!(p("foo:1").is_err());
    }

    #[test]
    fn rejects_bad_name() {
        assert!(p("1foo:1|c").is_err());
    }

    #[test]
    fn rejects_double_pipe_without_hash() {
        assert!(p("foo:1|c|x").is_err());
    }
}
