//! Grammar and shared scanning helpers for the statsd line protocol
//! (spec §4.2). Both [`crate::wire::StateMachineParser`] and
//! [`crate::wire::TableParser`] are built on top of these so that a change
//! to the grammar cannot silently diverge between the two.

use super::{canonicalize_tags, is_valid_name, is_valid_tag_component, Kind, Sample, Sign};

/// Why a line failed to parse. The wire grammar has exactly one failure
/// mode; registry-level rejections (§4.4) are a separate taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The line did not match the grammar in spec §4.2.
    Unparseable,
}

/// The per-line result the parser stage reports to the aggregator,
/// alongside the wall-time spent producing it (spec §4.2).
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// The line parsed into a structured sample.
    Parsed(Sample),
    /// The line was rejected before reaching the registry.
    Dropped(RejectReason),
}

/// A line-protocol parser. Two implementations exist (state machine and
/// table-driven); both MUST accept the same language (spec §4.2).
pub trait LineParser {
    /// Parses one line (no trailing newline) into a `Sample`.
    ///
    /// # Errors
    /// Returns [`RejectReason::Unparseable`] if `line` does not match the
    /// grammar.
    fn parse_line(&self, line: &str) -> Result<Sample, RejectReason>;
}

const REJECT: RejectReason = RejectReason::Unparseable;

/// Splits `name[,tagK=tagV,...]` into the name and an optional raw tag list.
pub(super) fn split_name_and_tags(left: &str) -> (&str, Option<&str>) {
    match left.find(',') {
        Some(idx) => (&left[..idx], Some(&left[idx + 1..])),
        None => (left, None),
    }
}

/// Splits `value|type[|#tagK:tagV,...]` into its three parts.
pub(super) fn split_value_type_hashtags(right: &str) -> Option<(&str, &str, Option<&str>)> {
    let pipe = right.find('|')?;
    let value = &right[..pipe];
    let rest = &right[pipe + 1..];
    match rest.find("|#") {
        Some(idx) => Some((value, &rest[..idx], Some(&rest[idx + 2..]))),
        None => Some((value, rest, None)),
    }
}

/// Parses a `key<sep>value{,key<sep>value}` list. Used for both the
/// `,k=v` tag list and the `|#k:v` tag list (with `sep` set to `=` or `:`
/// respectively).
pub(super) fn parse_tag_pairs(raw: &str, sep: char) -> Option<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for item in raw.split(',') {
        let eq = item.find(sep)?;
        let (k, v) = (&item[..eq], &item[eq + 1..]);
        if !is_valid_tag_component(k) || !is_valid_tag_component(v) {
            return None;
        }
        pairs.push((k.to_string(), v.to_string()));
    }
    Some(pairs)
}

/// Parses the numeric value token: optional sign, unsigned decimal with at
/// most one `.` and one exponent. Returns the magnitude (sign stripped) and
/// the recorded [`Sign`].
pub(super) fn parse_value_token(raw: &str) -> Option<(f64, Sign)> {
    let (sign, digits_part) = match raw.as_bytes().first() {
        Some(b'+') => (Sign::Plus, &raw[1..]),
        Some(b'-') => (Sign::Minus, &raw[1..]),
        Some(_) => (Sign::None, raw),
        None => return None,
    };

    if !is_unsigned_decimal(digits_part) {
        return None;
    }

    let magnitude: f64 = digits_part.parse().ok()?;
    if !magnitude.is_finite() {
        return None;
    }
    Some((magnitude, sign))
}

/// Validates the unsigned-decimal grammar: digits, optional `.digits`,
/// optional exponent. A `.` requires a digit immediately before it and at
/// least one digit immediately after it — `"1."` and `".5"` are both
/// rejected, mirroring the original parser's `number_found` reset on `.`.
fn is_unsigned_decimal(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    let mut saw_int_digit = false;

    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        saw_int_digit = true;
    }

    let mut saw_digit = saw_int_digit;

    if matches!(chars.peek(), Some('.')) {
        if !saw_int_digit {
            return false;
        }
        chars.next();
        let mut saw_frac_digit = false;
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_frac_digit = true;
        }
        if !saw_frac_digit {
            return false;
        }
        saw_digit = true;
    }

    if !saw_digit {
        return false;
    }

    if matches!(chars.peek(), Some('e' | 'E')) {
        chars.next();
        if matches!(chars.peek(), Some('+' | '-')) {
            chars.next();
        }
        let mut saw_exp_digit = false;
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_exp_digit = true;
        }
        if !saw_exp_digit {
            return false;
        }
    }

    chars.next().is_none()
}

/// Parses the type token: exactly one of `c`, `g`, `ms`.
pub(super) fn parse_type_token(raw: &str) -> Option<Kind> {
    match raw {
        "c" => Some(Kind::Counter),
        "g" => Some(Kind::Gauge),
        "ms" => Some(Kind::Duration),
        _ => None,
    }
}

/// Shared assembly step: given the already-split grammar parts, validates
/// and builds a [`Sample`]. Both parser implementations funnel into this
/// once they've located the delimiters, so the *semantic* validation rules
/// (name shape, tag shape, numeric shape, type token, canonical-tags cap)
/// live in exactly one place.
pub(super) fn assemble(line: &str) -> Result<Sample, RejectReason> {
    let colon = line.find(':').ok_or(REJECT)?;
    let (left, right) = (&line[..colon], &line[colon + 1..]);
    let (value_raw, type_raw, hashtags_raw) = split_value_type_hashtags(right).ok_or(REJECT)?;
    assemble_from_parts(left, value_raw, type_raw, hashtags_raw)
}

/// Like [`assemble`], but takes the four grammar segments already split out
/// by the caller's own delimiter search (spec §4.2). `left` is the
/// `name[,tagK=tagV,...]` segment; the others are the value, type and
/// optional hashtags segments with their surrounding delimiters stripped.
///
/// This is the single point where both [`super::StateMachineParser`] and
/// [`super::TableParser`] rejoin after segmenting the line by their own
/// means, so they cannot disagree on what makes a segment valid.
pub(super) fn assemble_from_parts(
    left: &str,
    value_raw: &str,
    type_raw: &str,
    hashtags_raw: Option<&str>,
) -> Result<Sample, RejectReason> {
    let (name, raw_tags) = split_name_and_tags(left);
    if !is_valid_name(name) {
        return Err(REJECT);
    }

    let mut pairs = match raw_tags {
        Some(raw) => parse_tag_pairs(raw, '=').ok_or(REJECT)?,
        None => Vec::new(),
    };

    let (value, sign) = parse_value_token(value_raw).ok_or(REJECT)?;
    let kind = parse_type_token(type_raw).ok_or(REJECT)?;

    if let Some(raw) = hashtags_raw {
        let extra = parse_tag_pairs(raw, ':').ok_or(REJECT)?;
        pairs.extend(extra);
    }

    let tags = canonicalize_tags(&pairs).map_err(|()| REJECT)?;

    Ok(Sample {
        name: name.to_string(),
        kind,
        value,
        sign,
        tags,
    })
}
