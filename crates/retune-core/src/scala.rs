//! Scala `.scl` scale and `.kbm` keyboard mapping parsers.
//!
//! Lines starting with `!` are comments. Only the first whitespace-separated token of
//! a value line is significant, so trailing annotations are ignored.

use std::fs;
use std::path::Path;

use crate::mapping::KeyboardMapping;
use crate::scale::{Degree, Scale};
use crate::{Error, Result};

/// Non-comment lines with 1-based line numbers.
fn value_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.starts_with('!'))
}

fn first_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

fn parse_field<T: std::str::FromStr>(line: usize, text: &str, what: &str) -> Result<T> {
    first_token(text).parse().map_err(|_| Error::Parse {
        line,
        message: format!("expected {}, found '{}'", what, text),
    })
}

/// Parses scale file contents.
///
/// First value line is the label (may be empty), the second the degree count, then
/// one degree per line.
pub fn parse_scl(text: &str) -> Result<Scale> {
    enum State {
        ReadLabel,
        ReadCount,
        ReadDegrees,
    }

    let mut state = State::ReadLabel;
    let mut label = String::new();
    let mut count = 0usize;
    let mut degrees: Vec<Degree> = Vec::new();
    let mut last_line = 0;

    for (line, text) in value_lines(text) {
        last_line = line;
        match state {
            State::ReadLabel => {
                label = text.to_string();
                state = State::ReadCount;
            }
            State::ReadCount => {
                if text.is_empty() {
                    continue;
                }
                count = parse_field(line, text, "degree count")?;
                if count == 0 {
                    return Err(Error::Parse {
                        line,
                        message: "degree count must be at least 1".to_string(),
                    });
                }
                degrees.reserve(count);
                state = State::ReadDegrees;
            }
            State::ReadDegrees => {
                if text.is_empty() {
                    continue;
                }
                let degree = first_token(text)
                    .parse::<Degree>()
                    .map_err(|message| Error::Parse { line, message })?;
                degrees.push(degree);
                if degrees.len() == count {
                    break;
                }
            }
        }
    }

    if !matches!(state, State::ReadDegrees) {
        return Err(Error::Parse {
            line: last_line,
            message: "scale ends before the degree count".to_string(),
        });
    }
    if degrees.len() != count {
        return Err(Error::Parse {
            line: last_line,
            message: format!("expected {} degrees, found {}", count, degrees.len()),
        });
    }

    Scale::from_degrees(label, &degrees)
}

/// Parses keyboard mapping file contents.
///
/// Seven header values (size, first, last, middle, reference key, reference frequency,
/// formal octave size) followed by `size` entries, each a scale offset or `x`.
/// A size of 0 is a linear mapping.
pub fn parse_kbm(text: &str) -> Result<KeyboardMapping> {
    let mut lines = value_lines(text).filter(|(_, text)| !text.is_empty());
    let mut last_line = 0;
    let mut next = |what: &str| -> Result<(usize, String)> {
        match lines.next() {
            Some((line, text)) => {
                last_line = line;
                Ok((line, text.to_string()))
            }
            None => Err(Error::Parse {
                line: last_line,
                message: format!("mapping ends before {}", what),
            }),
        }
    };

    let (line, text) = next("the map size")?;
    let size: usize = parse_field(line, &text, "map size")?;
    let (line, text) = next("the first key")?;
    let first_key: u8 = parse_field(line, &text, "first key")?;
    let (line, text) = next("the last key")?;
    let last_key: u8 = parse_field(line, &text, "last key")?;
    let (line, text) = next("the middle key")?;
    let middle_key: u8 = parse_field(line, &text, "middle key")?;
    let (line, text) = next("the reference key")?;
    let reference_key: u8 = parse_field(line, &text, "reference key")?;
    let (line, text) = next("the reference frequency")?;
    let reference_freq_hz: f64 = parse_field(line, &text, "reference frequency")?;
    let (line, text) = next("the formal octave size")?;
    let formal_octave_size: usize = parse_field(line, &text, "formal octave size")?;

    let mut offsets = Vec::with_capacity(size);
    for _ in 0..size {
        let (line, text) = next("all mapping entries are listed")?;
        let token = first_token(&text);
        if token.eq_ignore_ascii_case("x") {
            offsets.push(None);
        } else {
            offsets.push(Some(parse_field(line, token, "mapping entry or 'x'")?));
        }
    }

    // A linear mapping advances one scale step per key whatever the octave line says
    let (period_size, offsets, formal_octave_size) = if size == 0 {
        (1, vec![Some(0)], 1)
    } else {
        (size, offsets, formal_octave_size)
    };

    let mapping = KeyboardMapping {
        period_size,
        first_key,
        last_key,
        middle_key,
        reference_key,
        reference_freq_hz,
        formal_octave_size,
        offsets,
    };
    mapping.validate()?;
    Ok(mapping)
}

pub fn read_scl_file(path: impl AsRef<Path>) -> Result<Scale> {
    parse_scl(&fs::read_to_string(path)?)
}

pub fn read_kbm_file(path: impl AsRef<Path>) -> Result<KeyboardMapping> {
    parse_kbm(&fs::read_to_string(path)?)
}
