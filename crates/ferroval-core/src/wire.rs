//! The textual wire format for valuation series.
//!
//! The writer emits exactly one shape, so files written today diff cleanly
//! against files written years ago:
//!
//! ```text
//! <Values>
//!   <DV D="2024-01-01T00:00:00" V="12.5" />
//! </Values>
//! ```
//!
//! The reader accepts more: the verbose `<DailyValuation><Day>...` shape
//! earlier versions wrote, a leading `<?xml ?>` prolog, a single field
//! wrapper element around the collection, and self-closed empties, mixed
//! freely in one document. A damaged field inside an intact element decodes
//! to its default ([`EPOCH_DAY`] or zero) instead of failing the document;
//! damaged framing raises [`WireError`].

use std::io::{Read, Write};

use time::format_description::BorrowedFormatItem;
use time::macros::{date, format_description};
use time::{Date, PrimitiveDateTime, Time};

use crate::domain::{SeriesValue, Valuation};
use crate::error::{SeriesError, WireError};

/// The day unreadable date text falls back to: January 1 of year 1, the
/// calendar epoch older files carry for never-set dates.
pub const EPOCH_DAY: Date = date!(0001 - 01 - 01);

const DAY_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DAY_ONLY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Formats a calendar day as the midnight timestamp the wire format pins.
pub fn format_day(day: Date) -> String {
    PrimitiveDateTime::new(day, Time::MIDNIGHT)
        .format(DAY_TIME_FORMAT)
        .expect("calendar day must be wire formattable")
}

/// Reads wire date text, falling back to [`EPOCH_DAY`] when unreadable.
/// A timestamp with a non-midnight time truncates to its day.
pub fn day_or_default(text: &str) -> Date {
    parse_day(text).unwrap_or(EPOCH_DAY)
}

/// Reads wire value text, falling back to the scalar's zero when unreadable.
pub fn value_or_default<V: SeriesValue>(text: &str) -> V {
    V::parse_wire(text).unwrap_or_else(V::zero)
}

fn parse_day(text: &str) -> Option<Date> {
    let trimmed = text.trim();
    if let Ok(stamp) = PrimitiveDateTime::parse(trimmed, DAY_TIME_FORMAT) {
        return Some(stamp.date());
    }
    Date::parse(trimmed, DAY_ONLY_FORMAT).ok()
}

/// Encodes one record in the compact attribute shape.
pub fn encode_valuation<V: SeriesValue>(record: &Valuation<V>) -> String {
    format!(
        r#"<DV D="{}" V="{}" />"#,
        format_day(record.day),
        record.value.format_wire()
    )
}

/// Encodes a snapshot as a `Values` collection. The layout is pinned:
/// two-space indent, one record per line, self-closing when empty.
pub fn encode_series<V: SeriesValue>(snapshot: &[Valuation<V>]) -> String {
    if snapshot.is_empty() {
        return String::from("<Values />");
    }

    let mut output = String::from("<Values>\n");
    for record in snapshot {
        output.push_str("  ");
        output.push_str(&encode_valuation(record));
        output.push('\n');
    }
    output.push_str("</Values>");
    output
}

/// Decodes a single record element, compact or verbose.
pub fn decode_valuation<V: SeriesValue>(input: &str) -> Result<Valuation<V>, WireError> {
    let mut scanner = Scanner::new(input);
    scanner.skip_prolog();
    let tag = scanner.read_open_tag()?;
    decode_record(&mut scanner, &tag)
}

/// Decodes a `Values` collection, with or without a prolog and a single
/// field wrapper element around it. Content after the top element is
/// ignored, as a stream-positioned reader would leave it.
pub fn decode_series<V: SeriesValue>(input: &str) -> Result<Vec<Valuation<V>>, WireError> {
    let mut scanner = Scanner::new(input);
    scanner.skip_prolog();

    let top = scanner.read_open_tag()?;
    if top.name == "Values" {
        return decode_collection(&mut scanner, &top);
    }

    // Any other top element is the field wrapper an enclosing document
    // writes; the collection sits one level down, absent when empty.
    if top.self_closing {
        return Ok(Vec::new());
    }
    if scanner.at_close_tag() {
        scanner.read_close_tag(top.name)?;
        return Ok(Vec::new());
    }

    let inner = scanner.read_open_tag()?;
    if inner.name != "Values" {
        return Err(WireError::UnknownElement {
            name: inner.name.to_owned(),
            offset: inner.offset,
        });
    }
    let records = decode_collection(&mut scanner, &inner)?;
    scanner.read_close_tag(top.name)?;
    Ok(records)
}

/// Writes the collection shape to `writer`.
pub fn write_series<V: SeriesValue, W: Write>(
    mut writer: W,
    snapshot: &[Valuation<V>],
) -> Result<(), SeriesError> {
    writer.write_all(encode_series(snapshot).as_bytes())?;
    Ok(())
}

/// Reads a collection from `reader`, accepting every shape
/// [`decode_series`] accepts.
pub fn read_series<V: SeriesValue, R: Read>(
    mut reader: R,
) -> Result<Vec<Valuation<V>>, SeriesError> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;
    Ok(decode_series(&buffer)?)
}

fn decode_collection<V: SeriesValue>(
    scanner: &mut Scanner<'_>,
    tag: &OpenTag<'_>,
) -> Result<Vec<Valuation<V>>, WireError> {
    let mut records = Vec::new();
    if tag.self_closing {
        return Ok(records);
    }

    loop {
        if scanner.at_close_tag() {
            scanner.read_close_tag("Values")?;
            return Ok(records);
        }
        let child = scanner.read_open_tag()?;
        records.push(decode_record(scanner, &child)?);
    }
}

fn decode_record<V: SeriesValue>(
    scanner: &mut Scanner<'_>,
    tag: &OpenTag<'_>,
) -> Result<Valuation<V>, WireError> {
    match tag.name {
        "DV" => {
            let day = tag.attribute("D").map_or(EPOCH_DAY, day_or_default);
            let value = tag.attribute("V").map_or_else(V::zero, value_or_default);
            if !tag.self_closing {
                scanner.read_close_tag("DV")?;
            }
            Ok(Valuation::new(day, value))
        }
        "DailyValuation" => decode_legacy_record(scanner, tag),
        _ => Err(WireError::UnknownElement {
            name: tag.name.to_owned(),
            offset: tag.offset,
        }),
    }
}

fn decode_legacy_record<V: SeriesValue>(
    scanner: &mut Scanner<'_>,
    tag: &OpenTag<'_>,
) -> Result<Valuation<V>, WireError> {
    let mut day = EPOCH_DAY;
    let mut value = V::zero();

    if tag.self_closing {
        return Ok(Valuation::new(day, value));
    }

    loop {
        if scanner.at_close_tag() {
            scanner.read_close_tag("DailyValuation")?;
            return Ok(Valuation::new(day, value));
        }

        let field = scanner.read_open_tag()?;
        let text = if field.self_closing {
            ""
        } else {
            scanner.read_text()?
        };
        match field.name {
            "Day" => day = day_or_default(text),
            "Value" => value = value_or_default(text),
            _ => {
                return Err(WireError::UnknownElement {
                    name: field.name.to_owned(),
                    offset: field.offset,
                })
            }
        }
        if !field.self_closing {
            scanner.read_close_tag(field.name)?;
        }
    }
}

struct OpenTag<'a> {
    name: &'a str,
    offset: usize,
    attributes: Vec<(&'a str, &'a str)>,
    self_closing: bool,
}

impl<'a> OpenTag<'a> {
    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// Byte cursor over the input. Position always sits on a UTF-8 boundary:
/// it only ever advances past matched ASCII bytes or to offsets `str::find`
/// returned.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn skip_prolog(&mut self) {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with("<?") {
            match self.input[self.pos..].find("?>") {
                Some(end) => self.pos += end + 2,
                None => self.pos = self.input.len(),
            }
        }
    }

    fn at_close_tag(&mut self) -> bool {
        self.skip_whitespace();
        self.input[self.pos..].starts_with("</")
    }

    fn advance_byte(&mut self, expected: u8, token: &'static str) -> Result<(), WireError> {
        match self.peek() {
            Some(byte) if byte == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(WireError::ExpectedToken {
                expected: token,
                offset: self.pos,
            }),
            None => Err(WireError::UnexpectedEnd { offset: self.pos }),
        }
    }

    fn read_name(&mut self) -> Result<&'a str, WireError> {
        let start = self.pos;
        while matches!(self.peek(), Some(byte) if byte.is_ascii_alphanumeric() || byte == b'_') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(_) => WireError::ExpectedToken {
                    expected: "a name",
                    offset: start,
                },
                None => WireError::UnexpectedEnd { offset: start },
            });
        }
        Ok(&self.input[start..self.pos])
    }

    fn read_open_tag(&mut self) -> Result<OpenTag<'a>, WireError> {
        self.skip_whitespace();
        let offset = self.pos;
        self.advance_byte(b'<', "'<'")?;
        let name = self.read_name()?;
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'/') => {
                    self.pos += 1;
                    self.advance_byte(b'>', "'>'")?;
                    return Ok(OpenTag {
                        name,
                        offset,
                        attributes,
                        self_closing: true,
                    });
                }
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(OpenTag {
                        name,
                        offset,
                        attributes,
                        self_closing: false,
                    });
                }
                Some(_) => {
                    let key = self.read_name()?;
                    self.skip_whitespace();
                    self.advance_byte(b'=', "'='")?;
                    self.skip_whitespace();
                    let value = self.read_quoted()?;
                    attributes.push((key, value));
                }
                None => return Err(WireError::UnexpectedEnd { offset: self.pos }),
            }
        }
    }

    fn read_quoted(&mut self) -> Result<&'a str, WireError> {
        let start = self.pos;
        self.advance_byte(b'"', "'\"'")?;
        // Attribute values here are machine-written dates and numbers;
        // they never contain quotes or entities.
        match self.input[self.pos..].find('"') {
            Some(end) => {
                let value = &self.input[self.pos..self.pos + end];
                self.pos += end + 1;
                Ok(value)
            }
            None => Err(WireError::UnterminatedAttribute { offset: start }),
        }
    }

    fn read_close_tag(&mut self, expected: &str) -> Result<(), WireError> {
        self.skip_whitespace();
        self.advance_byte(b'<', "'<'")?;
        self.advance_byte(b'/', "'/'")?;
        let found = self.read_name()?;
        self.skip_whitespace();
        self.advance_byte(b'>', "'>'")?;
        if found != expected {
            return Err(WireError::MismatchedClose {
                expected: expected.to_owned(),
                found: found.to_owned(),
            });
        }
        Ok(())
    }

    /// Text content up to the next `<`, trimmed.
    fn read_text(&mut self) -> Result<&'a str, WireError> {
        let start = self.pos;
        match self.input[start..].find('<') {
            Some(end) => {
                self.pos = start + end;
                Ok(self.input[start..self.pos].trim())
            }
            None => Err(WireError::UnexpectedEnd { offset: start }),
        }
    }
}
