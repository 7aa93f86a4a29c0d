//! Parser for the request-template document.
//!
//! The template is a nested, key/value text format describing a `Requests`
//! message: zero or more `requests_per_featurestore` blocks, each carrying a
//! `featurestore_id` and one or more `requests` blocks that are in turn
//! either a `read_feature_values_request` (single-entity) or a
//! `streaming_read_feature_values_request` (multi-entity). This mirrors the
//! message shapes documented for the template format, encoded the way
//! structured configuration is conventionally written out as text: bare
//! identifiers for field names, `{ }` for nested messages, `"..."` string
//! literals for scalar values, and repeated field names standing in for
//! `repeated` proto fields.
//!
//! ```text
//! requests_per_featurestore {
//!   featurestore_id: "fs1"
//!   requests {
//!     read_feature_values_request {
//!       entity_type: "users"
//!       entity_id: "${ENTITY_ID}"
//!       feature_selector {
//!         id_matcher {
//!           ids: "age"
//!           ids: "income"
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use crate::error::{Error, Result};

/// One parsed field: a name paired with either a scalar string or a nested
/// message. Repeated fields appear as repeated entries with the same name,
/// in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A quoted scalar.
    Str(String),
    /// A nested `{ ... }` block, itself a sequence of fields.
    Message(Vec<(String, Value)>),
}

impl Value {
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            Self::Message(_) => None,
        }
    }

    fn as_message(&self) -> Option<&[(String, Value)]> {
        match self {
            Self::Message(fields) => Some(fields.as_slice()),
            Self::Str(_) => None,
        }
    }
}

/// Looks up every field with the given name, in document order.
fn find_all<'a>(fields: &'a [(String, Value)], name: &str) -> Vec<&'a Value> {
    fields
        .iter()
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value)
        .collect()
}

fn find_one<'a>(fields: &'a [(String, Value)], name: &str, location: &str) -> Result<&'a Value> {
    find_all(fields, name)
        .into_iter()
        .next()
        .ok_or_else(|| Error::InputMalformed {
            location: location.to_string(),
            reason: format!("missing required field '{name}'"),
        })
}

fn require_str(value: &Value, field: &str, location: &str) -> Result<String> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| Error::InputMalformed {
            location: location.to_string(),
            reason: format!("field '{field}' must be a string, not a nested message"),
        })
}

fn require_message<'a>(value: &'a Value, field: &str, location: &str) -> Result<&'a [(String, Value)]> {
    value.as_message().ok_or_else(|| Error::InputMalformed {
        location: location.to_string(),
        reason: format!("field '{field}' must be a nested message, not a string"),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Str(&'a str),
    OpenBrace,
    CloseBrace,
    Colon,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token<'a>, usize)>> {
        let mut tokens = Vec::new();
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            match c {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                }
                b'#' => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'{' => {
                    tokens.push((Token::OpenBrace, self.line));
                    self.pos += 1;
                }
                b'}' => {
                    tokens.push((Token::CloseBrace, self.line));
                    self.pos += 1;
                }
                b':' => {
                    tokens.push((Token::Colon, self.line));
                    self.pos += 1;
                }
                b'"' => {
                    let line = self.line;
                    let start = self.pos + 1;
                    let mut end = start;
                    let mut closed = false;
                    while end < bytes.len() {
                        if bytes[end] == b'\\' && end + 1 < bytes.len() {
                            end += 2;
                            continue;
                        }
                        if bytes[end] == b'"' {
                            closed = true;
                            break;
                        }
                        if bytes[end] == b'\n' {
                            break;
                        }
                        end += 1;
                    }
                    if !closed {
                        return Err(Error::InputMalformed {
                            location: format!("line {line}"),
                            reason: "unterminated string literal".to_string(),
                        });
                    }
                    tokens.push((Token::Str(&self.input[start..end]), line));
                    self.pos = end + 1;
                }
                _ if c.is_ascii_alphabetic() || c == b'_' => {
                    let line = self.line;
                    let start = self.pos;
                    while self.pos < bytes.len()
                        && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
                    {
                        self.pos += 1;
                    }
                    tokens.push((Token::Ident(&self.input[start..self.pos]), line));
                }
                _ => {
                    return Err(Error::InputMalformed {
                        location: format!("line {}", self.line),
                        reason: format!("unexpected character '{}'", c as char),
                    });
                }
            }
        }
        Ok(tokens)
    }
}

/// Parses a sequence of `name: "value"` and `name { ... }` fields, stopping
/// at the first unmatched `}` or end of input. Returns the parsed fields and
/// the number of tokens consumed (not including a trailing unmatched `}`,
/// which the caller is responsible for).
fn parse_fields(tokens: &[(Token<'_>, usize)]) -> Result<(Vec<(String, Value)>, usize)> {
    let mut fields = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].0 {
            Token::CloseBrace => break,
            Token::Ident(name) => {
                let line = tokens[i].1;
                i += 1;
                match tokens.get(i).map(|(t, _)| t) {
                    Some(Token::Colon) => {
                        i += 1;
                        match tokens.get(i) {
                            Some((Token::Str(s), _)) => {
                                fields.push((name.to_string(), Value::Str(unescape(s))));
                                i += 1;
                            }
                            _ => {
                                return Err(Error::InputMalformed {
                                    location: format!("line {line}"),
                                    reason: format!("expected string literal after '{name}:'"),
                                });
                            }
                        }
                    }
                    Some(Token::OpenBrace) => {
                        i += 1;
                        let (nested, consumed) = parse_block(&tokens[i..], line)?;
                        i += consumed;
                        fields.push((name.to_string(), Value::Message(nested)));
                    }
                    _ => {
                        return Err(Error::InputMalformed {
                            location: format!("line {line}"),
                            reason: format!("expected ':' or '{{' after field name '{name}'"),
                        });
                    }
                }
            }
            _ => {
                return Err(Error::InputMalformed {
                    location: format!("line {}", tokens[i].1),
                    reason: "expected a field name".to_string(),
                });
            }
        }
    }
    Ok((fields, i))
}

/// Parses fields up to and including the closing `}`, returning the fields
/// and how many tokens (including the `}`) were consumed.
fn parse_block(tokens: &[(Token<'_>, usize)], opened_at_line: usize) -> Result<(Vec<(String, Value)>, usize)> {
    let (fields, consumed) = parse_fields(tokens)?;
    match tokens.get(consumed) {
        Some((Token::CloseBrace, _)) => Ok((fields, consumed + 1)),
        _ => Err(Error::InputMalformed {
            location: format!("line {opened_at_line}"),
            reason: "unterminated '{' block".to_string(),
        }),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// One template request, still carrying unexpanded `${ENTITY_ID}`
/// placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    /// The feature store this request targets.
    pub featurestore_id: String,
    /// The entity type this request targets.
    pub entity_type: String,
    /// The addressing shape: `Single` carries the raw (possibly
    /// placeholder-bearing) entity ID text; `Streaming` carries one text
    /// per `entity_ids` entry.
    pub shape: TemplateShape,
    /// The feature IDs to request.
    pub feature_ids: Vec<String>,
}

/// Which RPC shape a template request uses.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateShape {
    /// `ReadFeatureValuesRequest`: one `entity_id` field, possibly
    /// containing `${ENTITY_ID}`.
    Single(String),
    /// `StreamingReadFeatureValuesRequest`: a list of `entity_ids` fields,
    /// each possibly containing `${ENTITY_ID}`.
    Streaming(Vec<String>),
}

/// Parses a complete template document into an ordered list of
/// [`RequestTemplate`] values, preserving document order across
/// featurestores and within each featurestore's request list.
pub fn parse_template(document: &str) -> Result<Vec<RequestTemplate>> {
    let tokens = Lexer::new(document).tokenize()?;
    let (top, _) = parse_fields(&tokens)?;

    let mut templates = Vec::new();
    for group in find_all(&top, "requests_per_featurestore") {
        let group_fields = require_message(group, "requests_per_featurestore", "top level")?;
        let featurestore_id = require_str(
            find_one(group_fields, "featurestore_id", "requests_per_featurestore")?,
            "featurestore_id",
            "requests_per_featurestore",
        )?;

        for request in find_all(group_fields, "requests") {
            let request_fields = require_message(request, "requests", &featurestore_id)?;
            templates.push(parse_one_request(&featurestore_id, request_fields)?);
        }
    }
    Ok(templates)
}

fn parse_one_request(
    featurestore_id: &str,
    request_fields: &[(String, Value)],
) -> Result<RequestTemplate> {
    if let Some(single) = find_all(request_fields, "read_feature_values_request").first() {
        let fields = require_message(single, "read_feature_values_request", featurestore_id)?;
        let entity_type = require_str(
            find_one(fields, "entity_type", featurestore_id)?,
            "entity_type",
            featurestore_id,
        )?;
        let entity_id = require_str(
            find_one(fields, "entity_id", featurestore_id)?,
            "entity_id",
            featurestore_id,
        )?;
        let feature_ids = parse_feature_selector(fields, featurestore_id)?;
        return Ok(RequestTemplate {
            featurestore_id: featurestore_id.to_string(),
            entity_type,
            shape: TemplateShape::Single(entity_id),
            feature_ids,
        });
    }

    if let Some(streaming) =
        find_all(request_fields, "streaming_read_feature_values_request").first()
    {
        let fields = require_message(
            streaming,
            "streaming_read_feature_values_request",
            featurestore_id,
        )?;
        let entity_type = require_str(
            find_one(fields, "entity_type", featurestore_id)?,
            "entity_type",
            featurestore_id,
        )?;
        let entity_ids: Vec<String> = find_all(fields, "entity_ids")
            .into_iter()
            .map(|v| require_str(v, "entity_ids", featurestore_id))
            .collect::<Result<_>>()?;
        if entity_ids.is_empty() {
            return Err(Error::InputMalformed {
                location: featurestore_id.to_string(),
                reason: "streaming_read_feature_values_request has no entity_ids".to_string(),
            });
        }
        let feature_ids = parse_feature_selector(fields, featurestore_id)?;
        return Ok(RequestTemplate {
            featurestore_id: featurestore_id.to_string(),
            entity_type,
            shape: TemplateShape::Streaming(entity_ids),
            feature_ids,
        });
    }

    Err(Error::InputMalformed {
        location: featurestore_id.to_string(),
        reason: "requests entry has neither read_feature_values_request nor \
                 streaming_read_feature_values_request"
            .to_string(),
    })
}

fn parse_feature_selector(fields: &[(String, Value)], location: &str) -> Result<Vec<String>> {
    let selector = require_message(
        find_one(fields, "feature_selector", location)?,
        "feature_selector",
        location,
    )?;
    let matcher = require_message(
        find_one(selector, "id_matcher", location)?,
        "id_matcher",
        location,
    )?;
    let ids: Vec<String> = find_all(matcher, "ids")
        .into_iter()
        .map(|v| require_str(v, "ids", location))
        .collect::<Result<_>>()?;
    if ids.is_empty() {
        return Err(Error::InputMalformed {
            location: location.to_string(),
            reason: "id_matcher has no ids".to_string(),
        });
    }
    Ok(ids)
}
