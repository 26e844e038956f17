//! Privilege codec
//!
//! Sentry spells privileges as `key=value` segments joined by `->`, e.g.
//!
//! ```text
//! server=server1->db=jranalyst1->table=*->action=select
//! server=server1->uri=hdfs://ha-nn-uri/landing/analyst1
//! ```
//!
//! [`PrivilegeCodec::parse`] turns such an expression into a [`Privilege`],
//! filling the fields the expression doesn't mention from a template.
//! [`PrivilegeCodec::render`] goes the other way for display.
//!
//! ```
//! use sentrytool_core::{Privilege, PrivilegeCodec};
//!
//! let codec = PrivilegeCodec::default();
//! let template = Privilege {
//!     server: "server1".to_owned(),
//!     ..Default::default()
//! };
//! let privilege = codec.parse("db=sales->action=select", &template).unwrap();
//! assert_eq!(codec.render(&privilege), "server=server1->db=sales->action=select");
//! ```

use thiserror::Error;

use crate::logging::debug;
use crate::privilege::Privilege;

const SEGMENT_SEPARATOR: &str = "->";
const VALUE_SEPARATOR: char = '=';
/// Not part of the public vocabulary: only ever turns the grant option on.
const GRANT_OPTION_KEY: &str = "grantoption";

/// A renderable key and the privilege field it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Server,
    Database,
    Table,
    Column,
    Uri,
    Action,
}

impl Field {
    fn key(self) -> &'static str {
        match self {
            Field::Server => "server",
            Field::Database => "db",
            Field::Table => "table",
            Field::Column => "column",
            Field::Uri => "uri",
            Field::Action => "action",
        }
    }

    fn get(self, privilege: &Privilege) -> &str {
        match self {
            Field::Server => &privilege.server,
            Field::Database => &privilege.database,
            Field::Table => &privilege.table,
            Field::Column => &privilege.column,
            Field::Uri => &privilege.uri,
            Field::Action => &privilege.action,
        }
    }

    fn get_mut(self, privilege: &mut Privilege) -> &mut String {
        match self {
            Field::Server => &mut privilege.server,
            Field::Database => &mut privilege.database,
            Field::Table => &mut privilege.table,
            Field::Column => &mut privilege.column,
            Field::Uri => &mut privilege.uri,
            Field::Action => &mut privilege.action,
        }
    }
}

/// Keys in canonical render order.
const FIELDS: [Field; 6] = [
    Field::Server,
    Field::Database,
    Field::Table,
    Field::Column,
    Field::Uri,
    Field::Action,
];

/// Error returned when a privilege expression can't be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A segment did not split into exactly one key and one value.
    #[error("invalid privilege format for '{segment}'")]
    MalformedSegment {
        /// The offending segment
        segment: String,
    },
    /// A segment used a key outside of the recognized vocabulary.
    #[error("invalid scope name '{key}'")]
    UnknownKey {
        /// The offending key
        key: String,
    },
}

/// What to do with keys outside of the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Fail with [`ParseError::UnknownKey`].
    #[default]
    Reject,
    /// Skip the segment.
    Ignore,
}

/// Parser and renderer for canonical privilege expressions.
#[derive(Clone, Copy)]
pub struct PrivilegeCodec {
    fields: &'static [Field],
    unknown_keys: UnknownKeys,
}

impl Default for PrivilegeCodec {
    fn default() -> Self {
        Self::new(UnknownKeys::default())
    }
}

impl std::fmt::Debug for PrivilegeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivilegeCodec")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("unknown_keys", &self.unknown_keys)
            .finish()
    }
}

impl PrivilegeCodec {
    /// Create a codec with the given handling of unknown keys.
    pub fn new(unknown_keys: UnknownKeys) -> Self {
        Self {
            fields: &FIELDS,
            unknown_keys,
        }
    }

    /// A codec that skips unknown keys instead of failing.
    pub fn lenient() -> Self {
        Self::new(UnknownKeys::Ignore)
    }

    /// The renderable keys, in canonical order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.key())
    }

    /// Parse `expression` into a new privilege, starting from a copy of
    /// `template`.
    ///
    /// Fields not mentioned in the expression keep the template's value. The
    /// template itself is never modified, and nothing is returned on error.
    pub fn parse(&self, expression: &str, template: &Privilege) -> Result<Privilege, ParseError> {
        let mut privilege = template.clone();

        for segment in expression.split(SEGMENT_SEPARATOR) {
            let (key, value) = split_segment(segment)?;

            if key == GRANT_OPTION_KEY {
                if value.to_lowercase().starts_with('t') {
                    privilege.grant_option = true;
                }
                continue;
            }

            match self.fields.iter().find(|f| f.key() == key) {
                Some(field) => *field.get_mut(&mut privilege) = value.to_owned(),
                None => match self.unknown_keys {
                    UnknownKeys::Reject => {
                        return Err(ParseError::UnknownKey {
                            key: key.to_owned(),
                        })
                    }
                    UnknownKeys::Ignore => debug!("ignoring unknown privilege key {key}"),
                },
            }
        }

        Ok(privilege)
    }

    /// Render a privilege in canonical form.
    ///
    /// Only non-empty fields are included. The grant option, service and
    /// scope are never rendered.
    pub fn render(&self, privilege: &Privilege) -> String {
        self.fields
            .iter()
            .filter_map(|f| {
                let value = f.get(privilege);
                (!value.is_empty()).then(|| format!("{}{}{}", f.key(), VALUE_SEPARATOR, value))
            })
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }
}

fn split_segment(segment: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = segment.split(VALUE_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Ok((key, value)),
        _ => Err(ParseError::MalformedSegment {
            segment: segment.to_owned(),
        }),
    }
}
