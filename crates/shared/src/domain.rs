use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(ImageId);

/// Opaque position marker returned by the list endpoint as `after`.
///
/// The API has been observed to send either a bare id (`"after": "5"`) or a
/// reference object (`"after": {"id": "5"}`); both decode to the same cursor.
/// Serialization always produces the bare form used in the `after` query
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CursorRepr {
    Bare(String),
    Number(i64),
    Ref { id: String },
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match CursorRepr::deserialize(deserializer)? {
            CursorRepr::Bare(id) | CursorRepr::Ref { id } => Cursor(id),
            CursorRepr::Number(id) => Cursor(id.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Image,
    Title,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::Image, FormField::Title, FormField::Description];

    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Image => "image",
            FormField::Title => "title",
            FormField::Description => "description",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
