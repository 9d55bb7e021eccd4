//! Type catalogue (spec §4.1): physical type names, classification flags,
//! and fixed element widths for binary-packed types.
//!
//! Mirrors the donor's `engine::schema::types::FieldType` — an enum with
//! classification helper methods — generalised from the donor's five
//! declared-type variants to spec §3's full set of ~21 physical encodings,
//! with `Nullable` as the wrapper variant exactly as the donor wraps
//! `Optional(Box<FieldType>)`.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float16,
    Float32,
    Float64,
    Bool,
    Date,
    Datetime,
    TimestampMs,
    Uuid,
    Enum,
    StringDict,
    Str,
    Binary,
    Json,
    Nullable(Box<PhysicalType>),
}

impl PhysicalType {
    /// Fixed element width in bytes for binary-packed types; `None` for
    /// types whose block payload is JSON text (spec §4.3).
    pub fn fixed_width(&self) -> Option<usize> {
        use PhysicalType::*;
        match self {
            Int8 | Uint8 | Bool => Some(1),
            Int16 | Uint16 | Float16 => Some(2),
            Int32 | Uint32 | Float32 => Some(4),
            Int64 | Uint64 | Float64 | TimestampMs => Some(8),
            Nullable(inner) => inner.fixed_width(),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        use PhysicalType::*;
        match self {
            Int8 | Int16 | Int32 | Int64 | Uint8 | Uint16 | Uint32 | Uint64 => true,
            Nullable(inner) => inner.is_integer(),
            _ => false,
        }
    }

    pub fn is_signed_integer(&self) -> bool {
        use PhysicalType::*;
        match self {
            Int8 | Int16 | Int32 | Int64 => true,
            Nullable(inner) => inner.is_signed_integer(),
            _ => false,
        }
    }

    pub fn is_float(&self) -> bool {
        use PhysicalType::*;
        match self {
            Float16 | Float32 | Float64 => true,
            Nullable(inner) => inner.is_float(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_temporal(&self) -> bool {
        use PhysicalType::*;
        match self {
            Date | Datetime | TimestampMs => true,
            Nullable(inner) => inner.is_temporal(),
            _ => false,
        }
    }

    /// spec §3: numeric or temporal types carry a sorted ordinal index.
    pub fn is_indexable(&self) -> bool {
        self.is_numeric() || self.is_temporal()
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, PhysicalType::Nullable(_))
    }

    /// The inner type, stripping one `Nullable` wrapper if present.
    pub fn inner(&self) -> &PhysicalType {
        match self {
            PhysicalType::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn wrap_nullable(self) -> PhysicalType {
        match self {
            PhysicalType::Nullable(_) => self,
            other => PhysicalType::Nullable(Box::new(other)),
        }
    }

    fn bare_name(&self) -> &'static str {
        use PhysicalType::*;
        match self {
            Int8 => "int8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Uint8 => "uint8",
            Uint16 => "uint16",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Float16 => "float16",
            Float32 => "float32",
            Float64 => "float64",
            Bool => "bool",
            Date => "date",
            Datetime => "datetime",
            TimestampMs => "timestamp_ms",
            Uuid => "uuid",
            Enum => "enum",
            StringDict => "string_dict",
            Str => "str",
            Binary => "binary",
            Json => "json",
            Nullable(_) => unreachable!("Nullable has no bare name"),
        }
    }
}

/// Spells `nullable<T>` exactly as spec §6 requires for the schema JSON.
impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalType::Nullable(inner) => write!(f, "nullable<{}>", inner),
            other => write!(f, "{}", other.bare_name()),
        }
    }
}

impl FromStr for PhysicalType {
    type Err = crate::error::JonxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("nullable<").and_then(|r| r.strip_suffix('>')) {
            return Ok(PhysicalType::Nullable(Box::new(rest.parse()?)));
        }
        use PhysicalType::*;
        Ok(match s {
            "int8" => Int8,
            "int16" => Int16,
            "int32" => Int32,
            "int64" => Int64,
            "uint8" => Uint8,
            "uint16" => Uint16,
            "uint32" => Uint32,
            "uint64" => Uint64,
            "float16" => Float16,
            "float32" => Float32,
            "float64" => Float64,
            "bool" => Bool,
            "date" => Date,
            "datetime" => Datetime,
            "timestamp_ms" => TimestampMs,
            "uuid" => Uuid,
            "enum" => Enum,
            "string_dict" => StringDict,
            "str" => Str,
            "binary" => Binary,
            "json" => Json,
            other => {
                return Err(crate::error::JonxError::decode(format!(
                    "unknown physical type name: {other}"
                )));
            }
        })
    }
}
