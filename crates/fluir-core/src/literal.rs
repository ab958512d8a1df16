//! Client-side format screening for constant literals.
//!
//! Screening only decides whether a typed literal is worth sending. The
//! accepted text is transmitted unchanged; the edit service owns the typed
//! value.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::LiteralError;
use crate::model::FlType;

lazy_static! {
    static ref F64_RE: Regex = Regex::new(r"^[-+]?[0-9]+(\.[0-9]+)?([eE][-+]?[0-9]+)?$").unwrap();
    static ref INT_RE: Regex = Regex::new(r"^[-+]?[0-9]+$").unwrap();
    static ref UINT_RE: Regex = Regex::new(r"^\+?[0-9]+$").unwrap();
}

/// ASCII decimal floating point, optional exponent. No bare `.5` or `5.`.
pub fn validate_f64(text: &str) -> bool {
    F64_RE.is_match(text)
}

/// Optionally signed decimal integer.
pub fn validate_int(text: &str) -> bool {
    INT_RE.is_match(text)
}

/// Non-negative decimal integer, optional leading `+`.
pub fn validate_uint(text: &str) -> bool {
    UINT_RE.is_match(text)
}

/// Screens `text` as a literal of `fl_type`. Integers are range-checked too.
pub fn screen(fl_type: FlType, text: &str) -> Result<(), LiteralError> {
    let malformed = |expected: &'static str| LiteralError::Malformed {
        text: text.to_string(),
        expected,
    };

    if fl_type.is_float() {
        return if validate_f64(text) {
            Ok(())
        } else {
            Err(malformed("floating point"))
        };
    }

    if fl_type.is_unsigned_integer() {
        if !validate_uint(text) {
            return Err(malformed("unsigned integer"));
        }
    } else if !validate_int(text) {
        return Err(malformed("integer"));
    }

    let in_range = match fl_type {
        FlType::I8 => text.parse::<i8>().is_ok(),
        FlType::I16 => text.parse::<i16>().is_ok(),
        FlType::I32 => text.parse::<i32>().is_ok(),
        FlType::I64 => text.parse::<i64>().is_ok(),
        FlType::U8 => text.parse::<u8>().is_ok(),
        FlType::U16 => text.parse::<u16>().is_ok(),
        FlType::U32 => text.parse::<u32>().is_ok(),
        FlType::U64 => text.parse::<u64>().is_ok(),
        FlType::F64 => true,
    };
    if in_range {
        Ok(())
    } else {
        Err(LiteralError::OutOfRange {
            text: text.to_string(),
            fl_type: fl_type.name(),
        })
    }
}
