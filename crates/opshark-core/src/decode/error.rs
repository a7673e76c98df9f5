use thiserror::Error;

/// Errors raised while decoding a packet payload against its definition.
///
/// Cursor reads report the position they failed at so a failure deep inside
/// a nested structure can be located in the raw bytes. The interpreter wraps
/// inner errors in [`DecodeError::Field`] once per schema level, producing a
/// chain from the outermost field down to the failing read.
///
/// # Examples
/// ```
/// use opshark_core::DecodeError;
///
/// let err = DecodeError::TruncatedBuffer {
///     offset: 12,
///     needed: 4,
///     available: 1,
/// };
/// assert!(err.to_string().contains("buffer too short"));
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A read ran past the end of the payload.
    #[error("buffer too short at offset {offset}: need {needed} more bytes, got {available}")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A C string read reached the end of the payload without a NUL byte.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    /// An array definition references a count field that was never decoded.
    #[error("array `{field}` references unknown count field `{count_field}`")]
    UnknownCountField {
        field: &'static str,
        count_field: &'static str,
    },
    /// An array count field decoded to something other than an unsigned integer.
    #[error("array `{field}` count field `{count_field}` is not an unsigned integer")]
    InvalidCountField {
        field: &'static str,
        count_field: &'static str,
    },
    /// Context wrapper naming the field that was being decoded when the
    /// inner error occurred.
    #[error("field `{field}` at offset {offset}: {source}")]
    Field {
        field: &'static str,
        offset: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Walks [`DecodeError::Field`] wrappers down to the underlying error.
    ///
    /// # Examples
    /// ```
    /// use opshark_core::DecodeError;
    ///
    /// let err = DecodeError::Field {
    ///     field: "guid",
    ///     offset: 0,
    ///     source: Box::new(DecodeError::UnterminatedString { offset: 3 }),
    /// };
    /// assert!(matches!(
    ///     err.root_cause(),
    ///     DecodeError::UnterminatedString { offset: 3 }
    /// ));
    /// ```
    pub fn root_cause(&self) -> &DecodeError {
        let mut current = self;
        while let DecodeError::Field { source, .. } = current {
            current = source;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::DecodeError;

    #[test]
    fn field_wrapper_formats_full_chain() {
        let err = DecodeError::Field {
            field: "stats",
            offset: 96,
            source: Box::new(DecodeError::Field {
                field: "value",
                offset: 100,
                source: Box::new(DecodeError::TruncatedBuffer {
                    offset: 100,
                    needed: 4,
                    available: 2,
                }),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("field `stats` at offset 96"));
        assert!(msg.contains("field `value` at offset 100"));
        assert!(msg.contains("buffer too short at offset 100"));
    }

    #[test]
    fn root_cause_unwraps_nested_wrappers() {
        let err = DecodeError::Field {
            field: "outer",
            offset: 0,
            source: Box::new(DecodeError::Field {
                field: "inner",
                offset: 8,
                source: Box::new(DecodeError::UnterminatedString { offset: 8 }),
            }),
        };
        assert!(matches!(
            err.root_cause(),
            DecodeError::UnterminatedString { offset: 8 }
        ));
    }

    #[test]
    fn count_errors_name_both_fields() {
        let err = DecodeError::UnknownCountField {
            field: "states",
            count_field: "count",
        };
        let msg = err.to_string();
        assert!(msg.contains("`states`"));
        assert!(msg.contains("`count`"));
    }
}
