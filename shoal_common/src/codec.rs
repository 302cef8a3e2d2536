//! Standard serializer/deserializer pairs for values carried home by a `Task`.
//!
//! A codec's contract (design note in spec): bijective for well-formed
//! inputs, and must never emit the task-result or task-result-list
//! delimiters used by the scheduler's wire format (see `shoal_cluster`'s
//! `messaging` module).

use crate::error::{Result, ShoalError};
use serde::{de::DeserializeOwned, Serialize};

/// Serialize `value` to its wire representation.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(ShoalError::from)
}

/// Parse a wire representation back into a value of type `T`.
pub fn decode<T: DeserializeOwned>(wire: &str) -> Result<T> {
    serde_json::from_str(wire).map_err(ShoalError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        assert_eq!(decode::<i64>(&encode(&42i64).unwrap()).unwrap(), 42);
        assert_eq!(
            decode::<String>(&encode(&"hello".to_string()).unwrap()).unwrap(),
            "hello"
        );
    }

    #[test]
    fn round_trips_pairs() {
        let pair = (1i32, "a".to_string());
        let wire = encode(&pair).unwrap();
        assert_eq!(decode::<(i32, String)>(&wire).unwrap(), pair);
    }

    #[test]
    fn round_trips_vectors() {
        let v = vec![1, 2, 3];
        let wire = encode(&v).unwrap();
        assert_eq!(decode::<Vec<i32>>(&wire).unwrap(), v);
    }
}
