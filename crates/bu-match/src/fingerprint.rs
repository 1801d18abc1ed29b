use std::fmt;

use bu_model::Record;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Content identity of a dataset row.
///
/// Two rows with the same values in the same column order share a
/// fingerprint regardless of their position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowFingerprint([u8; 32]);

impl RowFingerprint {
    pub fn of(record: Record<'_>) -> Self {
        let mut hasher = Sha256::new();
        for (column, value) in record.iter() {
            hasher.update(column.as_bytes());
            hasher.update([0x1f]);
            hasher.update(value.trim().as_bytes());
            hasher.update([0x1e]);
        }
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RowFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RowFingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use bu_model::Dataset;

    use super::*;

    #[test]
    fn identical_rows_share_a_fingerprint() {
        let data = Dataset::from_rows(&["A", "B"], &[&["1", "2"], &["1", "2"], &["1", "3"]]).unwrap();
        let fp = |i| RowFingerprint::of(data.record(i).unwrap());
        assert_eq!(fp(0), fp(1));
        assert_ne!(fp(0), fp(2));
        assert_eq!(fp(0).to_hex().len(), 64);
    }

    #[test]
    fn cell_boundaries_matter() {
        let data = Dataset::from_rows(&["A", "B"], &[&["12", "3"], &["1", "23"]]).unwrap();
        assert_ne!(
            RowFingerprint::of(data.record(0).unwrap()),
            RowFingerprint::of(data.record(1).unwrap())
        );
    }
}
