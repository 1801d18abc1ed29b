//! The fixed output schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// One of the 13 columns of the upload file, in output order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum OutputColumn {
    Firstname,
    Surname,
    Street1,
    Street2,
    City,
    County,
    Postcode,
    Country,
    LocAmount,
    Email,
    PayFrequency,
    AdditionalDetails,
    DateOfApproval,
}

/// Columns that must be non-empty in every output row.
pub const REQUIRED_COLUMNS: [OutputColumn; 4] = [
    OutputColumn::Firstname,
    OutputColumn::Surname,
    OutputColumn::LocAmount,
    OutputColumn::Email,
];

impl OutputColumn {
    /// All columns in output order.
    pub const ALL: [OutputColumn; 13] = [
        Self::Firstname,
        Self::Surname,
        Self::Street1,
        Self::Street2,
        Self::City,
        Self::County,
        Self::Postcode,
        Self::Country,
        Self::LocAmount,
        Self::Email,
        Self::PayFrequency,
        Self::AdditionalDetails,
        Self::DateOfApproval,
    ];

    /// Header text written to the CSV.
    pub fn header(self) -> &'static str {
        match self {
            Self::Firstname => "Firstname",
            Self::Surname => "Surname",
            Self::Street1 => "Street1",
            Self::Street2 => "Street2",
            Self::City => "City",
            Self::County => "County",
            Self::Postcode => "Postcode",
            Self::Country => "Country",
            Self::LocAmount => "LOC Amount",
            Self::Email => "Email",
            Self::PayFrequency => "Pay Frequency",
            Self::AdditionalDetails => "Additional Details",
            Self::DateOfApproval => "Date of Approval",
        }
    }

    /// Position of the column in the output row.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the column is part of the required subset.
    pub fn is_required(self) -> bool {
        REQUIRED_COLUMNS.contains(&self)
    }

    /// Additional Details is composed from a recipe; every other column maps
    /// directly to a source column.
    pub fn is_mappable(self) -> bool {
        self != Self::AdditionalDetails
    }

    /// Value used when the column has no mapped source column.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            Self::Country => Some("UK"),
            Self::PayFrequency => Some("Monthly"),
            _ => None,
        }
    }

    /// Columns an operator can map, in output order.
    pub fn mappable() -> impl Iterator<Item = OutputColumn> {
        Self::ALL.into_iter().filter(|column| column.is_mappable())
    }
}

impl fmt::Display for OutputColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for OutputColumn {
    type Err = ModelError;

    /// Accepts the CSV header ("LOC Amount") or the serialized key
    /// ("locAmount"), ignoring case, spaces, and underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        Self::ALL
            .into_iter()
            .find(|column| squash(column.header()) == wanted)
            .ok_or_else(|| ModelError::UnknownOutputColumn(s.to_string()))
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_follows_output_order() {
        for (position, column) in OutputColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), position);
        }
    }

    #[test]
    fn parses_headers_and_keys() {
        assert_eq!("LOC Amount".parse::<OutputColumn>(), Ok(OutputColumn::LocAmount));
        assert_eq!("locAmount".parse::<OutputColumn>(), Ok(OutputColumn::LocAmount));
        assert_eq!(
            "date_of_approval".parse::<OutputColumn>(),
            Ok(OutputColumn::DateOfApproval)
        );
        assert!("Middle Name".parse::<OutputColumn>().is_err());
    }

    #[test]
    fn additional_details_is_not_mappable() {
        assert_eq!(OutputColumn::mappable().count(), 12);
        assert!(!OutputColumn::AdditionalDetails.is_mappable());
    }

    #[test]
    fn defaults_only_for_country_and_frequency() {
        let with_defaults: Vec<_> = OutputColumn::ALL
            .into_iter()
            .filter(|column| column.default_value().is_some())
            .collect();
        assert_eq!(
            with_defaults,
            vec![OutputColumn::Country, OutputColumn::PayFrequency]
        );
    }
}
