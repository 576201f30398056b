use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, StockRecordId};

macro_rules! identifier_newtype {
    ($(#[$meta:meta])* $t:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $t(String);

        impl $t {
            /// Trim surrounding whitespace and reject empty input.
            pub fn parse(raw: &str) -> DomainResult<Self> {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation(concat!($label, " cannot be empty")));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

identifier_newtype!(
    /// Part number (opaque; not unique on its own).
    PartNumber,
    "part_number"
);

identifier_newtype!(
    /// Rack/bin code.
    Location,
    "location"
);

/// Identity of a stock record: one part at one location.
///
/// Ordering is by part number, then location, which is the listing order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub part_number: PartNumber,
    pub location: Location,
}

impl StockKey {
    pub fn new(part_number: PartNumber, location: Location) -> Self {
        Self {
            part_number,
            location,
        }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} at {}", self.part_number, self.location)
    }
}

/// Availability of stock held at a location.
///
/// Quarantined stock is still counted and still removable; the flag is
/// informational at this layer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[default]
    Available,
    Quarantine,
}

impl StockStatus {
    pub fn toggled(self) -> Self {
        match self {
            StockStatus::Available => StockStatus::Quarantine,
            StockStatus::Quarantine => StockStatus::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "Available",
            StockStatus::Quarantine => "Quarantine",
        }
    }

    /// Read a status column that may be NULL or blank (treated as Available).
    pub fn from_stored(raw: Option<&str>) -> DomainResult<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(StockStatus::Available),
            Some(s) => s.parse(),
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("available") {
            Ok(StockStatus::Available)
        } else if s.eq_ignore_ascii_case("quarantine") {
            Ok(StockStatus::Quarantine)
        } else {
            Err(DomainError::validation(format!("unknown stock status: {s}")))
        }
    }
}

/// Largest quantity a single record may hold; storage keeps quantities as
/// signed 64-bit integers.
pub const MAX_QUANTITY: u64 = i64::MAX as u64;

/// Convert a caller-supplied signed quantity into a positive count.
pub fn positive_quantity(raw: i64) -> DomainResult<u64> {
    if raw <= 0 {
        return Err(DomainError::invalid_quantity(format!(
            "quantity must be positive (got {raw})"
        )));
    }
    Ok(raw.unsigned_abs())
}

fn check_quantity(quantity: u64) -> DomainResult<u64> {
    if quantity == 0 {
        return Err(DomainError::invalid_quantity("quantity must be positive"));
    }
    if quantity > MAX_QUANTITY {
        return Err(DomainError::invalid_quantity(format!(
            "quantity {quantity} exceeds the maximum of {MAX_QUANTITY}"
        )));
    }
    Ok(quantity)
}

/// One (part, location) entry with its quantity and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: StockRecordId,
    part_number: PartNumber,
    location: Location,
    quantity: u64,
    date_in: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    status: StockStatus,
}

impl StockRecord {
    /// First receipt of a part at a location.
    pub fn received(
        key: StockKey,
        quantity: u64,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let quantity = check_quantity(quantity)?;
        Ok(Self {
            id: StockRecordId::new(),
            part_number: key.part_number,
            location: key.location,
            quantity,
            date_in: occurred_at,
            last_updated: occurred_at,
            status: StockStatus::Available,
        })
    }

    /// Rebuild a record from storage.
    pub fn restore(
        id: StockRecordId,
        key: StockKey,
        quantity: u64,
        date_in: DateTime<Utc>,
        last_updated: DateTime<Utc>,
        status: StockStatus,
    ) -> Self {
        Self {
            id,
            part_number: key.part_number,
            location: key.location,
            quantity,
            date_in,
            last_updated,
            status,
        }
    }

    pub fn id(&self) -> StockRecordId {
        self.id
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.part_number.clone(), self.location.clone())
    }

    pub fn part_number(&self) -> &PartNumber {
        &self.part_number
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn date_in(&self) -> DateTime<Utc> {
        self.date_in
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    /// The record after receiving `quantity` more units.
    pub(crate) fn with_added(&self, quantity: u64, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        let quantity = check_quantity(quantity)?;
        let new_quantity = self
            .quantity
            .checked_add(quantity)
            .filter(|total| *total <= MAX_QUANTITY)
            .ok_or_else(|| {
                DomainError::invalid_quantity(format!(
                    "adding {quantity} to {} would exceed the maximum of {MAX_QUANTITY}",
                    self.quantity
                ))
            })?;
        Ok(Self {
            quantity: new_quantity,
            last_updated: occurred_at,
            ..self.clone()
        })
    }

    /// The record after issuing `quantity` units; never goes below zero.
    pub(crate) fn with_removed(&self, quantity: u64, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::invalid_quantity("quantity must be positive"));
        }
        let new_quantity = self
            .quantity
            .checked_sub(quantity)
            .ok_or_else(|| DomainError::insufficient_stock(quantity, self.quantity))?;
        Ok(Self {
            quantity: new_quantity,
            last_updated: occurred_at,
            ..self.clone()
        })
    }

    pub(crate) fn with_status_toggled(&self, occurred_at: DateTime<Utc>) -> Self {
        Self {
            status: self.status.toggled(),
            last_updated: occurred_at,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(part: &str, location: &str) -> StockKey {
        StockKey::new(PartNumber::parse(part).unwrap(), Location::parse(location).unwrap())
    }

    #[test]
    fn identifiers_are_trimmed() {
        let part = PartNumber::parse("  PN123 \t").unwrap();
        assert_eq!(part.as_str(), "PN123");
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        match Location::parse("   ").unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("location")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn identifiers_deserialize_through_validation() {
        let ok: PartNumber = serde_json::from_str("\" PN9 \"").unwrap();
        assert_eq!(ok.as_str(), "PN9");
        assert!(serde_json::from_str::<PartNumber>("\"\"").is_err());
    }

    #[test]
    fn keys_order_by_part_then_location() {
        let mut keys = vec![key("PN2", "A1"), key("PN1", "B1"), key("PN1", "A9")];
        keys.sort();
        assert_eq!(keys, vec![key("PN1", "A9"), key("PN1", "B1"), key("PN2", "A1")]);
    }

    #[test]
    fn status_parsing_and_stored_defaults() {
        assert_eq!("quarantine".parse::<StockStatus>().unwrap(), StockStatus::Quarantine);
        assert_eq!(" Available ".parse::<StockStatus>().unwrap(), StockStatus::Available);
        assert!("lost".parse::<StockStatus>().is_err());
        assert_eq!(StockStatus::from_stored(None).unwrap(), StockStatus::Available);
        assert_eq!(StockStatus::from_stored(Some("")).unwrap(), StockStatus::Available);
        assert_eq!(StockStatus::Available.toggled().toggled(), StockStatus::Available);
    }

    #[test]
    fn positive_quantity_rejects_zero_and_negative() {
        assert_eq!(positive_quantity(7).unwrap(), 7);
        assert!(matches!(positive_quantity(0), Err(DomainError::InvalidQuantity(_))));
        assert!(matches!(positive_quantity(-3), Err(DomainError::InvalidQuantity(_))));
    }

    #[test]
    fn removal_past_zero_reports_available_stock() {
        let now = Utc::now();
        let record = StockRecord::received(key("PN1", "A1"), 5, now).unwrap();
        let err = record.with_removed(6, now).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock(6, 5));
    }

    #[test]
    fn quantities_are_capped_at_the_storable_maximum() {
        let now = Utc::now();
        assert!(matches!(
            StockRecord::received(key("PN1", "A1"), MAX_QUANTITY + 1, now),
            Err(DomainError::InvalidQuantity(_))
        ));

        let record = StockRecord::received(key("PN1", "A1"), MAX_QUANTITY, now).unwrap();
        assert!(matches!(record.with_added(1, now), Err(DomainError::InvalidQuantity(_))));
        assert_eq!(record.quantity(), MAX_QUANTITY);

        let half = StockRecord::received(key("PN1", "A1"), MAX_QUANTITY / 2, now).unwrap();
        assert!(matches!(half.with_added(u64::MAX, now), Err(DomainError::InvalidQuantity(_))));
        assert_eq!(positive_quantity(i64::MAX).unwrap(), MAX_QUANTITY);
    }
}
