// Auction Domain Model

use crate::domain::error::{DomainError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Auction ID (assigned by the store on first insert)
pub type AuctionId = String;

/// Auction Status
///
/// Moves one way only: `Active` -> `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Completed,
}

impl AuctionStatus {
    /// Check a move along the one-way lifecycle, returning the target status
    pub fn transition_to(self, to: AuctionStatus) -> Result<AuctionStatus> {
        match (self, to) {
            (AuctionStatus::Active, AuctionStatus::Completed) => Ok(to),
            (from, to) => Err(DomainError::InvalidStatusTransition {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionStatus::Active => write!(f, "ACTIVE"),
            AuctionStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(AuctionStatus::Active),
            "COMPLETED" => Ok(AuctionStatus::Completed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Product Condition (descriptive only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCondition {
    New,
    Used,
}

impl std::fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCondition::New => write!(f, "NEW"),
            ProductCondition::Used => write!(f, "USED"),
        }
    }
}

impl FromStr for ProductCondition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEW" => Ok(ProductCondition::New),
            "USED" => Ok(ProductCondition::Used),
            other => Err(DomainError::UnknownCondition(other.to_string())),
        }
    }
}

/// Auction Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    /// Empty until the store persists the auction
    pub id: AuctionId,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,

    /// Creation time, overwritten with the completion time on close
    pub timestamp: DateTime<Utc>,
}

impl Auction {
    /// Create a new, not yet persisted, active auction
    ///
    /// # Arguments
    ///
    /// * `created_at` - Creation time (injected, not system time)
    pub fn new(
        product_name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        condition: ProductCondition,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuctionId::new(),
            product_name: product_name.into(),
            category: category.into(),
            description: description.into(),
            condition,
            status: AuctionStatus::Active,
            timestamp: created_at,
        }
    }

    /// Whether the store has assigned an identifier yet
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Convert epoch seconds (wire format) back to a UTC timestamp
pub fn timestamp_from_secs(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(DomainError::InvalidTimestamp(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Auction {
        Auction::new(
            "Test Product",
            "Test Category",
            "Test Desc",
            ProductCondition::New,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_auction_is_active_and_unpersisted() {
        let auction = sample();
        assert_eq!(auction.status, AuctionStatus::Active);
        assert!(auction.id.is_empty());
        assert!(!auction.is_persisted());
    }

    #[test]
    fn test_only_active_to_completed() {
        assert_eq!(
            AuctionStatus::Active.transition_to(AuctionStatus::Completed).unwrap(),
            AuctionStatus::Completed
        );

        let err = AuctionStatus::Completed
            .transition_to(AuctionStatus::Completed)
            .unwrap_err();
        assert!(err.to_string().contains("COMPLETED -> COMPLETED"));

        let err = AuctionStatus::Active
            .transition_to(AuctionStatus::Active)
            .unwrap_err();
        assert!(err.to_string().contains("ACTIVE -> ACTIVE"));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(AuctionStatus::Active.to_string(), "ACTIVE");
        assert_eq!(
            "COMPLETED".parse::<AuctionStatus>().unwrap(),
            AuctionStatus::Completed
        );
        assert_eq!("USED".parse::<ProductCondition>().unwrap(), ProductCondition::Used);
        assert!("REFURBISHED".parse::<ProductCondition>().is_err());
        assert!("closed".parse::<AuctionStatus>().is_err());
    }
}
