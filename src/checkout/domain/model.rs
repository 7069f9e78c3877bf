use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult};
use crate::utils::date::{opt_serializer, serializer};

// CheckoutEntity is the active loan of an asset. At most one exists per asset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CheckoutEntity {
    pub checkout_id: String,
    pub version: i64,
    pub branch_id: String,
    pub asset_id: String,
    pub card_id: String,
    #[serde(with = "serializer")]
    pub since: NaiveDateTime,
    #[serde(with = "serializer")]
    pub until: NaiveDateTime,
}

impl CheckoutEntity {
    pub fn new(branch_id: &str, asset_id: &str, card_id: &str, since: NaiveDateTime,
               loan_period: Duration) -> LibraryResult<Self> {
        if loan_period <= Duration::zero() {
            return Err(LibraryError::validation(
                format!("loan period must be positive, got {}", loan_period).as_str(), Some("400".to_string())));
        }
        let until = since.checked_add_signed(loan_period).ok_or_else(|| LibraryError::validation(
            format!("due date overflows for loan starting {}", since).as_str(), Some("400".to_string())))?;
        Ok(Self {
            checkout_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: branch_id.to_string(),
            asset_id: asset_id.to_string(),
            card_id: card_id.to_string(),
            since,
            until,
        })
    }
}

impl Identifiable for CheckoutEntity {
    fn id(&self) -> String {
        self.checkout_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// CheckoutHistoryEntity is the audit row of one loan episode. It is closed by
// setting checked_in and is never deleted.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CheckoutHistoryEntity {
    pub history_id: String,
    pub version: i64,
    pub asset_id: String,
    pub card_id: String,
    #[serde(with = "serializer")]
    pub checked_out: NaiveDateTime,
    #[serde(with = "opt_serializer")]
    pub checked_in: Option<NaiveDateTime>,
}

impl CheckoutHistoryEntity {
    pub fn opened(asset_id: &str, card_id: &str, checked_out: NaiveDateTime) -> Self {
        Self {
            history_id: Uuid::new_v4().to_string(),
            version: 0,
            asset_id: asset_id.to_string(),
            card_id: card_id.to_string(),
            checked_out,
            checked_in: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.checked_in.is_none()
    }

    pub fn close(&mut self, checked_in: NaiveDateTime) {
        self.checked_in = Some(checked_in);
    }
}

impl Identifiable for CheckoutHistoryEntity {
    fn id(&self) -> String {
        self.history_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime};
    use crate::checkout::domain::model::{CheckoutEntity, CheckoutHistoryEntity};
    use crate::core::library::LibraryError;
    use crate::utils::date::DATE_FMT;

    #[tokio::test]
    async fn test_should_build_checkout() {
        let since = NaiveDateTime::parse_from_str("2023-04-11T11:11:11", DATE_FMT).expect("should parse date");
        let checkout = CheckoutEntity::new("branch", "asset1", "card1", since, Duration::days(30))
            .expect("should build checkout");
        assert_eq!("asset1", checkout.asset_id.as_str());
        assert_eq!("card1", checkout.card_id.as_str());
        assert_eq!(since + Duration::days(30), checkout.until);
    }

    #[tokio::test]
    async fn test_should_reject_bad_loan_period() {
        let since = NaiveDateTime::parse_from_str("2023-04-11T11:11:11", DATE_FMT).expect("should parse date");
        assert!(matches!(CheckoutEntity::new("branch", "asset1", "card1", since, Duration::days(-5)),
            Err(LibraryError::Validation { .. })));
        assert!(matches!(CheckoutEntity::new("branch", "asset1", "card1", since, Duration::zero()),
            Err(LibraryError::Validation { .. })));
        assert!(matches!(CheckoutEntity::new("branch", "asset1", "card1", NaiveDateTime::MAX, Duration::days(1)),
            Err(LibraryError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_should_open_and_close_history() {
        let at = NaiveDateTime::parse_from_str("2023-04-11T11:11:11", DATE_FMT).expect("should parse date");
        let mut history = CheckoutHistoryEntity::opened("asset1", "card1", at);
        assert!(history.is_open());
        history.close(at + Duration::days(2));
        assert!(!history.is_open());
        assert_eq!(Some(at + Duration::days(2)), history.checked_in);
    }
}
