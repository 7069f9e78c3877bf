use chrono::Duration;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryError, LibraryResult};

pub const DEFAULT_LOAN_DAYS: i64 = 30;
pub const MAX_LOAN_DAYS: i64 = 36_500;

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}


// Configuration abstracts config options for the circulation engine
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub checkout_loan_days: i64,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            checkout_loan_days: DEFAULT_LOAN_DAYS,
        }
    }

    pub fn with_loan_days(mut self, days: i64) -> LibraryResult<Self> {
        validate_loan_days(days)?;
        self.checkout_loan_days = days;
        Ok(self)
    }

    // checked again here since a deserialized configuration skips with_loan_days
    pub fn loan_period(&self) -> LibraryResult<Duration> {
        validate_loan_days(self.checkout_loan_days)?;
        Ok(Duration::days(self.checkout_loan_days))
    }
}

fn validate_loan_days(days: i64) -> LibraryResult<()> {
    if !(1..=MAX_LOAN_DAYS).contains(&days) {
        return Err(LibraryError::validation(
            format!("checkout loan days must be between 1 and {}, got {}", MAX_LOAN_DAYS, days).as_str(),
            Some("400".to_string())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crate::core::domain::{Configuration, MAX_LOAN_DAYS};
    use crate::core::library::LibraryError;

    #[tokio::test]
    async fn test_should_build_config() {
        let config = Configuration::new("test");
        assert_eq!("test", config.branch_id.as_str());
        assert_eq!(30, config.checkout_loan_days);
        assert_eq!(Duration::days(30), config.loan_period().expect("should build loan period"));
    }

    #[tokio::test]
    async fn test_should_override_loan_days() {
        let config = Configuration::new("test").with_loan_days(14).expect("should accept loan days");
        assert_eq!(Duration::days(14), config.loan_period().expect("should build loan period"));
        let config = Configuration::new("test").with_loan_days(MAX_LOAN_DAYS).expect("should accept loan days");
        assert_eq!(Duration::days(MAX_LOAN_DAYS), config.loan_period().expect("should build loan period"));
    }

    #[tokio::test]
    async fn test_should_reject_loan_days_out_of_range() {
        for days in [0, -5, MAX_LOAN_DAYS + 1, i64::MAX, i64::MIN] {
            let res = Configuration::new("test").with_loan_days(days);
            assert!(matches!(res, Err(LibraryError::Validation { .. })), "accepted {} loan days", days);
        }
    }

    #[tokio::test]
    async fn test_should_reject_deserialized_loan_days_out_of_range() {
        let config: Configuration = serde_json::from_str(r#"{"branch_id":"main","checkout_loan_days":-5}"#)
            .expect("should parse config");
        assert!(matches!(config.loan_period(), Err(LibraryError::Validation { .. })));
        let config: Configuration = serde_json::from_str(
            format!(r#"{{"branch_id":"main","checkout_loan_days":{}}}"#, i64::MAX).as_str()).expect("should parse config");
        assert!(matches!(config.loan_period(), Err(LibraryError::Validation { .. })));
    }
}
