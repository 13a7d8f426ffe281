use dbt_types::BankDetails;
use thiserror::Error;

pub use dbt_types::api::SubmitTicketRequest as SubmissionForm;

const ACCOUNT_DIGITS: std::ops::RangeInclusive<usize> = 9..=18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your bank account number")]
    MissingAccountNumber,

    #[error("Please confirm your bank account number")]
    MissingConfirmation,

    #[error("Account numbers do not match")]
    AccountMismatch,

    #[error("Please enter the IFSC code of your branch")]
    MissingIfsc,

    #[error("Account number must be 9 to 18 digits")]
    InvalidAccountNumber,

    #[error("IFSC code must look like SBIN0001234")]
    InvalidIfsc,
}

/// Checks a submission form and returns the normalized bank details.
///
/// Pure: runs before anything is sent to the store.
pub fn validate_submission(form: &SubmissionForm) -> Result<BankDetails, ValidationError> {
    let account = form.account_number.trim();
    let confirm = form.confirm_account_number.trim();
    let ifsc = form.ifsc_code.trim().to_ascii_uppercase();

    if account.is_empty() {
        return Err(ValidationError::MissingAccountNumber);
    }
    if confirm.is_empty() {
        return Err(ValidationError::MissingConfirmation);
    }
    if account != confirm {
        return Err(ValidationError::AccountMismatch);
    }
    if ifsc.is_empty() {
        return Err(ValidationError::MissingIfsc);
    }
    if !ACCOUNT_DIGITS.contains(&account.len()) || !account.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAccountNumber);
    }
    if !is_ifsc(&ifsc) {
        return Err(ValidationError::InvalidIfsc);
    }

    Ok(BankDetails {
        account_number: account.to_string(),
        ifsc_code: ifsc,
    })
}

/// Four bank letters, a literal zero, then six branch characters.
fn is_ifsc(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(|b| b.is_ascii_uppercase())
        && bytes[4] == b'0'
        && bytes[5..].iter().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(account: &str, confirm: &str, ifsc: &str) -> SubmissionForm {
        SubmissionForm {
            account_number: account.into(),
            confirm_account_number: confirm.into(),
            ifsc_code: ifsc.into(),
            description: String::new(),
        }
    }

    #[test]
    fn accepts_matching_fields() {
        let bank = validate_submission(&form("123456789", "123456789", "sbin0001234")).unwrap();
        assert_eq!(bank.account_number, "123456789");
        assert_eq!(bank.ifsc_code, "SBIN0001234");
    }

    #[test]
    fn rejects_mismatched_accounts() {
        assert_eq!(
            validate_submission(&form("123456789", "123456780", "SBIN0001234")),
            Err(ValidationError::AccountMismatch)
        );
    }

    #[test]
    fn presence_checks_come_first() {
        assert_eq!(
            validate_submission(&form("", "", "")),
            Err(ValidationError::MissingAccountNumber)
        );
        assert_eq!(
            validate_submission(&form("123456789", " ", "SBIN0001234")),
            Err(ValidationError::MissingConfirmation)
        );
        assert_eq!(
            validate_submission(&form("123456789", "123456789", "")),
            Err(ValidationError::MissingIfsc)
        );
    }

    #[test]
    fn format_checks() {
        assert_eq!(
            validate_submission(&form("12345", "12345", "SBIN0001234")),
            Err(ValidationError::InvalidAccountNumber)
        );
        assert_eq!(
            validate_submission(&form("12345678A", "12345678A", "SBIN0001234")),
            Err(ValidationError::InvalidAccountNumber)
        );
        assert_eq!(
            validate_submission(&form("123456789", "123456789", "SBIN1001234")),
            Err(ValidationError::InvalidIfsc)
        );
        assert_eq!(
            validate_submission(&form("123456789", "123456789", "SBI0001234")),
            Err(ValidationError::InvalidIfsc)
        );
    }
}
