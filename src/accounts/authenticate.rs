use super::{Account, AccountStore, Hasher, normalize_email};
use anyhow::Result;
use secrecy::SecretString;
use tracing::{debug, instrument};

/// Resolve an email/password pair to an account.
///
/// Returns `Ok(None)` both when no account has the email and when the password
/// does not verify. A missing account still pays for one hash so the two
/// cases take comparable time. Inactive accounts are returned; deciding what
/// to do with them is up to the caller.
///
/// # Errors
/// Returns an error if the store lookup or the hashing task fails.
#[instrument(skip(accounts, hasher, password))]
pub async fn authenticate(
    accounts: &dyn AccountStore,
    hasher: &Hasher,
    email: &str,
    password: SecretString,
) -> Result<Option<Account>> {
    let email = normalize_email(email);

    let Some(account) = accounts.find_by_email(&email).await? else {
        debug!("no account for email");
        hasher.hash_blocking(password).await?;
        return Ok(None);
    };

    if hasher
        .verify_blocking(password, account.password_hash.clone())
        .await?
    {
        Ok(Some(account))
    } else {
        debug!("password mismatch");
        Ok(None)
    }
}
