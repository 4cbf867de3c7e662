use crate::backend::models::Deposit;
use crate::backend::models::NewDeposit;
use crate::backend::models::UserRow;
use crate::commons::reqwest_client;
use crate::config;
use anyhow::Context;
use anyhow::Result;
use reqwest::RequestBuilder;

/// Reads the user's trading balance off the `users` table.
///
/// Returns an error when the backend is unreachable or holds no row for the
/// user; the caller decides what to fall back to.
pub async fn fetch_trading_balance() -> Result<f64> {
    let url = format!(
        "{}/users?id=eq.{}&select=trading_balance",
        config::get_backend_url(),
        config::get_user_id()
    );

    let rows: Vec<UserRow> = authorized(reqwest_client().get(url))
        .send()
        .await
        .context("Could not reach backend")?
        .error_for_status()?
        .json()
        .await
        .context("Could not deserialize users row")?;

    let row = rows.into_iter().next().context("No row for this user")?;

    Ok(row.trading_balance)
}

/// Files a deposit report into `crypto_deposits` and returns the stored row.
///
/// The backend confirms the transaction on chain on its own schedule; the
/// credit arrives later through the realtime stream.
pub async fn report_deposit(new_deposit: NewDeposit) -> Result<Deposit> {
    let url = format!("{}/crypto_deposits", config::get_backend_url());

    let rows: Vec<Deposit> = authorized(reqwest_client().post(url))
        // have the insert echo the created row back
        .header("Prefer", "return=representation")
        .json(&new_deposit)
        .send()
        .await
        .context("Could not reach backend")?
        .error_for_status()?
        .json()
        .await
        .context("Could not deserialize inserted deposit")?;

    let deposit = rows
        .into_iter()
        .next()
        .context("Backend returned no deposit row")?;

    tracing::debug!(deposit_id = %deposit.id, "Reported deposit");

    Ok(deposit)
}

/// The user's deposit reports, newest first, for the account page.
pub async fn get_deposits() -> Result<Vec<Deposit>> {
    let url = format!(
        "{}/crypto_deposits?user_id=eq.{}&order=created_at.desc",
        config::get_backend_url(),
        config::get_user_id()
    );

    let deposits = authorized(reqwest_client().get(url))
        .send()
        .await
        .context("Could not reach backend")?
        .error_for_status()?
        .json()
        .await
        .context("Could not deserialize deposits")?;

    Ok(deposits)
}

/// Every backend request carries the publishable api key, both as `apikey`
/// and as a bearer token.
fn authorized(builder: RequestBuilder) -> RequestBuilder {
    let api_key = config::get_backend_api_key();
    builder
        .header("apikey", api_key.clone())
        .header("Authorization", format!("Bearer {api_key}"))
}
