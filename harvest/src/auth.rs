use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Account, AccountsResponse},
    HarvestFetchError, HarvestURL, ID_BASE_URL,
};

pub const CLIENT_USER_AGENT: &str = "tally (Harvest timer client)";

/// Everything needed to talk to the Harvest v2 API on behalf of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub subdomain: String,
    pub access_token: String,
    pub account_id: u64,
    #[serde(default)]
    pub account_name: Option<String>,
}

impl Credentials {
    pub fn new(subdomain: impl Into<String>, access_token: impl Into<String>, account_id: u64) -> Self {
        Self {
            subdomain: subdomain.into(),
            access_token: access_token.into(),
            account_id,
            account_name: None,
        }
    }

    /// Resolve the account id for `subdomain` using a personal access token.
    pub async fn authenticate(
        subdomain: &str,
        access_token: &str,
    ) -> Result<Credentials, HarvestFetchError> {
        let subdomain = normalize_subdomain(subdomain);
        if subdomain.is_empty() {
            return Err(HarvestFetchError::InvalidCredentials(
                "Invalid subdomain".to_string(),
            ));
        }
        if access_token.trim().is_empty() {
            return Err(HarvestFetchError::InvalidCredentials(
                "Missing access token".to_string(),
            ));
        }

        let url = HarvestURL::new(ID_BASE_URL).append_path("accounts");
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token.trim()))
                .map_err(|e| HarvestFetchError::InvalidCredentials(e.to_string()))?,
        );

        let resp = Client::new()
            .get(url.as_ref())
            .headers(headers)
            .send()
            .await
            .map_err(|e| HarvestFetchError::ResponseError(e.to_string()))?;
        let resp = crate::client::check_status(resp).await?;

        let accounts: AccountsResponse = resp.json().await.map_err(|e| {
            HarvestFetchError::ParsingError(format!("Failed to parse accounts response: {}", e))
        })?;

        let account = pick_account(&accounts.accounts, &subdomain).ok_or_else(|| {
            HarvestFetchError::InvalidCredentials("No accounts associated with token".to_string())
        })?;

        tracing::info!("Authenticated against Harvest account '{}'", account.name);

        Ok(Credentials {
            subdomain,
            access_token: access_token.trim().to_string(),
            account_id: account.id,
            account_name: Some(account.name.clone()),
        })
    }
}

/// Accept `acme`, `acme.harvestapp.com` or a pasted `https://acme.harvestapp.com/...` URL.
pub fn normalize_subdomain(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_domain = match without_scheme.find(".harvestapp.com") {
        Some(idx) => &without_scheme[..idx],
        None => without_scheme,
    };
    without_domain.trim_end_matches('/').to_string()
}

/// Prefer the account whose base URI belongs to `subdomain`, else the first one.
pub fn pick_account<'a>(accounts: &'a [Account], subdomain: &str) -> Option<&'a Account> {
    let needle = format!("{}.harvestapp.com", subdomain);
    accounts
        .iter()
        .find(|a| {
            a.base_uri
                .as_deref()
                .map(|uri| uri.contains(&needle))
                .unwrap_or(false)
        })
        .or_else(|| accounts.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: u64, base_uri: &str) -> Account {
        Account {
            id,
            name: format!("account-{}", id),
            base_uri: Some(base_uri.to_string()),
        }
    }

    #[test]
    fn normalize_subdomain_strips_url_noise() {
        assert_eq!(normalize_subdomain("acme"), "acme");
        assert_eq!(normalize_subdomain(" acme.harvestapp.com "), "acme");
        assert_eq!(
            normalize_subdomain("https://acme.harvestapp.com/time/week"),
            "acme"
        );
        assert_eq!(normalize_subdomain("http://acme/"), "acme");
        assert_eq!(normalize_subdomain("   "), "");
    }

    #[test]
    fn pick_account_matches_subdomain() {
        let accounts = vec![
            account(1, "https://other.harvestapp.com"),
            account(2, "https://acme.harvestapp.com"),
        ];
        assert_eq!(pick_account(&accounts, "acme").map(|a| a.id), Some(2));
    }

    #[test]
    fn pick_account_falls_back_to_first() {
        let accounts = vec![account(7, "https://other.harvestapp.com")];
        assert_eq!(pick_account(&accounts, "acme").map(|a| a.id), Some(7));
        assert!(pick_account(&[], "acme").is_none());
    }
}
