use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub base_uri: Option<String>,
}

/// `GET https://id.getharvest.com/api/v2/accounts`.
#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}
