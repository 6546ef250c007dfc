//! Hosted backend over PostgREST
//!
//! Every table is exposed at `{url}/rest/v1/{table}`; filters use the
//! `column=eq.value` syntax and inserts ask for the stored row back.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Store, StoreResult};
use crate::config::RestConfig;
use crate::constants;
use crate::entries::{EntryId, RawRow};
use crate::error::StoreError;

/// Client for the hosted staff/entries tables
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: String,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StaffRow {
    name: String,
}

impl RestStore {
    pub fn new(config: &RestConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: format!(
                "{}{}",
                config.url.trim_end_matches('/'),
                constants::REST_PATH
            ),
            api_key: config.api_key.clone(),
            bearer: config
                .access_token
                .clone()
                .unwrap_or_else(|| config.api_key.clone()),
            user_id: config.user_id.clone(),
        }
    }

    /// `{base}/{table}?k=v&...` with values percent-encoded
    fn table_url(&self, table: &str, params: &[(&str, String)]) -> StoreResult<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, table))
            .map_err(|e| StoreError::Malformed(format!("invalid backend url: {}", e)))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "backend request");
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    /// Attach the owner id to a row about to be inserted
    fn owned(&self, mut row: RawRow) -> RawRow {
        if let Some(user_id) = &self.user_id {
            row.insert("user_id".into(), Value::from(user_id.as_str()));
        }
        row
    }
}

/// Turn a non-2xx response into `StoreError::Status`
async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl Store for RestStore {
    async fn list_staff(&self) -> StoreResult<Vec<String>> {
        let url = self.table_url(
            constants::STAFF_TABLE,
            &[("select", "name".into()), ("order", "name.asc".into())],
        )?;
        let response = check(self.request(Method::GET, url).send().await?).await?;
        let rows: Vec<StaffRow> = response.json().await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn insert_staff(&self, name: &str) -> StoreResult<()> {
        let url = self.table_url(constants::STAFF_TABLE, &[])?;
        let mut row = RawRow::new();
        row.insert("name".into(), Value::from(name));
        let body = json!([self.owned(row)]);
        check(self.request(Method::POST, url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn delete_staff(&self, name: &str) -> StoreResult<()> {
        let url = self.table_url(constants::STAFF_TABLE, &[("name", eq(name))])?;
        check(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }

    async fn rename_staff(&self, old: &str, new: &str) -> StoreResult<()> {
        let url = self.table_url(constants::STAFF_TABLE, &[("name", eq(old))])?;
        let body = json!({ "name": new });
        check(self.request(Method::PATCH, url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn list_entries(&self) -> StoreResult<Vec<RawRow>> {
        let url = self.table_url(
            constants::ENTRIES_TABLE,
            &[("select", "*".into()), ("order", "timestamp.asc".into())],
        )?;
        let response = check(self.request(Method::GET, url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn insert_entry(&self, row: &RawRow) -> StoreResult<RawRow> {
        let url = self.table_url(constants::ENTRIES_TABLE, &[])?;
        let body = json!([self.owned(row.clone())]);
        let response = check(
            self.request(Method::POST, url)
                .header("Prefer", "return=representation")
                .json(&body)
                .send()
                .await?,
        )
        .await?;

        let mut rows: Vec<RawRow> = response.json().await?;
        if rows.is_empty() {
            return Err(StoreError::Malformed(
                "insert returned no rows".to_string(),
            ));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update_entry(&self, id: &EntryId, row: &RawRow) -> StoreResult<()> {
        let url = self.table_url(constants::ENTRIES_TABLE, &[("id", eq(id))])?;
        check(self.request(Method::PATCH, url).json(row).send().await?).await?;
        Ok(())
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        let url = self.table_url(constants::ENTRIES_TABLE, &[("id", eq(id))])?;
        check(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }

    async fn reassign_entries(&self, old: &str, new: &str) -> StoreResult<()> {
        let url = self.table_url(constants::ENTRIES_TABLE, &[("staff_name", eq(old))])?;
        let body = json!({ "staff_name": new });
        check(self.request(Method::PATCH, url).json(&body).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>, user: Option<&str>) -> RestConfig {
        RestConfig {
            url: "https://salon.example.co/".to_string(),
            api_key: "anon".to_string(),
            access_token: token.map(str::to_string),
            user_id: user.map(str::to_string),
        }
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let store = RestStore::new(&config(None, None));
        let url = store
            .table_url("staff", &[("name", eq("Mary Ann & Co"))])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://salon.example.co/rest/v1/staff?name=eq.Mary+Ann+%26+Co"
        );

        let url = store.table_url("entries", &[]).unwrap();
        assert_eq!(url.as_str(), "https://salon.example.co/rest/v1/entries");
    }

    #[test]
    fn test_bearer_falls_back_to_api_key() {
        assert_eq!(RestStore::new(&config(None, None)).bearer, "anon");
        assert_eq!(RestStore::new(&config(Some("jwt"), None)).bearer, "jwt");
    }

    #[test]
    fn test_owned_rows_carry_user_id() {
        let store = RestStore::new(&config(None, Some("owner-1")));
        let row = store.owned(RawRow::new());
        assert_eq!(row["user_id"], json!("owner-1"));

        let anonymous = RestStore::new(&config(None, None));
        assert!(!anonymous.owned(RawRow::new()).contains_key("user_id"));
    }

    #[test]
    fn test_eq_filter_for_ids() {
        assert_eq!(eq(&EntryId::Number(42)), "eq.42");
        assert_eq!(eq(&EntryId::Text("a-b".into())), "eq.a-b");
    }
}
