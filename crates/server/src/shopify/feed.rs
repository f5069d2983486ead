//! Paginated reader over the Shopify Admin customers feed.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use super::{FeedError, GraphQLError};
use super::types::{ExternalAddress, ExternalCustomer};
use crate::config::ShopifyConfig;
use crate::models::CustomerFields;

/// Customers page query. Field list matches what the reconciler consumes;
/// `$first`/`$after` drive cursor pagination.
const CUSTOMERS_QUERY: &str = r"
query Customers($first: Int!, $after: String) {
  customers(first: $first, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    edges {
      node {
        id
        firstName
        lastName
        displayName
        email
        phone
        addresses {
          address1
          address2
          city
          company
          province
        }
      }
    }
  }
}
";

/// Outbound create for customers entered through the local API.
const CUSTOMER_CREATE_MUTATION: &str = r"
mutation CustomerCreate($input: CustomerInput!) {
  customerCreate(input: $input) {
    customer {
      id
    }
    userErrors {
      field
      message
    }
  }
}
";

/// A read handle onto the external customer directory.
///
/// The reconciler takes this as a constructor argument rather than reaching
/// for a process-global client, so tests can substitute a canned feed.
#[async_trait]
pub trait CustomerFeed: Send + Sync {
    /// Fetch the complete customer snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if any page cannot be retrieved or parsed; a
    /// partial snapshot is never returned.
    async fn fetch_all(&self) -> Result<Vec<ExternalCustomer>, FeedError>;
}

/// Shopify Admin API feed client.
///
/// Authenticates with a custom-app admin access token sent per request;
/// there is no interactive authorization flow.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    store: String,
    api_version: String,
    access_token: secrecy::SecretString,
    page_size: i64,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

// Wire shapes for the customers query.

#[derive(Debug, Deserialize)]
struct CustomersData {
    customers: CustomerConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerConnection {
    page_info: PageInfo,
    edges: Vec<CustomerEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerEdge {
    node: CustomerNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerNode {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    #[serde(default)]
    addresses: Vec<AddressNode>,
}

#[derive(Debug, Deserialize)]
struct AddressNode {
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    company: Option<String>,
    province: Option<String>,
}

// Wire shapes for the customerCreate mutation.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerCreateData {
    customer_create: Option<CustomerCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerCreatePayload {
    customer: Option<CreatedCustomer>,
    #[serde(default)]
    user_errors: Vec<UserErrorResponse>,
}

#[derive(Debug, Deserialize)]
struct CreatedCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserErrorResponse {
    #[serde(default)]
    field: Option<Vec<String>>,
    message: String,
}

impl FeedClient {
    /// Create a new feed client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            store: config.store.clone(),
            api_version: config.api_version.clone(),
            access_token: config.access_token.clone(),
            page_size: config.page_size,
        }
    }

    /// Execute a GraphQL document with the given variables.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, FeedError> {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            self.store, self.api_version
        );

        let response = self
            .client
            .post(&endpoint)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(FeedError::RateLimited(retry_after));
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FeedError::Unauthorized(
                "invalid or expired access token".to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let graphql_response: GraphQLResponse<T> =
            serde_json::from_str(&body).map_err(|e| FeedError::MalformedPage(e.to_string()))?;

        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    path: e.path,
                })
                .collect();
            return Err(FeedError::GraphQL(converted_errors));
        }

        graphql_response
            .data
            .ok_or_else(|| FeedError::MalformedPage("no data in response".to_string()))
    }

    /// Push a locally created customer to the directory.
    ///
    /// # Returns
    ///
    /// Returns the directory's ID for the created customer.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::UserError`] if the directory rejects the input,
    /// or another [`FeedError`] if the request fails.
    #[instrument(skip(self, fields), fields(email = %fields.email))]
    pub async fn create_customer(&self, fields: &CustomerFields) -> Result<String, FeedError> {
        let mut input = serde_json::Map::new();
        input.insert("firstName".to_string(), json!(fields.first_name));
        input.insert("lastName".to_string(), json!(fields.last_name));
        input.insert("email".to_string(), json!(fields.email));
        if !fields.phone.is_empty() {
            input.insert("phone".to_string(), json!(fields.phone));
        }

        let response: CustomerCreateData = self
            .execute(CUSTOMER_CREATE_MUTATION, json!({ "input": input }))
            .await?;

        let payload = response
            .customer_create
            .ok_or_else(|| FeedError::MalformedPage("no customerCreate payload".to_string()))?;

        if !payload.user_errors.is_empty() {
            let error_messages: Vec<String> = payload
                .user_errors
                .iter()
                .map(|e| {
                    let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
                    format!("{}: {}", field, e.message)
                })
                .collect();
            return Err(FeedError::UserError(error_messages.join("; ")));
        }

        payload
            .customer
            .map(|c| c.id)
            .ok_or_else(|| FeedError::MalformedPage("no customer returned from create".to_string()))
    }
}

#[async_trait]
impl CustomerFeed for FeedClient {
    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<ExternalCustomer>, FeedError> {
        let mut customers = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let variables = json!({ "first": self.page_size, "after": after });
            let data: CustomersData = self.execute(CUSTOMERS_QUERY, variables).await?;
            let page = data.customers;

            debug!(page_len = page.edges.len(), "fetched customer page");
            customers.extend(page.edges.into_iter().map(|e| convert_customer(e.node)));

            if !page.page_info.has_next_page {
                break;
            }

            match page.page_info.end_cursor {
                Some(cursor) => after = Some(cursor),
                None => {
                    return Err(FeedError::MalformedPage(
                        "hasNextPage without endCursor".to_string(),
                    ));
                }
            }
        }

        Ok(customers)
    }
}

fn convert_customer(node: CustomerNode) -> ExternalCustomer {
    ExternalCustomer {
        external_id: node.id,
        first_name: node.first_name.unwrap_or_default(),
        last_name: node.last_name.unwrap_or_default(),
        display_name: node.display_name.unwrap_or_default(),
        email: node.email.unwrap_or_default(),
        phone: node.phone.unwrap_or_default(),
        addresses: node.addresses.into_iter().map(convert_address).collect(),
    }
}

fn convert_address(node: AddressNode) -> ExternalAddress {
    ExternalAddress {
        address1: node.address1.unwrap_or_default(),
        address2: node.address2.unwrap_or_default(),
        city: node.city.unwrap_or_default(),
        province: node.province.unwrap_or_default(),
        company: node.company,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialization_and_conversion() {
        let body = r#"
        {
          "data": {
            "customers": {
              "pageInfo": { "hasNextPage": true, "endCursor": "cursor-1" },
              "edges": [
                {
                  "node": {
                    "id": "gid://shopify/Customer/1",
                    "firstName": "Jane",
                    "lastName": "Doe",
                    "displayName": "Jane Doe",
                    "email": "jane@example.com",
                    "phone": null,
                    "addresses": [
                      {
                        "address1": "1 Main St",
                        "address2": null,
                        "city": "Springfield",
                        "company": "Acme",
                        "province": "IL"
                      }
                    ]
                  }
                }
              ]
            }
          }
        }
        "#;

        let response: GraphQLResponse<CustomersData> = serde_json::from_str(body).unwrap();
        let page = response.data.unwrap().customers;
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("cursor-1"));

        let customers: Vec<ExternalCustomer> = page
            .edges
            .into_iter()
            .map(|e| convert_customer(e.node))
            .collect();
        assert_eq!(customers.len(), 1);

        let customer = customers.first().unwrap();
        assert_eq!(customer.external_id, "gid://shopify/Customer/1");
        assert_eq!(customer.first_name, "Jane");
        assert_eq!(customer.phone, "");
        assert_eq!(customer.addresses.len(), 1);

        let address = customer.addresses.first().unwrap();
        assert_eq!(address.company_name(), Some("Acme"));
        assert_eq!(address.address2, "");
        assert_eq!(address.city, "Springfield");
    }

    #[test]
    fn test_graphql_errors_deserialization() {
        let body = r#"
        {
          "data": null,
          "errors": [
            { "message": "Throttled", "path": [] }
          ]
        }
        "#;

        let response: GraphQLResponse<CustomersData> = serde_json::from_str(body).unwrap();
        assert!(response.data.is_none());
        let errors = response.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().message, "Throttled");
    }

    #[test]
    fn test_customer_create_user_errors_deserialization() {
        let body = r#"
        {
          "data": {
            "customerCreate": {
              "customer": null,
              "userErrors": [
                { "field": ["input", "email"], "message": "Email has already been taken" }
              ]
            }
          }
        }
        "#;

        let response: GraphQLResponse<CustomerCreateData> = serde_json::from_str(body).unwrap();
        let payload = response.data.unwrap().customer_create.unwrap();
        assert!(payload.customer.is_none());
        assert_eq!(payload.user_errors.len(), 1);
    }
}
