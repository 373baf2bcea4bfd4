use crate::api::transport::{ApiRequest, ApiResponse, Auth, Body, ReqwestTransport, Transport};
use crate::api::types::{CatalogResponse, TokenResponse};
use crate::collectors::Filters;
use crate::config::ApiSettings;
use crate::models::VehicleDetails;
use anyhow::Result;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// Where the client stands with the token endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated { token: String },
}

impl AuthState {
    pub fn token(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated { token } => Some(token.as_str()),
            AuthState::Unauthenticated => None,
        }
    }

    /// Drop the token after the server rejected it
    fn invalidate(&mut self) {
        *self = AuthState::Unauthenticated;
    }
}

/// Webmotors API client.
///
/// Holds one bearer token for its own lifetime. Calls never return transport
/// errors: failures are logged and surface as `None`.
pub struct WebmotorsClient {
    settings: ApiSettings,
    transport: Box<dyn Transport>,
    state: AuthState,
}

impl WebmotorsClient {
    /// Create a client talking HTTP through reqwest
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let transport = ReqwestTransport::new(settings.timeout)?;
        Ok(Self::with_transport(settings, Box::new(transport)))
    }

    /// Create a client over a custom transport
    pub fn with_transport(settings: ApiSettings, transport: Box<dyn Transport>) -> Self {
        if !settings.credentials.missing().is_empty() {
            warn!(
                missing = ?settings.credentials.missing(),
                "Webmotors API credentials not found"
            );
        }
        Self {
            settings,
            transport,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn access_token(&self) -> Option<&str> {
        self.state.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.token().is_some()
    }

    /// Exchange the credentials for a bearer token.
    ///
    /// Returns `false` when a credential is missing, the endpoint answers with
    /// anything but success, or the answer carries no token. The previous
    /// token is discarded in every failure case.
    pub async fn authenticate(&mut self) -> bool {
        let Some(creds) = self.settings.credentials.complete() else {
            error!(
                missing = ?self.settings.credentials.missing(),
                "Cannot authenticate: missing credentials"
            );
            self.state = AuthState::Unauthenticated;
            return false;
        };

        let request = ApiRequest {
            method: Method::POST,
            url: format!("{}/oauth/token", self.settings.base_url),
            auth: Auth::Basic {
                username: creds.client_id.to_string(),
                password: creds.client_secret.to_string(),
            },
            query: Vec::new(),
            body: Body::Form(vec![
                ("grant_type".to_string(), "password".to_string()),
                ("username".to_string(), creds.username.to_string()),
                ("password".to_string(), creds.password.to_string()),
            ]),
        };

        self.state = match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                match serde_json::from_str::<TokenResponse>(&response.body) {
                    Ok(TokenResponse {
                        access_token: Some(token),
                    }) if !token.is_empty() => AuthState::Authenticated { token },
                    Ok(_) => {
                        error!("Token response did not contain an access_token");
                        AuthState::Unauthenticated
                    }
                    Err(e) => {
                        error!(error = %e, "Could not parse token response");
                        AuthState::Unauthenticated
                    }
                }
            }
            Ok(response) => {
                error!(
                    status = response.status,
                    body = %response.body,
                    "Authentication failed"
                );
                AuthState::Unauthenticated
            }
            Err(e) => {
                error!(error = ?e, "Error during authentication");
                AuthState::Unauthenticated
            }
        };

        if self.is_authenticated() {
            info!("Successfully authenticated with Webmotors API");
        }
        self.is_authenticated()
    }

    /// Perform an authorized call against `{base_url}/{version}/{endpoint}`.
    ///
    /// Authenticates first when no token is held. A 401 invalidates the token,
    /// triggers one re-authentication and exactly one retry.
    pub async fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Option<Value> {
        let url = format!(
            "{}/{}/{}",
            self.settings.base_url,
            self.settings.api_version,
            endpoint.trim_start_matches('/')
        );

        let mut response = self.send_authorized(&method, &url, params, &body).await?;

        if response.is_unauthorized() {
            warn!(%url, "Authentication token expired, attempting to re-authenticate");
            self.state.invalidate();
            if !self.authenticate().await {
                error!(%url, "Re-authentication failed, giving up on request");
                return None;
            }
            response = self.send_authorized(&method, &url, params, &body).await?;
            if response.is_unauthorized() {
                self.state.invalidate();
            }
        }

        if !response.is_success() {
            error!(
                status = response.status,
                body = %response.body,
                %url,
                "API request failed"
            );
            return None;
        }

        match serde_json::from_str(&response.body) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(error = %e, %url, "API returned invalid JSON");
                None
            }
        }
    }

    async fn send_authorized(
        &mut self,
        method: &Method,
        url: &str,
        params: &[(String, String)],
        body: &Option<Value>,
    ) -> Option<ApiResponse> {
        if !self.is_authenticated() && !self.authenticate().await {
            return None;
        }
        let token = self.state.token()?.to_string();

        let request = ApiRequest {
            method: method.clone(),
            url: url.to_string(),
            auth: Auth::Bearer(token),
            query: params.to_vec(),
            body: body.clone().map_or(Body::Empty, Body::Json),
        };

        debug!(%method, %url, "Sending API request");
        match self.transport.send(request).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!(error = ?e, %url, "Error making API request");
                None
            }
        }
    }

    async fn request_as<T: DeserializeOwned>(
        &mut self,
        method: Method,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Option<T> {
        let value = self.request(method, endpoint, params, body).await?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                error!(error = %e, endpoint, "Unexpected API response shape");
                None
            }
        }
    }

    /// One catalog page matching the given filters
    pub async fn get_catalog(&mut self, params: &Filters) -> Option<CatalogResponse> {
        let query = to_query(params);
        self.request_as(Method::GET, "catalog", &query, None).await
    }

    pub async fn get_vehicle_details(&mut self, vehicle_id: &str) -> Option<VehicleDetails> {
        let endpoint = format!("catalog/vehicle/{vehicle_id}");
        self.request_as(Method::GET, &endpoint, &[], None).await
    }

    pub async fn get_financing_simulation(
        &mut self,
        vehicle_id: &str,
        down_payment: f64,
        term_months: u32,
    ) -> Option<Value> {
        let body = json!({
            "vehicleId": vehicle_id,
            "downPayment": down_payment,
            "termMonths": term_months,
        });
        self.request(Method::POST, "financing/simulation", &[], Some(body))
            .await
    }
}

/// Flatten filter values into query pairs; strings are sent unquoted
pub fn to_query(filters: &Filters) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
