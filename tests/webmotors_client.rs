mod common;

use car_scout::api::{Auth, AuthState, Body, WebmotorsClient};
use car_scout::collectors::Filters;
use car_scout::config::{ApiSettings, Credentials};
use common::{settings, token, ScriptedTransport, BASE_URL};
use reqwest::Method;
use serde_json::json;

fn client(transport: &ScriptedTransport) -> WebmotorsClient {
    WebmotorsClient::with_transport(settings(), Box::new(transport.clone()))
}

#[tokio::test]
async fn authenticate_stores_token_and_uses_password_grant() {
    let transport = ScriptedTransport::new().respond(200, token("tok-1"));
    let mut client = client(&transport);

    assert!(client.authenticate().await);
    assert_eq!(client.access_token(), Some("tok-1"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.url, format!("{BASE_URL}/oauth/token"));
    assert_eq!(
        req.auth,
        Auth::Basic {
            username: "client-id".to_string(),
            password: "client-secret".to_string(),
        }
    );
    let Body::Form(fields) = &req.body else {
        panic!("token request should be form encoded");
    };
    assert!(fields.contains(&("grant_type".to_string(), "password".to_string())));
    assert!(fields.contains(&("username".to_string(), "api-user".to_string())));
    assert!(fields.contains(&("password".to_string(), "api-pass".to_string())));
}

#[tokio::test]
async fn rejected_credentials_leave_no_token() {
    let transport = ScriptedTransport::new().respond(401, json!({"error": "invalid_client"}));
    let mut client = client(&transport);

    assert!(!client.authenticate().await);
    assert!(client.access_token().is_none());
    assert_eq!(client.state(), &AuthState::Unauthenticated);
}

#[tokio::test]
async fn missing_credentials_fail_without_network() {
    let transport = ScriptedTransport::new();
    let incomplete = ApiSettings::new(Credentials {
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
        username: None,
        password: None,
    });
    let mut client = WebmotorsClient::with_transport(incomplete, Box::new(transport.clone()));

    assert!(!client.authenticate().await);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn token_response_without_access_token_is_a_failure() {
    let transport = ScriptedTransport::new()
        .respond(200, token("old"))
        .respond(200, json!({"token_type": "bearer"}));
    let mut client = client(&transport);

    assert!(client.authenticate().await);
    assert!(!client.authenticate().await);
    assert!(client.access_token().is_none());
}

#[tokio::test]
async fn transport_errors_become_failures() {
    let transport = ScriptedTransport::new().fail("dns error");
    let mut client = client(&transport);

    assert!(!client.authenticate().await);
    assert!(client
        .request(Method::GET, "catalog", &[], None)
        .await
        .is_none());
}

#[tokio::test]
async fn first_request_authenticates_lazily() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(200, json!({"vehicles": [], "pagination": {"currentPage": 1, "totalPages": 1}}));
    let mut client = client(&transport);

    let filters = Filters::from([("brand".to_string(), json!("Toyota"))]);
    let catalog = client.get_catalog(&filters).await.expect("catalog");
    assert!(catalog.vehicles.is_empty());

    let catalog_req = &transport.requests_to("/v1/catalog")[0];
    assert_eq!(catalog_req.auth, Auth::Bearer("tok-1".to_string()));
    assert_eq!(
        catalog_req.query,
        vec![("brand".to_string(), "Toyota".to_string())]
    );
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_request_retried() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(401, json!({"error": "token expired"}))
        .respond(200, token("tok-2"))
        .respond(200, json!({"id": "77", "color": "silver"}));
    let mut client = client(&transport);

    let details = client.get_vehicle_details("77").await.expect("details");
    assert_eq!(details.color.as_deref(), Some("silver"));

    // initial auth + exactly one re-authentication
    assert_eq!(transport.token_requests(), 2);

    let calls = transport.requests_to("/v1/catalog/vehicle/77");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].auth, Auth::Bearer("tok-1".to_string()));
    assert_eq!(calls[1].auth, Auth::Bearer("tok-2".to_string()));
    assert_eq!(client.access_token(), Some("tok-2"));
}

#[tokio::test]
async fn details_with_string_door_count_still_parse() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(200, json!({"color": "white", "doors": "4"}));
    let mut client = client(&transport);

    let details = client.get_vehicle_details("9").await.expect("details");
    assert_eq!(details.color.as_deref(), Some("white"));
    assert_eq!(details.doors, Some(4));
}

#[tokio::test]
async fn repeated_401_gives_up_after_one_retry() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(401, json!({}))
        .respond(200, token("tok-2"))
        .respond(401, json!({}))
        .respond(200, token("never-used"));
    let mut client = client(&transport);

    let result = client.request(Method::GET, "catalog", &[], None).await;

    assert!(result.is_none());
    assert_eq!(transport.requests().len(), 4);
    assert_eq!(transport.token_requests(), 2);
    assert_eq!(client.state(), &AuthState::Unauthenticated);
}

#[tokio::test]
async fn failed_reauthentication_fails_the_call() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(401, json!({}))
        .respond(400, json!({"error": "invalid_grant"}));
    let mut client = client(&transport);

    assert!(client
        .request(Method::GET, "catalog", &[], None)
        .await
        .is_none());
    assert_eq!(transport.requests().len(), 3);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn other_error_statuses_are_not_retried() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(500, json!({"error": "boom"}));
    let mut client = client(&transport);

    assert!(client
        .request(Method::GET, "catalog", &[], None)
        .await
        .is_none());
    assert_eq!(transport.requests().len(), 2);
    // the token survives non-401 failures
    assert_eq!(client.access_token(), Some("tok-1"));
}

#[tokio::test]
async fn invalid_json_body_is_a_failure() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond_raw(200, "<html>maintenance</html>");
    let mut client = client(&transport);

    assert!(client
        .request(Method::GET, "catalog", &[], None)
        .await
        .is_none());
}

#[tokio::test]
async fn financing_simulation_posts_json_body() {
    let transport = ScriptedTransport::new()
        .respond(200, token("tok-1"))
        .respond(200, json!({"installment": 1234.5}));
    let mut client = client(&transport);

    let sim = client
        .get_financing_simulation("55", 10000.0, 36)
        .await
        .expect("simulation");
    assert_eq!(sim["installment"], 1234.5);

    let req = &transport.requests_to("/v1/financing/simulation")[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.body,
        Body::Json(json!({"vehicleId": "55", "downPayment": 10000.0, "termMonths": 36}))
    );
}
