//! Integration tests for cart operations and customization lookup.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use tacobell_core::{
    CartError, Customization, PRODUCTS, RetryPolicy, TacoBellClient, product_code,
};
mod support;
use support::socket_guard::start_mock_server_or_skip;
use support::{TOKEN, mock_config, session_client, session_client_with};

fn beef_burrito_overlay() -> serde_json::Value {
    json!({
        "includes": [
            {
                "name": "Seasoned Beef",
                "variantOptions": [
                    {"code": "23149-MINUS", "modifierType": "MINUS"},
                    {"code": "23149-EXTRA", "modifierType": "EXTRA"}
                ]
            }
        ],
        "sauces": [
            {"name": "Fire Sauce", "variantOptions": [{"code": "22995"}]},
            {"name": "Mild Sauce", "variantOptions": [{"code": 22993}]}
        ],
        "addons": [
            {"name": "Guacamole", "variantOptions": [{"code": "30001"}]}
        ]
    })
}

// ==== Plain Add Tests ====

#[tokio::test]
async fn test_add_to_cart_sends_code_and_token() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .and(query_param("productCodePost", "22152"))
        .and(query_param("CSRFToken", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>cart</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    assert!(client.add_to_cart("Cheesy Roll Up").await.unwrap());
}

#[tokio::test]
async fn test_add_to_cart_uses_catalog_code_for_every_product() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    for product in PRODUCTS {
        Mock::given(method("POST"))
            .and(path("/cart/add"))
            .and(query_param("productCodePost", product.code.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = session_client(&server).await;
    for product in PRODUCTS {
        assert!(
            client.add_to_cart(product.name).await.unwrap(),
            "add failed for {}",
            product.name
        );
    }
}

#[tokio::test]
async fn test_add_to_cart_retries_once_after_403() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    assert!(client.add_to_cart("Beef Burrito").await.unwrap());
}

#[tokio::test]
async fn test_add_to_cart_two_403s_returns_false() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    assert!(!client.add_to_cart("Cinnamon Twists").await.unwrap());
}

#[tokio::test]
async fn test_add_to_cart_honors_configured_attempts() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .respond_with(ResponseTemplate::new(403))
        .expect(4)
        .mount(&server)
        .await;

    let policy = RetryPolicy::with_max_attempts(4).with_base_delay(Duration::from_millis(1));
    let client = session_client_with(&server, mock_config(&server).with_retry_policy(policy)).await;
    assert!(!client.add_to_cart("Cheesy Roll Up").await.unwrap());
}

#[tokio::test]
async fn test_add_to_cart_without_retry_makes_single_attempt() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    assert!(
        !client
            .add_to_cart_without_retry("Chicken Chipotle Melt")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_add_to_cart_other_error_status_counts_as_added() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    assert!(client.add_to_cart("Loaded Nacho Taco").await.unwrap());
}

#[tokio::test]
async fn test_add_to_cart_unknown_product_sends_nothing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    let err = client.add_to_cart("Doritos Locos Tacos").await.unwrap_err();
    assert!(
        matches!(err, CartError::UnknownProduct { ref name } if name == "Doritos Locos Tacos")
    );
}

// ==== Customized Add Tests ====

#[tokio::test]
async fn test_add_to_cart_customized_posts_composite_order() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/p/23149/customizationOverlay"))
        .and(query_param("store", "4321"))
        .respond_with(ResponseTemplate::new(200).set_body_json(beef_burrito_overlay()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart/add-composite"))
        .and(header("content-type", "application/json"))
        .and(header("csrftoken", TOKEN))
        .and(body_json(json!({
            "baseProduct": "23149",
            "code": "23149",
            "qty": "2",
            "includeProduct": [{"code": "23149-MINUS", "group": "included", "qty": 1}],
            "modifierProduct": [
                {"code": 22993, "group": "sauces", "qty": 1},
                {"code": 30001, "group": "addons", "qty": 1}
            ]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = session_client_with(&server, mock_config(&server).with_store_id(4321)).await;
    let customization = Customization::new()
        .with_quantity(2)
        .with_modification("Seasoned Beef", "MINUS")
        .with_sauce("Mild Sauce")
        .with_addon("Guacamole")
        .with_addon("Sour Cream");
    assert!(
        client
            .add_to_cart_customized("Beef Burrito", &customization)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_add_to_cart_customized_403_returns_false_without_retry() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/p/22152/customizationOverlay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart/add-composite"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    assert!(
        !client
            .add_to_cart_customized("Cheesy Roll Up", &Customization::new())
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_add_to_cart_customized_without_overlay_fails() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/p/22500/customizationOverlay"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart/add-composite"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = session_client(&server).await;
    let err = client
        .add_to_cart_customized("Chips and Nacho Cheese Sauce", &Customization::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CartError::CustomizationsUnavailable {
            product_code: 22500
        }
    ));
}

// ==== Cart Total Tests ====

#[tokio::test]
async fn test_cart_total_returns_price() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/cart/miniCart/SUBTOTAL"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"miniCartPrice": "$4.29", "miniCartCount": 2})),
        )
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    assert_eq!(client.cart_total().await.unwrap(), "$4.29");
}

#[tokio::test]
async fn test_cart_total_defaults_when_price_absent() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/cart/miniCart/SUBTOTAL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"miniCartCount": 0})))
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    assert_eq!(client.cart_total().await.unwrap(), "$0.00");
}

#[tokio::test]
async fn test_cart_total_non_json_body_is_decode_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/cart/miniCart/SUBTOTAL"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    let err = client.cart_total().await.unwrap_err();
    assert!(matches!(err, CartError::Decode { ref url, .. } if url.ends_with("cart/miniCart/SUBTOTAL")));
}

// ==== Customization Lookup Tests ====

#[tokio::test]
async fn test_get_customizations_parses_overlay() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/p/23149/customizationOverlay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(beef_burrito_overlay()))
        .expect(1)
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    let options = client.get_customizations(23149, None).await.unwrap().unwrap();
    assert_eq!(options.includes.len(), 1);
    assert_eq!(options.sauces.len(), 2);
    assert_eq!(options.sauces[1].variant_options[0].code, "22993");
    assert_eq!(options.addons[0].name.as_deref(), Some("Guacamole"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_none(), "no store query expected");
}

#[tokio::test]
async fn test_get_customizations_non_200_is_none() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/p/24537/customizationOverlay"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    assert!(client.get_customizations(24537, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_customizations_by_name_scopes_to_store() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/p/22283/customizationOverlay"))
        .and(query_param("store", "31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sauces": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = TacoBellClient::new(mock_config(&server)).unwrap();
    let options = client
        .get_customizations_by_name("Cheesy Bean and Rice Burrito", Some(31))
        .await
        .unwrap()
        .unwrap();
    assert!(options.includes.is_empty());
    assert_eq!(product_code("Cheesy Bean and Rice Burrito"), Some(22283));
}
