// tests/contact_client.rs
//
// The reqwest-backed contact client against live stub endpoints: the
// unreachable-vs-undecodable dichotomy must hold for real sockets.

use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::json;

use redfish_aggregator::{
    network::contact::{ContactCredentials, RemoteContact, ReqwestContactClient},
    utils::{config::ContactConfig, error::AggregatorError},
};

fn client() -> ReqwestContactClient {
    ReqwestContactClient::new(&ContactConfig {
        request_timeout: 5,
        secure: false,
        accept_invalid_certs: false,
    })
    .unwrap()
}

async fn create_session(body: web::Json<serde_json::Value>) -> HttpResponse {
    if body["UserName"] == "admin" && body["Password"] == "password" {
        HttpResponse::Created()
            .insert_header(("X-Auth-Token", "live-token"))
            .finish()
    } else {
        HttpResponse::Unauthorized().finish()
    }
}

/// Starts a well-behaved plugin stub on an ephemeral port and returns its
/// host:port.
fn start_plugin_stub() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/ODIM/v1/Status",
                web::get().to(|| async {
                    HttpResponse::Ok().json(json!({
                        "Name": "Stub plugin",
                        "Status": { "Available": "yes" },
                        "EventMessageBus": {
                            "EmbType": "Kafka",
                            "EmbQueue": [{ "QueueName": "STUB-EVENTS" }]
                        }
                    }))
                }),
            )
            .route("/ODIM/v1/Session", web::post().to(create_session))
            .route(
                "/ODIM/v1/Managers",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .json(json!({ "Members": [{ "@odata.id": "/ODIM/v1/Managers/1" }] }))
                }),
            )
            .route(
                "/ODIM/v1/Managers/1",
                web::get().to(|| async {
                    HttpResponse::Ok().json(json!({ "UUID": "live-uuid", "Name": "BMC" }))
                }),
            )
            .route(
                "/ODIM/v1/Subscriptions",
                web::post().to(|| async { HttpResponse::Created().finish() }),
            )
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    let port = server.addrs()[0].port();
    tokio::spawn(server.run());
    format!("127.0.0.1:{}", port)
}

/// A plugin that answers but with bodies the aggregator cannot decode.
fn start_malformed_stub() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/ODIM/v1/Status",
                web::get().to(|| async { HttpResponse::Ok().body("definitely not json") }),
            )
            .route(
                "/ODIM/v1/Managers",
                web::get().to(|| async {
                    // Decodes as a collection, then the member body is junk.
                    HttpResponse::Ok()
                        .json(json!({ "Members": [{ "@odata.id": "/ODIM/v1/Managers/1" }] }))
                }),
            )
            .route(
                "/ODIM/v1/Managers/1",
                web::get().to(|| async { HttpResponse::Ok().json(json!("just a string")) }),
            )
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    let port = server.addrs()[0].port();
    tokio::spawn(server.run());
    format!("127.0.0.1:{}", port)
}

#[actix_web::test]
async fn probe_decodes_live_status() {
    let address = start_plugin_stub();
    let status = client().probe_status(&address).await.unwrap();
    assert_eq!(status.status.available, "yes");
    assert_eq!(status.event_message_bus.unwrap().queues[0].name, "STUB-EVENTS");
}

#[actix_web::test]
async fn session_login_round_trip() {
    let address = start_plugin_stub();
    let token = client()
        .create_session(&address, "admin", "password")
        .await
        .unwrap();
    assert_eq!(token, "live-token");
}

#[actix_web::test]
async fn rejected_login_is_auth_error() {
    let address = start_plugin_stub();
    let err = client()
        .create_session(&address, "admin", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AggregatorError::Auth(_)));
}

#[actix_web::test]
async fn manager_fetch_follows_collection_member() {
    let address = start_plugin_stub();
    let manager = client()
        .fetch_manager_info(&address, &ContactCredentials::Token("live-token".into()))
        .await
        .unwrap();
    assert_eq!(manager.uuid, "live-uuid");
}

#[actix_web::test]
async fn subscription_created_on_live_stub() {
    let address = start_plugin_stub();
    client()
        .create_subscription(
            &address,
            &ContactCredentials::Basic {
                username: "admin".into(),
                password: "password".into(),
            },
            "https://aggregator/redfish/v1/EventService/Events",
        )
        .await
        .unwrap();
}

#[actix_web::test]
async fn refused_connection_is_unavailable() {
    // Nothing listens on the discard port.
    let err = client().probe_status("127.0.0.1:9").await.unwrap_err();
    assert!(matches!(err, AggregatorError::Unavailable(_)));
}

#[actix_web::test]
async fn undecodable_status_body_is_protocol_error() {
    let address = start_malformed_stub();
    let err = client().probe_status(&address).await.unwrap_err();
    assert!(matches!(err, AggregatorError::Protocol(_)));
}

#[actix_web::test]
async fn undecodable_manager_body_is_protocol_error() {
    let address = start_malformed_stub();
    let err = client()
        .fetch_manager_info(&address, &ContactCredentials::Token("t".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AggregatorError::Protocol(_)));
}
