#![allow(clippy::unwrap_used)]
// Integration tests for object operations using wiremock.

use std::time::{Duration, Instant};

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panos_api::xpath::{DEVICE, VSYS};
use panos_api::{
    Address, AddressGroupKind, AddressKind, Category, Error, Protocol, Scope, Service, Session,
    TagColor,
};

const KEY: &str = "LUFRPT1TEST=";
const OK: &str = r#"<response status="success" code="20"><msg>command succeeded</msg></response>"#;

// ── Helpers ─────────────────────────────────────────────────────────

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body)
}

fn listing(container: &str, entries: &str) -> ResponseTemplate {
    xml(&format!(
        r#"<response status="success"><result total-count="1" count="1"><{container}>{entries}</{container}></result></response>"#
    ))
}

fn empty_listing() -> ResponseTemplate {
    xml(r#"<response status="success"><result total-count="0" count="0"/></response>"#)
}

/// Connect to a mock device: `family` is the reported platform family,
/// `managed` whether a Panorama connection is reported.
async fn setup(family: &str, managed: bool) -> (MockServer, Session) {
    let server = MockServer::start().await;

    Mock::given(query_param("type", "keygen"))
        .respond_with(xml(&format!(
            r#"<response status="success"><result><key>{KEY}</key></result></response>"#
        )))
        .mount(&server)
        .await;
    Mock::given(query_param("cmd", "<show><system><info></info></system></show>"))
        .respond_with(xml(&format!(
            r#"<response status="success"><result><system><model>lab</model><serial>0001</serial><sw-version>11.0.2</sw-version><platform-family>{family}</platform-family></system></result></response>"#
        )))
        .mount(&server)
        .await;
    let status = if managed { "yes" } else { "no" };
    Mock::given(query_param("cmd", "<show><panorama-status></panorama-status></show>"))
        .respond_with(xml(&format!(
            "<response status=\"success\"><result><![CDATA[Panorama Server 1 : 10.0.0.9\n Connected : {status}\n]]></result></response>"
        )))
        .mount(&server)
        .await;

    let api_url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    let password = SecretString::from("secret".to_owned());
    let session = Session::connect_with(reqwest::Client::new(), api_url, "admin", &password)
        .await
        .unwrap();
    (server, session)
}

async fn firewall() -> (MockServer, Session) {
    setup("vm", false).await
}

async fn panorama() -> (MockServer, Session) {
    setup("m", false).await
}

fn device_group(group: &str) -> String {
    format!("{DEVICE}/device-group/entry[@name='{group}']")
}

/// Fails the test on drop if any config request reaches the server.
async fn forbid_config_requests(server: &MockServer) {
    Mock::given(query_param("type", "config"))
        .respond_with(xml(OK))
        .expect(0)
        .mount(server)
        .await;
}

// ── Address objects ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_address_on_firewall() {
    let (server, session) = firewall().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(query_param("type", "config"))
        .and(query_param("action", "set"))
        .and(query_param(
            "xpath",
            format!("{VSYS}/address/entry[@name='srv1']"),
        ))
        .and(query_param("element", "<ip-netmask>10.0.0.5/32</ip-netmask>"))
        .and(query_param("key", KEY))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    let address = Address::new("srv1", AddressKind::IpNetmask, "10.0.0.5/32");
    session.create_address(&address, &Scope::Local).await.unwrap();
}

#[tokio::test]
async fn test_create_address_twice_sends_two_sets() {
    let (server, session) = firewall().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param(
            "xpath",
            format!("{VSYS}/address/entry[@name='srv1']"),
        ))
        .respond_with(xml(OK))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(query_param("action", "get"))
        .respond_with(empty_listing())
        .expect(0)
        .mount(&server)
        .await;

    let address = Address::new("srv1", AddressKind::IpNetmask, "10.0.0.5/32");
    session.create_address(&address, &Scope::Local).await.unwrap();
    session.create_address(&address, &Scope::Local).await.unwrap();
}

#[tokio::test]
async fn test_create_address_on_panorama_needs_device_group() {
    let (server, session) = panorama().await;
    forbid_config_requests(&server).await;

    let address = Address::new("srv1", AddressKind::IpNetmask, "10.0.0.5/32");
    let result = session.create_address(&address, &Scope::Local).await;

    assert!(
        matches!(&result, Err(Error::Config(msg)) if msg == "device-group required"),
        "expected Config error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_create_address_in_device_group() {
    let (server, session) = panorama().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param(
            "xpath",
            format!("{}/address/entry[@name='web']", device_group("branch")),
        ))
        .and(query_param(
            "element",
            "<fqdn>www.example.com</fqdn><description>public site</description>",
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    let address = Address::new("web", AddressKind::Fqdn, "www.example.com")
        .with_description("public site");
    session
        .create_address(&address, &Scope::device_group("branch"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_address() {
    let (server, session) = firewall().await;

    Mock::given(method("GET"))
        .and(query_param("action", "delete"))
        .and(query_param(
            "xpath",
            format!("{VSYS}/address/entry[@name='gone']"),
        ))
        .respond_with(xml(
            r#"<response status="error" code="7"><msg><line>No such node</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let err = session
        .delete_address("gone", &Scope::Local)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        Error::Operation {
            code,
            message,
            detail,
        } => {
            assert_eq!(code, "7");
            assert!(message.contains("Object not present"));
            assert_eq!(detail.as_deref(), Some("No such node"));
        }
        other => panic!("expected Operation error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_addresses_on_managed_firewall() {
    let (server, session) = setup("vm", true).await;

    Mock::given(method("GET"))
        .and(query_param("action", "get"))
        .and(query_param("xpath", "/config/panorama//address"))
        .respond_with(xml(
            r#"<response status="success"><result total-count="2" count="2">
                <address><entry name="srv1"><ip-netmask>10.0.0.5/32</ip-netmask><tag><member>prod</member></tag></entry></address>
                <address><entry name="pool"><ip-range>10.0.1.1-10.0.1.50</ip-range><description>dhcp</description></entry></address>
            </result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let addresses = session.addresses(&Scope::Local).await.unwrap();

    assert_eq!(
        addresses,
        vec![
            Address::new("srv1", AddressKind::IpNetmask, "10.0.0.5/32").with_tags(["prod"]),
            Address::new("pool", AddressKind::IpRange, "10.0.1.1-10.0.1.50")
                .with_description("dhcp"),
        ]
    );
}

#[tokio::test]
async fn test_list_shared_addresses_on_firewall_is_config_error() {
    let (server, session) = firewall().await;
    forbid_config_requests(&server).await;

    let result = session.addresses(&Scope::Shared).await;
    assert!(matches!(result, Err(Error::Config(_))), "got: {result:?}");
}

// ── Groups and services ─────────────────────────────────────────────

#[tokio::test]
async fn test_create_static_group() {
    let (server, session) = panorama().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param("xpath", "/config/shared/address-group/entry[@name='web']"))
        .and(query_param(
            "element",
            "<static><member>web1</member><member>web2</member></static><description>front end</description>",
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    session
        .create_static_group("web", &["web1", "web2"], Some("front end"), &Scope::Shared)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_static_group_without_members() {
    let (server, session) = firewall().await;
    forbid_config_requests(&server).await;

    let result = session
        .create_static_group("web", &[], None, &Scope::Local)
        .await;
    assert!(matches!(result, Err(Error::Config(_))), "got: {result:?}");
}

#[tokio::test]
async fn test_list_dynamic_groups() {
    let (server, session) = firewall().await;

    Mock::given(query_param("xpath", format!("{VSYS}/address-group")))
        .respond_with(listing(
            "address-group",
            r#"<entry name="prod-web"><dynamic><filter>'web' and 'prod'</filter></dynamic></entry>"#,
        ))
        .mount(&server)
        .await;

    let groups = session.address_groups(&Scope::Local).await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].kind,
        AddressGroupKind::Dynamic {
            filter: "'web' and 'prod'".into()
        }
    );
}

#[tokio::test]
async fn test_create_service() {
    let (server, session) = firewall().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param("xpath", format!("{VSYS}/service/entry[@name='dns-tcp']")))
        .and(query_param(
            "element",
            "<protocol><tcp><port>53</port></tcp></protocol>",
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    let service = Service::new("dns-tcp", Protocol::Tcp, "53");
    session.create_service(&service, &Scope::Local).await.unwrap();
}

// ── Tags ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_tag() {
    let (server, session) = firewall().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param("xpath", format!("{VSYS}/tag/entry[@name='prod']")))
        .and(query_param(
            "element",
            "<color>color1</color><comments>production</comments>",
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    session
        .create_tag("prod", Some(TagColor::Red), Some("production"), &Scope::Local)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_apply_tags_searches_in_order() {
    let (server, session) = firewall().await;

    Mock::given(query_param("xpath", format!("{VSYS}/address")))
        .respond_with(listing(
            "address",
            r#"<entry name="other"><ip-netmask>10.0.0.1</ip-netmask></entry>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(query_param("xpath", format!("{VSYS}/address-group")))
        .respond_with(listing(
            "address-group",
            r#"<entry name="web"><static><member>other</member></static></entry>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(query_param("xpath", format!("{VSYS}/service")))
        .respond_with(listing(
            "service",
            r#"<entry name="web"><protocol><tcp><port>80</port></tcp></protocol></entry>"#,
        ))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("action", "edit"))
        .and(query_param(
            "xpath",
            format!("{VSYS}/address-group/entry[@name='web']/tag"),
        ))
        .and(query_param(
            "element",
            "<tag><member>prod</member><member>web</member></tag>",
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    session
        .apply_tags(&["prod", "web"], "web", &Scope::Local)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_find_taggable_falls_through_to_service_group() {
    let (server, session) = firewall().await;

    for category in ["address", "address-group", "service"] {
        Mock::given(query_param("xpath", format!("{VSYS}/{category}")))
            .respond_with(empty_listing())
            .mount(&server)
            .await;
    }
    Mock::given(query_param("xpath", format!("{VSYS}/service-group")))
        .respond_with(listing(
            "service-group",
            r#"<entry name="web-ports"><members><member>service-http</member></members></entry>"#,
        ))
        .mount(&server)
        .await;

    let category = session
        .find_taggable("web-ports", &Scope::Local)
        .await
        .unwrap();
    assert_eq!(category, Category::ServiceGroup);
}

#[tokio::test]
async fn test_apply_tags_to_unknown_object() {
    let (server, session) = firewall().await;

    Mock::given(query_param("action", "get"))
        .respond_with(empty_listing())
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(query_param("action", "edit"))
        .respond_with(xml(OK))
        .expect(0)
        .mount(&server)
        .await;

    let result = session.apply_tags(&["prod"], "ghost", &Scope::Local).await;

    match result {
        Err(Error::NotFound { name }) => assert_eq!(name, "ghost"),
        other => panic!("expected NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_remove_tag() {
    let (server, session) = panorama().await;
    let group = device_group("branch");

    Mock::given(query_param("xpath", format!("{group}/address")))
        .respond_with(listing(
            "address",
            r#"<entry name="srv1"><ip-netmask>10.0.0.5</ip-netmask><tag><member>prod</member></tag></entry>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("action", "delete"))
        .and(query_param(
            "xpath",
            format!("{group}/address/entry[@name='srv1']/tag/member[text()='prod']"),
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    session
        .remove_tag("prod", "srv1", &Scope::device_group("branch"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_apply_tags_on_panorama_without_group() {
    let (server, session) = panorama().await;
    forbid_config_requests(&server).await;

    let result = session.apply_tags(&["prod"], "srv1", &Scope::Local).await;
    assert!(matches!(result, Err(Error::Config(_))), "got: {result:?}");
}

// ── Panorama devices ────────────────────────────────────────────────

#[tokio::test]
async fn test_add_device_to_group() {
    let (server, session) = panorama().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param("xpath", "/config/mgt-config/devices"))
        .and(query_param("element", r#"<entry name="007100001"/>"#))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param("xpath", device_group("branch")))
        .and(query_param(
            "element",
            r#"<devices><entry name="007100001"/></devices>"#,
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    session
        .add_device("007100001", Some("branch"))
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_add_device_stops_after_failed_registration() {
    let (server, session) = panorama().await;

    Mock::given(query_param("xpath", "/config/mgt-config/devices"))
        .respond_with(xml(
            r#"<response status="error" code="12"><msg>invalid serial</msg></response>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(query_param("xpath", device_group("branch")))
        .respond_with(xml(OK))
        .expect(0)
        .mount(&server)
        .await;

    let result = session.add_device("bogus", Some("branch")).await;
    assert_eq!(result.unwrap_err().api_error_code(), Some("12"));
}

#[tokio::test]
async fn test_remove_device_from_group_only() {
    let (server, session) = panorama().await;

    Mock::given(method("POST"))
        .and(query_param("action", "delete"))
        .and(query_param(
            "xpath",
            format!("{}/devices/entry[@name='007100001']", device_group("branch")),
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    session
        .remove_device("007100001", Some("branch"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_device_operations_require_panorama() {
    let (server, session) = firewall().await;
    forbid_config_requests(&server).await;

    assert!(matches!(session.devices().await, Err(Error::Config(_))));
    assert!(matches!(
        session.add_device("0071", None).await,
        Err(Error::Config(_))
    ));
    assert!(matches!(
        session.create_device_group("dg", None, &[]).await,
        Err(Error::Config(_))
    ));
    assert!(matches!(
        session.commit_all("dg", &[]).await,
        Err(Error::Config(_))
    ));
}

#[tokio::test]
async fn test_create_and_list_device_groups() {
    let (server, session) = panorama().await;

    Mock::given(method("POST"))
        .and(query_param("action", "set"))
        .and(query_param("xpath", format!("{DEVICE}/device-group")))
        .and(query_param(
            "element",
            r#"<entry name="branch"><devices><entry name="0071"/></devices><description>branch offices</description></entry>"#,
        ))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("xpath", "/config/devices/entry//device-group"))
        .respond_with(listing(
            "device-group",
            r#"<entry name="branch"><devices><entry name="0071"/></devices><description>branch offices</description></entry>"#,
        ))
        .mount(&server)
        .await;

    session
        .create_device_group("branch", Some("branch offices"), &["0071"])
        .await
        .unwrap();
    let groups = session.device_groups().await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "branch");
    assert_eq!(groups[0].devices, vec!["0071".to_owned()]);
}

#[tokio::test]
async fn test_set_panorama_server() {
    let (server, session) = firewall().await;

    Mock::given(method("POST"))
        .and(query_param("xpath", format!("{DEVICE}/deviceconfig/system")))
        .and(query_param("element", "<panorama-server>10.0.0.9</panorama-server>"))
        .respond_with(xml(OK))
        .expect(1)
        .mount(&server)
        .await;

    session.set_panorama_server("10.0.0.9").await.unwrap();
}

// ── Commits ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_commit() {
    let (server, session) = firewall().await;

    Mock::given(method("GET"))
        .and(query_param("type", "commit"))
        .and(query_param("cmd", "<commit></commit>"))
        .respond_with(xml(
            r#"<response status="success" code="19"><result><msg><line>Commit job enqueued with jobid 42</line></msg><job>42</job></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    session.commit().await.unwrap();
}

#[tokio::test]
async fn test_commit_all_to_selected_devices() {
    let (server, session) = panorama().await;

    Mock::given(method("GET"))
        .and(query_param("type", "commit"))
        .and(query_param("action", "all"))
        .and(query_param(
            "cmd",
            r#"<commit-all><shared-policy><device-group><name>branch</name><devices><entry name="0071"/></devices></device-group></shared-policy></commit-all>"#,
        ))
        .respond_with(xml(r#"<response status="success" code="19"><result><job>43</job></result></response>"#))
        .expect(1)
        .mount(&server)
        .await;

    session.commit_all("branch", &["0071"]).await.unwrap();
}

#[tokio::test]
async fn test_commit_rejected() {
    let (server, session) = firewall().await;

    Mock::given(query_param("type", "commit"))
        .respond_with(xml(
            r#"<response status="error" code="13"><msg><line>another commit is in progress</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    match session.commit().await {
        Err(Error::Operation { code, detail, .. }) => {
            assert_eq!(code, "13");
            assert_eq!(detail.as_deref(), Some("another commit is in progress"));
        }
        other => panic!("expected Operation error, got: {other:?}"),
    }
}
