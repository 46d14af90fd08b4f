
use fixtures::*;

use omacp::context::model::{
    Application, EmailAuthType, EmailServerType, NapAddressType, ProxyAddressType, SyncType,
    SyncmlAuthType,
};
use omacp::context::{Connectoid, NapdefId, ProxyId};
use omacp::{ProvisionedSet, build_model, parse_document};
use pretty_assertions::assert_eq;

#[test]
fn test_browser_and_mms_model() {
    ensure_env_logger_initialized();
    let tree = parse_document(&read_sample(browser_and_mms_sample())).unwrap();
    let (context, provisioned, dm_sessions) = build_model(&tree).unwrap();

    insta::assert_json_snapshot!(provisioned, @r###"
    [
      "proxy",
      "apn",
      "bookmarks",
      "mms"
    ]
    "###);
    assert!(dm_sessions.is_empty());

    let napdef = &context.napdefs()[0];
    assert_eq!(napdef.address_type, NapAddressType::Apn);
    assert_eq!(napdef.credentials.len(), 1);
    assert_eq!(napdef.credentials[0].auth_id.as_deref(), Some("wap"));

    let proxy = &context.proxies()[0];
    assert_eq!(proxy.start_page.as_deref(), Some("http://wap.example.com/"));
    let physical = &proxy.physical_proxies[0];
    assert_eq!(physical.address_type, ProxyAddressType::Ipv4);
    assert_eq!(physical.napdefs, vec![Connectoid::Napdef(NapdefId(0))]);
    assert_eq!(physical.ports[0].number, 8080);

    let [Application::Browser(browser), Application::Mms(mms)] = context.applications() else {
        panic!("unexpected applications: {:?}", context.applications());
    };
    assert_eq!(browser.start_page, Some(0));
    assert_eq!(browser.bookmarks[1].name.as_deref(), Some("News"));
    assert_eq!(browser.connectoids, vec![Connectoid::Proxy(ProxyId(0))]);
    assert_eq!(mms.mmsc.as_deref(), Some("http://mms.example.com/"));
}

#[test]
fn test_email_accounts_are_paired() {
    ensure_env_logger_initialized();
    let tree = parse_document(&read_sample(email_sample())).unwrap();
    let (context, provisioned, _) = build_model(&tree).unwrap();

    assert_eq!(
        provisioned,
        ProvisionedSet::CONNECTION_PROFILE | ProvisionedSet::EMAIL
    );
    assert!(context.napdefs()[0].generic);

    let [Application::Email(email)] = context.applications() else {
        panic!("unexpected applications: {:?}", context.applications());
    };
    assert_eq!(email.name.as_deref(), Some("Work mail"));
    assert_eq!(email.id.as_deref(), Some("work"));
    assert_eq!(email.email_address.as_deref(), Some("alice@example.com"));

    let incoming = email.incoming.as_ref().unwrap();
    assert_eq!(incoming.server_type, EmailServerType::Imap);
    assert_eq!(incoming.server_address.as_deref(), Some("imap.example.com"));
    assert_eq!(incoming.server_port, 993);
    assert!(incoming.use_ssl);
    assert_eq!(incoming.auth_type, EmailAuthType::Login);
    assert_eq!(incoming.user_name.as_deref(), Some("alice"));

    let outgoing = email.outgoing.as_ref().unwrap();
    assert_eq!(outgoing.server_type, EmailServerType::Smtp);
    assert_eq!(outgoing.server_port, 587);
    assert!(!outgoing.use_ssl);
}

#[test]
fn test_dm_session_and_sync_databases() {
    ensure_env_logger_initialized();
    let tree = parse_document(&read_sample(omadm_session_sample())).unwrap();
    let (context, provisioned, dm_sessions) = build_model(&tree).unwrap();

    insta::assert_json_snapshot!(context.analyse(), @r###"
    {
      "provisioned": [
        "apn",
        "omads",
        "omadm"
      ],
      "dm_sessions": [
        "dm.example.com"
      ]
    }
    "###);
    assert_eq!(dm_sessions, vec!["dm.example.com".to_owned()]);
    assert!(provisioned.contains(ProvisionedSet::OMADM));

    let [Application::Omadm(omadm), Application::Omads(omads)] = context.applications() else {
        panic!("unexpected applications: {:?}", context.applications());
    };

    assert!(omadm.init);
    assert_eq!(
        omadm.syncml.address.as_deref(),
        Some("https://dm.example.com/manage")
    );
    assert_eq!(omadm.syncml.port, 443);
    // bound to the only access point since it names none
    assert_eq!(omadm.syncml.connectoids, vec![Connectoid::Napdef(NapdefId(0))]);
    assert_eq!(
        omadm.syncml.server_credentials.auth_type,
        SyncmlAuthType::Digest
    );
    assert_eq!(
        omadm.syncml.client_credentials.user_name.as_deref(),
        Some("device")
    );
    assert!(!omadm.syncml.http_credentials.auth_type.is_set());

    assert_eq!(omads.dbs.len(), 1);
    assert_eq!(omads.dbs[0].sync_type, SyncType::TwoWay);
    assert_eq!(omads.dbs[0].accept_types.as_deref(), Some("text/x-vcard"));
}
