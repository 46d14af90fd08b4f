
use fixtures::*;

use omacp::{CharacteristicType, ParameterType, ProvisioningContext, parse_document};
use omacp::context::Connectoid;
use pretty_assertions::assert_eq;

fn document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><wap-provisioningdoc version="1.0">{}</wap-provisioningdoc>"#,
        body
    )
}

fn napdef(id: &str) -> String {
    format!(
        r#"<characteristic type="NAPDEF">
             <parm name="NAPID" value="{id}"/>
             <parm name="NAME" value="Access {id}"/>
             <parm name="NAP-ADDRESS" value="{id}.example.com"/>
             <parm name="BEARER" value="GSM-GPRS"/>
           </characteristic>"#
    )
}

fn proxy(id: &str, physical_id: &str, port: u32) -> String {
    format!(
        r#"<characteristic type="PXLOGICAL">
             <parm name="PROXY-ID" value="{id}"/>
             <parm name="NAME" value="Proxy {id}"/>
             <characteristic type="PORT"><parm name="PORTNBR" value="{port}"/></characteristic>
             <characteristic type="PXPHYSICAL">
               <parm name="PHYSICAL-PROXY-ID" value="{physical_id}"/>
               <parm name="PXADDR" value="10.0.0.1"/>
               <parm name="TO-NAPID" value="n1"/>
             </characteristic>
           </characteristic>"#
    )
}

fn ports(node: &omacp::Characteristic) -> Vec<u32> {
    let mut ports: Vec<u32> = node
        .children_of(CharacteristicType::Port)
        .filter_map(|p| p.uint(ParameterType::PortNbr))
        .collect();
    ports.sort_unstable();
    ports
}

#[test]
fn test_application_resolves_its_access_point() {
    ensure_env_logger_initialized();
    let markup = document(&format!(
        r#"{}<characteristic type="APPLICATION">
             <parm name="APPID" value="w4"/>
             <parm name="ADDR" value="http://mms.example.com"/>
             <parm name="TO-NAPID" value="n1"/>
           </characteristic>"#,
        napdef("n1")
    ));

    let tree = parse_document(markup.as_bytes()).unwrap();
    let context = ProvisioningContext::new(&tree).unwrap();

    assert_eq!(context.napdefs().len(), 1);
    assert_eq!(context.applications().len(), 1);

    let omacp::context::Application::Mms(mms) = &context.applications()[0] else {
        panic!("expected an MMS application");
    };
    let Connectoid::Napdef(id) = mms.connectoids[0] else {
        panic!("expected a napdef connectoid");
    };
    assert_eq!(context.napdef(id).unwrap().id, "n1");
}

#[test]
fn test_duplicate_proxies_merge_in_any_order() {
    ensure_env_logger_initialized();
    let first = proxy("p1", "a", 80);
    let second = proxy("p1", "b", 8080);

    for (x, y) in [(&first, &second), (&second, &first)] {
        let markup = document(&format!("{}{}{}", napdef("n1"), x, y));
        let tree = parse_document(markup.as_bytes()).unwrap();

        let proxies: Vec<_> = tree.children_of(CharacteristicType::PxLogical).collect();
        assert_eq!(proxies.len(), 1);
        assert_eq!(ports(proxies[0]), vec![80, 8080]);
        assert_eq!(
            proxies[0].children_of(CharacteristicType::PxPhysical).count(),
            2
        );
    }
}

#[test]
fn test_duplicate_napdef_keeps_first() {
    ensure_env_logger_initialized();
    let duplicate = r#"<characteristic type="NAPDEF">
             <parm name="NAPID" value="n1"/>
             <parm name="NAME" value="Second"/>
             <parm name="NAP-ADDRESS" value="second.example.com"/>
             <parm name="BEARER" value="GSM-CSD"/>
           </characteristic>"#;
    let markup = document(&format!(
        r#"{}{}<characteristic type="APPLICATION">
             <parm name="APPID" value="w2"/>
             <parm name="TO-NAPID" value="n1"/>
             <parm name="TO-NAPID" value="gone"/>
           </characteristic>"#,
        napdef("n1"),
        duplicate
    ));

    let tree = parse_document(markup.as_bytes()).unwrap();
    let napdefs: Vec<_> = tree.children_of(CharacteristicType::Napdef).collect();
    assert_eq!(napdefs.len(), 1);
    assert_eq!(napdefs[0].text(ParameterType::Name), Some("Access n1"));

    let application = tree.child(CharacteristicType::Application).unwrap();
    let references: Vec<_> = application
        .params_of(ParameterType::ToNapid)
        .filter_map(|p| p.text())
        .collect();
    assert_eq!(references, vec!["n1"]);
}

#[test]
fn test_smtp_without_from_is_dropped() {
    ensure_env_logger_initialized();
    let markup = document(&format!(
        r#"{}<characteristic type="APPLICATION">
             <parm name="APPID" value="25"/>
             <parm name="TO-NAPID" value="n1"/>
             <characteristic type="APPADDR">
               <parm name="ADDR" value="smtp.example.com"/>
               <characteristic type="PORT"><parm name="PORTNBR" value="25"/></characteristic>
             </characteristic>
           </characteristic>
           <characteristic type="APPLICATION">
             <parm name="APPID" value="w2"/>
             <parm name="TO-NAPID" value="n1"/>
           </characteristic>"#,
        napdef("n1")
    ));

    let tree = parse_document(markup.as_bytes()).unwrap();
    let applications: Vec<_> = tree.children_of(CharacteristicType::Application).collect();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].text(ParameterType::AppId), Some("w2"));
}

#[test]
fn test_unsupported_version_is_corrupt() {
    let markup = format!(
        r#"<wap-provisioningdoc version="2.0">{}</wap-provisioningdoc>"#,
        napdef("n1")
    );
    assert!(parse_document(markup.as_bytes()).unwrap_err().is_corrupt());
}

#[test]
fn test_unknown_characteristic_hides_its_subtree() {
    ensure_env_logger_initialized();
    let markup = document(&format!(
        r#"{}<characteristic type="UNKNOWN">{}</characteristic>"#,
        napdef("n1"),
        napdef("n2")
    ));

    let tree = parse_document(markup.as_bytes()).unwrap();
    let napids: Vec<_> = tree
        .children_of(CharacteristicType::Napdef)
        .filter_map(|n| n.text(ParameterType::NapId))
        .collect();
    assert_eq!(napids, vec!["n1"]);
}

#[test]
fn test_document_without_valid_settings_is_corrupt() {
    let markup = document(
        r#"<characteristic type="NAPDEF"><parm name="NAPID" value="n1"/></characteristic>"#,
    );
    assert!(parse_document(markup.as_bytes()).unwrap_err().is_corrupt());
    assert!(parse_document(b"<wap-provisioningdoc").unwrap_err().is_corrupt());
    assert!(parse_document(b"").unwrap_err().is_corrupt());
}

#[test]
fn test_samples_parse() {
    ensure_env_logger_initialized();
    for sample in [
        browser_and_mms_sample(),
        email_sample(),
        omadm_session_sample(),
    ] {
        let tree = parse_document(&read_sample(sample.clone()));
        assert!(tree.is_ok(), "{} failed: {:?}", sample.display(), tree.err());
    }
}
