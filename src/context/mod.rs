//! The typed provisioning model built from a validated document tree.

mod analysis;
mod builder;
pub mod model;

use log::debug;
use serde::Serialize;

pub use self::analysis::{Analysis, ProvisionedSet};
use self::builder::ContextBuilder;
pub use self::model::{Application, Connectoid, Napdef, NapdefId, Proxy, ProxyId};
use crate::characteristic::{Characteristic, CharacteristicType};
use crate::err::{ProvisioningError, Result};

/// Access points, proxies and applications of one provisioning document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningContext {
    napdefs: Vec<Napdef>,
    proxies: Vec<Proxy>,
    applications: Vec<Application>,
}

impl ProvisioningContext {
    /// Build the model from the root of a validated document.
    ///
    /// Access points are mapped first, then proxies, then applications in document order, with
    /// email accounts last once incoming and outgoing servers have been paired.
    pub fn new(root: &Characteristic) -> Result<Self> {
        if root.kind() != CharacteristicType::Root {
            return Err(ProvisioningError::corrupt(format!(
                "cannot build a model from a {} characteristic",
                root.kind()
            )));
        }

        let context = ContextBuilder::new().build(root);
        debug!("provisioning context: {:#?}", context);
        Ok(context)
    }

    pub fn napdefs(&self) -> &[Napdef] {
        &self.napdefs
    }

    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn napdef(&self, id: NapdefId) -> Option<&Napdef> {
        self.napdefs.get(id.0)
    }

    pub fn proxy(&self, id: ProxyId) -> Option<&Proxy> {
        self.proxies.get(id.0)
    }

    /// Summarise what the document provisions.
    pub fn analyse(&self) -> Analysis {
        let mut provisioned = ProvisionedSet::empty();
        if !self.napdefs.is_empty() {
            provisioned |= ProvisionedSet::CONNECTION_PROFILE;
        }
        if !self.proxies.is_empty() {
            provisioned |= ProvisionedSet::PROXY;
        }

        let mut dm_sessions = Vec::new();
        for application in &self.applications {
            provisioned |= application.provisioned_type();
            if let Application::Omadm(omadm) = application {
                if omadm.init {
                    if let Some(server_id) = &omadm.syncml.server_id {
                        dm_sessions.push(server_id.clone());
                    }
                }
            }
        }

        Analysis {
            provisioned,
            dm_sessions,
        }
    }
}

/// Build the model of a validated document and analyse it.
pub fn build_model(
    tree: &Characteristic,
) -> Result<(ProvisioningContext, ProvisionedSet, Vec<String>)> {
    let context = ProvisioningContext::new(tree)?;
    let Analysis {
        provisioned,
        dm_sessions,
    } = context.analyse();
    Ok((context, provisioned, dm_sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristic::parse_document;
    use crate::context::model::{EmailServerType, SyncType, SyncmlAuthType};
    use pretty_assertions::assert_eq;

    fn context(body: &str) -> ProvisioningContext {
        crate::ensure_env_logger_initialized();
        let markup = format!(
            r#"<wap-provisioningdoc version="1.0">{}</wap-provisioningdoc>"#,
            body
        );
        let tree = parse_document(markup.as_bytes()).unwrap();
        ProvisioningContext::new(&tree).unwrap()
    }

    const NAPDEF: &str = r#"
        <characteristic type="NAPDEF">
          <parm name="NAPID" value="n1"/>
          <parm name="NAME" value="Internet"/>
          <parm name="NAP-ADDRESS" value="internet.example"/>
          <parm name="NAP-ADDRTYPE" value="apn"/>
          <parm name="BEARER" value="GSM-GPRS"/>
          <parm name="DNS-ADDR" value="10.0.0.53"/>
          <characteristic type="NAPAUTHINFO">
            <parm name="AUTHTYPE" value="PAP"/>
            <parm name="AUTHNAME" value="user"/>
            <parm name="AUTHSECRET" value="secret"/>
          </characteristic>
          <characteristic type="NAPAUTHINFO">
            <parm name="AUTHTYPE" value="MS-CHAP"/>
          </characteristic>
        </characteristic>"#;

    fn email_app(app_id: &str, extra: &str, port: u32, service: &str) -> String {
        format!(
            r#"<characteristic type="APPLICATION">
                 <parm name="APPID" value="{app_id}"/>
                 <parm name="TO-NAPID" value="n1"/>
                 {extra}
                 <characteristic type="APPADDR">
                   <parm name="ADDR" value="mail{app_id}.example"/>
                   <characteristic type="PORT">
                     <parm name="PORTNBR" value="{port}"/>
                     <parm name="SERVICE" value="{service}"/>
                   </characteristic>
                 </characteristic>
               </characteristic>"#
        )
    }

    #[test]
    fn test_napdef_mapping() {
        let context = context(NAPDEF);
        assert_eq!(context.napdefs().len(), 1);

        let napdef = &context.napdefs()[0];
        assert_eq!(napdef.id, "n1");
        assert_eq!(napdef.bearer, model::Bearer::GsmGprs);
        assert_eq!(napdef.address_type, model::NapAddressType::Apn);
        assert_eq!(napdef.dns_addresses, vec!["10.0.0.53"]);
        assert_eq!(napdef.credentials.len(), 1);
        assert_eq!(napdef.credentials[0].auth_id.as_deref(), Some("user"));
        assert!(!napdef.generic);
    }

    #[test]
    fn test_proxy_mapping_resolves_napdefs() {
        let context = context(&format!(
            r#"{NAPDEF}
               <characteristic type="PXLOGICAL">
                 <parm name="PROXY-ID" value="p1"/>
                 <parm name="NAME" value="Proxy"/>
                 <parm name="STARTPAGE" value="http://start.example"/>
                 <characteristic type="PXAUTHINFO">
                   <parm name="PXAUTH-TYPE" value="http-basic"/>
                   <parm name="PXAUTH-ID" value="pxuser"/>
                 </characteristic>
                 <characteristic type="PXPHYSICAL">
                   <parm name="PHYSICAL-PROXY-ID" value="ph1"/>
                   <parm name="PXADDR" value="10.0.0.8"/>
                   <parm name="TO-NAPID" value="n1"/>
                   <characteristic type="PORT">
                     <parm name="PORTNBR" value="8080"/>
                     <parm name="SERVICE" value="HTTP"/>
                   </characteristic>
                 </characteristic>
               </characteristic>"#
        ));

        let proxy = context.proxy(ProxyId(0)).unwrap();
        assert_eq!(proxy.id, "p1");
        assert_eq!(proxy.auth_type, model::ProxyAuthType::HttpBasic);
        assert_eq!(proxy.auth_id.as_deref(), Some("pxuser"));
        assert_eq!(proxy.start_page.as_deref(), Some("http://start.example"));

        let physical = &proxy.physical_proxies[0];
        assert_eq!(physical.address_type, model::ProxyAddressType::Ipv4);
        assert_eq!(physical.napdefs, vec![Connectoid::Napdef(NapdefId(0))]);
        assert_eq!(
            physical.ports,
            vec![model::Port {
                number: 8080,
                service: model::PortService::Http
            }]
        );
    }

    #[test]
    fn test_email_accounts_pair_by_provider_id() {
        let context = context(&format!(
            "{NAPDEF}{}{}{}",
            email_app(
                "110",
                r#"<parm name="PROVIDER-ID" value="acc1"/><parm name="NAME" value="Work"/>"#,
                995,
                "995"
            ),
            email_app(
                "143",
                r#"<parm name="PROVIDER-ID" value="acc2"/>"#,
                143,
                "143"
            ),
            email_app(
                "25",
                r#"<parm name="PROVIDER-ID" value="acc1"/><parm name="FROM" value="me@example.com"/>"#,
                465,
                "465"
            ),
        ));

        let emails: Vec<_> = context
            .applications()
            .iter()
            .filter_map(|app| match app {
                Application::Email(email) => Some(email),
                _ => None,
            })
            .collect();
        assert_eq!(emails.len(), 2);

        let work = emails[0];
        assert_eq!(work.name.as_deref(), Some("Work"));
        assert_eq!(work.email_address.as_deref(), Some("me@example.com"));
        let incoming = work.incoming.as_ref().unwrap();
        assert_eq!(incoming.server_type, EmailServerType::Pop);
        assert_eq!(incoming.server_port, 995);
        assert!(incoming.use_ssl);
        let outgoing = work.outgoing.as_ref().unwrap();
        assert_eq!(outgoing.server_type, EmailServerType::Smtp);
        assert_eq!(outgoing.server_address.as_deref(), Some("mail25.example"));
        assert!(outgoing.use_ssl);

        let other = emails[1];
        assert_eq!(other.id.as_deref(), Some("acc2"));
        assert_eq!(other.incoming.as_ref().unwrap().server_type, EmailServerType::Imap);
        assert!(!other.incoming.as_ref().unwrap().use_ssl);
        assert!(other.outgoing.is_none());
    }

    #[test]
    fn test_email_accounts_without_provider_id_pair_in_order() {
        let context = context(&format!(
            "{NAPDEF}{}{}",
            email_app("143", "", 143, "143"),
            email_app("25", r#"<parm name="FROM" value="me@example.com"/>"#, 25, "25"),
        ));

        assert_eq!(context.applications().len(), 1);
        let Application::Email(email) = &context.applications()[0] else {
            panic!("expected an email account");
        };
        assert!(email.incoming.is_some());
        assert!(email.outgoing.is_some());
    }

    #[test]
    fn test_syncml_credentials_are_routed_by_level() {
        let context = context(&format!(
            r#"{NAPDEF}
               <characteristic type="APPLICATION">
                 <parm name="APPID" value="w5"/>
                 <parm name="PROVIDER-ID" value="ds1"/>
                 <parm name="ADDR" value="http://ds.example/sync"/>
                 <parm name="TO-NAPID" value="n1"/>
                 <characteristic type="APPAUTH">
                   <parm name="AAUTHLEVEL" value="APPSRV"/>
                   <parm name="AAUTHTYPE" value="DIGEST"/>
                   <parm name="AAUTHNAME" value="server"/>
                   <parm name="AAUTHDATA" value="nonce"/>
                 </characteristic>
                 <characteristic type="APPAUTH">
                   <parm name="AAUTHLEVEL" value="CLIENT"/>
                   <parm name="AAUTHTYPE" value="BASIC"/>
                   <parm name="AAUTHNAME" value="client"/>
                   <parm name="AAUTHSECRET" value="pw"/>
                 </characteristic>
                 <characteristic type="APPAUTH">
                   <parm name="AAUTHTYPE" value="HTTP-BASIC"/>
                 </characteristic>
                 <characteristic type="RESOURCE">
                   <parm name="URI" value="./contacts"/>
                   <parm name="NAME" value="Contacts"/>
                   <parm name="AACCEPT" value="text/x-vcard"/>
                   <parm name="SYNCTYPE" value="2"/>
                 </characteristic>
               </characteristic>"#
        ));

        let Application::Omads(omads) = &context.applications()[0] else {
            panic!("expected a data sync account");
        };
        let syncml = &omads.syncml;
        assert_eq!(syncml.server_id.as_deref(), Some("ds1"));
        assert_eq!(syncml.address.as_deref(), Some("http://ds.example/sync"));
        assert_eq!(syncml.server_credentials.auth_type, SyncmlAuthType::Digest);
        assert_eq!(syncml.server_credentials.nonce.as_deref(), Some("nonce"));
        assert_eq!(syncml.client_credentials.password.as_deref(), Some("pw"));
        assert_eq!(syncml.http_credentials.auth_type, SyncmlAuthType::HttpBasic);
        assert_eq!(syncml.connectoids, vec![Connectoid::Napdef(NapdefId(0))]);

        assert_eq!(omads.dbs.len(), 1);
        assert_eq!(omads.dbs[0].sync_type, SyncType::TwoWay);
        assert_eq!(omads.dbs[0].accept_types.as_deref(), Some("text/x-vcard"));
    }

    #[test]
    fn test_browser_bookmarks_and_start_page() {
        let context = context(&format!(
            r#"{NAPDEF}
               <characteristic type="APPLICATION">
                 <parm name="APPID" value="w2"/>
                 <parm name="NAME" value="Browser"/>
                 <parm name="TO-NAPID" value="INTERNET"/>
                 <characteristic type="RESOURCE">
                   <parm name="URI" value="http://a.example"/>
                   <parm name="NAME" value="A"/>
                 </characteristic>
                 <characteristic type="RESOURCE">
                   <parm name="URI" value="http://b.example"/>
                   <parm name="STARTPAGE"/>
                 </characteristic>
               </characteristic>"#
        ));

        let Application::Browser(browser) = &context.applications()[0] else {
            panic!("expected a browser");
        };
        assert_eq!(browser.bookmarks.len(), 2);
        assert_eq!(browser.start_page, Some(1));
        assert_eq!(browser.connectoids, vec![Connectoid::Internet]);
    }

    #[test]
    fn test_analysis_reports_dm_sessions() {
        let context = context(&format!(
            r#"{NAPDEF}
               <characteristic type="APPLICATION">
                 <parm name="APPID" value="w7"/>
                 <parm name="PROVIDER-ID" value="dm.example"/>
                 <parm name="ADDR" value="https://dm.example/manage"/>
                 <parm name="INIT"/>
               </characteristic>
               <characteristic type="APPLICATION">
                 <parm name="APPID" value="w7"/>
                 <parm name="PROVIDER-ID" value="dm2.example"/>
                 <parm name="ADDR" value="https://dm2.example/manage"/>
               </characteristic>"#
        ));

        let analysis = context.analyse();
        assert_eq!(
            analysis.provisioned,
            ProvisionedSet::CONNECTION_PROFILE | ProvisionedSet::OMADM
        );
        assert_eq!(analysis.dm_sessions, vec!["dm.example"]);

        let Application::Omadm(dm) = &context.applications()[0] else {
            panic!("expected a device management account");
        };
        // Unlinked applications are bound to every access point.
        assert_eq!(dm.syncml.connectoids, vec![Connectoid::Napdef(NapdefId(0))]);
    }

    #[test]
    fn test_model_needs_a_root() {
        let node = Characteristic::new(CharacteristicType::Napdef);
        assert!(ProvisioningContext::new(&node).unwrap_err().is_corrupt());
    }
}
