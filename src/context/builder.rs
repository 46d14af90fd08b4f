//! Conversion of a validated document tree into the typed model.

use log::debug;

use super::ProvisioningContext;
use super::model::*;
use crate::characteristic::{
    AppId, Characteristic, CharacteristicType, INTERNET, Parameter, ParameterType,
};

/// Which half of an email account a node provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Incoming,
    Outgoing,
}

/// Incoming and outgoing email application nodes paired into one account.
#[derive(Debug, Default)]
struct EmailAccount<'a> {
    incoming: Option<&'a Characteristic>,
    outgoing: Option<&'a Characteristic>,
}

impl<'a> EmailAccount<'a> {
    fn new(side: Side, node: &'a Characteristic) -> Self {
        let mut account = EmailAccount::default();
        *account.slot(side).1 = Some(node);
        account
    }

    /// The opposite side and the slot for `side`.
    fn slot(&mut self, side: Side) -> (Option<&'a Characteristic>, &mut Option<&'a Characteristic>) {
        match side {
            Side::Incoming => (self.outgoing, &mut self.incoming),
            Side::Outgoing => (self.incoming, &mut self.outgoing),
        }
    }
}

fn same_provider(node: &Characteristic, provider_id: &Parameter) -> bool {
    node.param(ParameterType::ProviderId)
        .is_some_and(|id| id.same_value(provider_id))
}

/// Pair `node` with an existing account or start a new one.
fn add_email_node<'a>(accounts: &mut Vec<EmailAccount<'a>>, side: Side, node: &'a Characteristic) {
    let provider_id = node.param(ParameterType::ProviderId);

    for account in accounts.iter_mut() {
        let (opposite, slot) = account.slot(side);
        let Some(opposite) = opposite else {
            continue;
        };

        match (provider_id, *slot) {
            (Some(provider_id), Some(existing)) => {
                if same_provider(existing, provider_id) {
                    debug!("ignoring duplicate email server {:?}", provider_id.text());
                    return;
                }
            }
            (Some(provider_id), None) => {
                if same_provider(opposite, provider_id) {
                    *slot = Some(node);
                    return;
                }
            }
            (None, None) => {
                if !opposite.has_param(ParameterType::ProviderId) {
                    *slot = Some(node);
                    return;
                }
            }
            (None, Some(_)) => {}
        }
    }

    accounts.push(EmailAccount::new(side, node));
}

fn owned(text: Option<&str>) -> Option<String> {
    text.map(str::to_owned)
}

/// Address, port and first service of the first port of the first APPADDR. The ADDR parameter
/// of the application wins over the APPADDR address.
fn server_address(node: &Characteristic) -> (Option<&str>, u32, Option<&str>) {
    let app_addr = node.child(CharacteristicType::AppAddr);
    let address = node
        .text(ParameterType::Addr)
        .or_else(|| app_addr.and_then(|a| a.text(ParameterType::Addr)));

    let port = app_addr.and_then(|a| a.child(CharacteristicType::Port));
    let number = port
        .and_then(|p| p.uint(ParameterType::PortNbr))
        .unwrap_or(0);
    let service = port.and_then(|p| p.text(ParameterType::Service));

    (address, number, service)
}

pub(super) struct ContextBuilder {
    context: ProvisioningContext,
}

impl ContextBuilder {
    pub(super) fn new() -> Self {
        ContextBuilder {
            context: ProvisioningContext::default(),
        }
    }

    pub(super) fn build(mut self, root: &Characteristic) -> ProvisioningContext {
        for napdef in root.children_of(CharacteristicType::Napdef) {
            let napdef = self.map_napdef(napdef);
            self.context.napdefs.push(napdef);
        }

        for logical in root.children_of(CharacteristicType::PxLogical) {
            let proxy = self.map_proxy(logical);
            self.context.proxies.push(proxy);
        }

        let mut accounts = Vec::new();
        for app in root.children_of(CharacteristicType::Application) {
            let Some(app_id) = app.text(ParameterType::AppId).and_then(AppId::from_wire) else {
                continue;
            };

            let application = match app_id {
                AppId::Mms => Application::Mms(self.map_mms(app)),
                AppId::Pop3 | AppId::Imap4 => {
                    add_email_node(&mut accounts, Side::Incoming, app);
                    continue;
                }
                AppId::Smtp => {
                    add_email_node(&mut accounts, Side::Outgoing, app);
                    continue;
                }
                AppId::Omads => Application::Omads(self.map_omads(app)),
                AppId::Omadm => Application::Omadm(self.map_omadm(app)),
                AppId::Browser => Application::Browser(self.map_browser(app)),
                AppId::Imps | AppId::Omadl | AppId::Supl => continue,
            };
            self.context.applications.push(application);
        }

        for account in &accounts {
            let email = map_email(account);
            self.context.applications.push(Application::Email(email));
        }

        self.context
    }

    fn napdef_connectoid(&self, napid: &str) -> Option<Connectoid> {
        if napid == INTERNET {
            return Some(Connectoid::Internet);
        }
        self.context
            .napdefs
            .iter()
            .position(|napdef| napdef.id == napid)
            .map(|index| Connectoid::Napdef(NapdefId(index)))
    }

    fn proxy_connectoid(&self, proxy_id: &str) -> Option<Connectoid> {
        self.context
            .proxies
            .iter()
            .position(|proxy| proxy.id == proxy_id)
            .map(|index| Connectoid::Proxy(ProxyId(index)))
    }

    /// TO-NAPID and TO-PROXY references of `node`, in document order. Unknown ones are dropped.
    fn connectoids(&self, node: &Characteristic) -> Vec<Connectoid> {
        node.params()
            .iter()
            .filter_map(|param| {
                let target = param.text()?;
                let connectoid = match param.kind() {
                    ParameterType::ToNapid => self.napdef_connectoid(target),
                    ParameterType::ToProxy => self.proxy_connectoid(target),
                    _ => return None,
                };
                if connectoid.is_none() {
                    debug!("dropping unknown reference {}", param);
                }
                connectoid
            })
            .collect()
    }

    fn map_napdef(&self, node: &Characteristic) -> Napdef {
        let credentials = node
            .children_of(CharacteristicType::NapAuthInfo)
            .filter_map(|auth| {
                let auth_type = NapAuthType::from_text(auth.text(ParameterType::AuthType)?);
                if !auth_type.is_set() {
                    debug!("skipping NAPAUTHINFO with unknown auth type");
                    return None;
                }
                Some(NapCredentials {
                    auth_type,
                    auth_id: owned(auth.text(ParameterType::AuthName)),
                    auth_pw: owned(auth.text(ParameterType::AuthSecret)),
                })
            })
            .collect();

        Napdef {
            id: node.text(ParameterType::NapId).unwrap_or_default().to_owned(),
            name: owned(node.text(ParameterType::Name)),
            bearer: node
                .text(ParameterType::Bearer)
                .map(Bearer::from_text)
                .unwrap_or_default(),
            generic: node.has_param(ParameterType::Internet),
            address: owned(node.text(ParameterType::NapAddress)),
            address_type: node
                .text(ParameterType::NapAddrType)
                .map(NapAddressType::from_text)
                .unwrap_or_default(),
            local_address: owned(node.text(ParameterType::LocalAddr)),
            local_address_type: node
                .text(ParameterType::LocalAddrType)
                .map(LocalAddressType::from_text)
                .unwrap_or_default(),
            linger: node.uint(ParameterType::Linger),
            credentials,
            dns_addresses: node
                .params_of(ParameterType::DnsAddr)
                .filter_map(Parameter::text)
                .map(str::to_owned)
                .collect(),
        }
    }

    fn map_physical_proxy(&self, node: &Characteristic) -> PhysicalProxy {
        let ports = node
            .children_of(CharacteristicType::Port)
            .map(|port| Port {
                number: port.uint(ParameterType::PortNbr).unwrap_or(0),
                service: port
                    .text(ParameterType::Service)
                    .map(PortService::from_text)
                    .unwrap_or_default(),
            })
            .collect();

        let napdefs = node
            .params_of(ParameterType::ToNapid)
            .filter_map(Parameter::text)
            .filter_map(|napid| self.napdef_connectoid(napid))
            .collect();

        PhysicalProxy {
            address: owned(node.text(ParameterType::PxAddr)),
            address_type: node
                .text(ParameterType::PxAddrType)
                .map(ProxyAddressType::from_text)
                .unwrap_or_default(),
            napdefs,
            ports,
        }
    }

    fn map_proxy(&self, node: &Characteristic) -> Proxy {
        let auth = node.child(CharacteristicType::PxAuthInfo);

        Proxy {
            id: node.text(ParameterType::ProxyId).unwrap_or_default().to_owned(),
            name: owned(node.text(ParameterType::Name)),
            start_page: owned(node.text(ParameterType::StartPage)),
            auth_id: owned(auth.and_then(|a| a.text(ParameterType::PxAuthId))),
            auth_pw: owned(auth.and_then(|a| a.text(ParameterType::PxAuthPw))),
            auth_type: auth
                .and_then(|a| a.text(ParameterType::PxAuthType))
                .map(ProxyAuthType::from_text)
                .unwrap_or_default(),
            physical_proxies: node
                .children_of(CharacteristicType::PxPhysical)
                .map(|physical| self.map_physical_proxy(physical))
                .collect(),
        }
    }

    fn map_mms(&self, node: &Characteristic) -> Mms {
        Mms {
            mmsc: owned(node.text(ParameterType::Addr)),
            connectoids: self.connectoids(node),
        }
    }

    fn map_syncml(&self, node: &Characteristic) -> Syncml {
        let (address, port, _) = server_address(node);
        let mut syncml = Syncml {
            name: owned(node.text(ParameterType::Name)),
            server_id: owned(node.text(ParameterType::ProviderId)),
            address: owned(address),
            port,
            connectoids: self.connectoids(node),
            ..Syncml::default()
        };

        for auth in node.children_of(CharacteristicType::AppAuth) {
            let credentials = match auth.text(ParameterType::AauthLevel) {
                None => &mut syncml.http_credentials,
                Some("APPSRV") => &mut syncml.server_credentials,
                Some("CLIENT") => &mut syncml.client_credentials,
                Some(level) => {
                    debug!("ignoring APPAUTH with level {}", level);
                    continue;
                }
            };
            fill_credentials(credentials, auth);
        }

        syncml
    }

    fn map_omads(&self, node: &Characteristic) -> Omads {
        let dbs = node
            .children_of(CharacteristicType::Resource)
            .map(|resource| {
                let mut credentials = SyncmlCredentials::default();
                fill_credentials(&mut credentials, resource);
                SyncmlDb {
                    name: owned(resource.text(ParameterType::Name)),
                    sync_type: resource
                        .uint(ParameterType::SyncType)
                        .map(SyncType::from_number)
                        .unwrap_or_default(),
                    cli_uri: owned(resource.text(ParameterType::CliUri)),
                    uri: owned(resource.text(ParameterType::Uri)),
                    accept_types: owned(resource.text(ParameterType::Aaccept)),
                    credentials,
                }
            })
            .collect();

        Omads {
            syncml: self.map_syncml(node),
            dbs,
        }
    }

    fn map_omadm(&self, node: &Characteristic) -> Omadm {
        Omadm {
            syncml: self.map_syncml(node),
            init: node.has_param(ParameterType::Init),
        }
    }

    fn map_browser(&self, node: &Characteristic) -> Browser {
        let resources: Vec<_> = node.children_of(CharacteristicType::Resource).collect();

        Browser {
            name: owned(node.text(ParameterType::Name)),
            start_page: resources
                .iter()
                .position(|resource| resource.has_param(ParameterType::StartPage)),
            bookmarks: resources
                .iter()
                .map(|resource| Bookmark {
                    name: owned(resource.text(ParameterType::Name)),
                    url: owned(resource.text(ParameterType::Uri)),
                    user_name: owned(resource.text(ParameterType::AauthName)),
                    password: owned(resource.text(ParameterType::AauthSecret)),
                })
                .collect(),
            connectoids: self.connectoids(node),
        }
    }
}

/// Copy AAUTH* values of `node` into `credentials`, unless an auth type is already known.
fn fill_credentials(credentials: &mut SyncmlCredentials, node: &Characteristic) {
    if credentials.auth_type.is_set() {
        return;
    }

    for param in node.params() {
        let Some(text) = param.text() else {
            continue;
        };
        match param.kind() {
            ParameterType::AauthData => credentials.nonce = Some(text.to_owned()),
            ParameterType::AauthName => credentials.user_name = Some(text.to_owned()),
            ParameterType::AauthSecret => credentials.password = Some(text.to_owned()),
            ParameterType::AauthType => credentials.auth_type = SyncmlAuthType::from_text(text),
            _ => {}
        }
    }
}

fn map_email_transport(node: &Characteristic, server_type: EmailServerType) -> EmailTransport {
    let (address, port, service) = server_address(node);
    let auth = node.child(CharacteristicType::AppAuth);

    EmailTransport {
        server_type,
        server_address: owned(address),
        server_port: port,
        use_ssl: service == Some(server_type.ssl_service()),
        auth_type: auth
            .and_then(|a| a.text(ParameterType::AauthType))
            .map(EmailAuthType::from_text)
            .unwrap_or_default(),
        user_name: owned(auth.and_then(|a| a.text(ParameterType::AauthName))),
        password: owned(auth.and_then(|a| a.text(ParameterType::AauthSecret))),
    }
}

fn map_email(account: &EmailAccount<'_>) -> Email {
    let mut email = Email::default();

    if let Some(incoming) = account.incoming {
        let server_type = if incoming.text(ParameterType::AppId) == Some(AppId::Pop3.as_str()) {
            EmailServerType::Pop
        } else {
            EmailServerType::Imap
        };
        email.incoming = Some(map_email_transport(incoming, server_type));
        email.name = owned(incoming.text(ParameterType::Name));
        email.id = owned(incoming.text(ParameterType::ProviderId));
    }

    if let Some(outgoing) = account.outgoing {
        email.outgoing = Some(map_email_transport(outgoing, EmailServerType::Smtp));
        if email.name.is_none() {
            email.name = owned(outgoing.text(ParameterType::Name));
        }
        if email.id.is_none() {
            email.id = owned(outgoing.text(ParameterType::ProviderId));
        }
        email.email_address = owned(outgoing.text(ParameterType::From));
    }

    email
}
