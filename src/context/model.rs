//! Typed provisioning model.
//!
//! References between entities are [`NapdefId`] / [`ProxyId`] indices into the lists owned by
//! [`ProvisioningContext`](super::ProvisioningContext).

use serde::Serialize;

use super::analysis::ProvisionedSet;

/// Index of a [`Napdef`] in its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NapdefId(pub usize);

/// Index of a [`Proxy`] in its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProxyId(pub usize);

/// What an application connects through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Connectoid {
    /// Whatever access point the device considers its generic internet connection.
    Internet,
    Napdef(NapdefId),
    Proxy(ProxyId),
}

text_enum! {
    pub enum Bearer {
        GsmCsd => "GSM-CSD",
        GsmGprs => "GSM-GPRS",
    }
}

text_enum! {
    pub enum NapAddressType {
        Apn => "APN",
        E164 => "E164",
    }
}

text_enum! {
    pub enum LocalAddressType {
        Ipv4 => "IPV4",
        Ipv6 => "IPV6",
    }
}

text_enum! {
    pub enum NapAuthType {
        Pap => "PAP",
        Chap => "CHAP",
    }
}

text_enum! {
    pub enum ProxyAuthType {
        HttpBasic => "HTTP-BASIC",
        HttpDigest => "HTTP-DIGEST",
        WtlsSs => "WTLS-SS",
    }
}

text_enum! {
    pub enum ProxyAddressType {
        Alpha => "ALPHA",
        Ipv4 => "IPV4",
        Ipv6 => "IPV6",
    }
}

text_enum! {
    pub enum PortService {
        Ftp => "FTP",
        Http => "HTTP",
        Https => "HTTPS",
    }
}

text_enum! {
    pub enum EmailAuthType {
        Plain => "PLAIN",
        Ntlm => "NTLM",
        Gssapi => "GSSAPI",
        CramMd5 => "CRAM-MD5",
        DigestMd5 => "DIGEST-MD5",
        PopBeforeSmtp => "POPB4SMTP",
        Login => "LOGIN",
        Apop => "APOP",
    }
}

text_enum! {
    pub enum SyncmlAuthType {
        HttpBasic => "HTTP-BASIC",
        HttpDigest => "HTTP-DIGEST",
        Basic => "BASIC",
        Digest => "DIGEST",
        X509 => "X509",
        SecureId => "SECUREID",
        Safeword => "SAFEWORD",
        Digipass => "DIGIPASS",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NapCredentials {
    pub auth_type: NapAuthType,
    pub auth_id: Option<String>,
    pub auth_pw: Option<String>,
}

/// A network access point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Napdef {
    pub id: String,
    pub name: Option<String>,
    pub bearer: Bearer,
    /// The access point may be used as the generic internet connection.
    pub generic: bool,
    pub address: Option<String>,
    pub address_type: NapAddressType,
    pub local_address: Option<String>,
    pub local_address_type: LocalAddressType,
    pub linger: Option<u32>,
    pub credentials: Vec<NapCredentials>,
    pub dns_addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Port {
    pub number: u32,
    pub service: PortService,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhysicalProxy {
    pub address: Option<String>,
    pub address_type: ProxyAddressType,
    pub napdefs: Vec<Connectoid>,
    pub ports: Vec<Port>,
}

/// A logical proxy with its physical endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Proxy {
    pub id: String,
    pub name: Option<String>,
    pub start_page: Option<String>,
    pub auth_id: Option<String>,
    pub auth_pw: Option<String>,
    pub auth_type: ProxyAuthType,
    pub physical_proxies: Vec<PhysicalProxy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mms {
    pub mmsc: Option<String>,
    pub connectoids: Vec<Connectoid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmailServerType {
    Pop,
    Imap,
    Smtp,
}

impl EmailServerType {
    /// The service value announcing the SSL port for this server type.
    pub fn ssl_service(self) -> &'static str {
        match self {
            EmailServerType::Pop => "995",
            EmailServerType::Imap => "993",
            EmailServerType::Smtp => "465",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailTransport {
    pub server_type: EmailServerType,
    pub server_address: Option<String>,
    pub server_port: u32,
    pub use_ssl: bool,
    pub auth_type: EmailAuthType,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

/// An email account made of an incoming and an outgoing server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Email {
    pub name: Option<String>,
    pub id: Option<String>,
    pub incoming: Option<EmailTransport>,
    pub outgoing: Option<EmailTransport>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncmlCredentials {
    pub auth_type: SyncmlAuthType,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub nonce: Option<String>,
}

/// Settings shared by data synchronisation and device management accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Syncml {
    pub name: Option<String>,
    pub server_id: Option<String>,
    pub address: Option<String>,
    pub port: u32,
    pub client_credentials: SyncmlCredentials,
    pub server_credentials: SyncmlCredentials,
    pub http_credentials: SyncmlCredentials,
    pub connectoids: Vec<Connectoid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SyncType {
    #[default]
    NotSet,
    Slow,
    TwoWay,
    OneWayFromClient,
    RefreshFromClient,
    OneWayFromServer,
    RefreshFromServer,
}

impl SyncType {
    pub fn from_number(value: u32) -> Self {
        match value {
            1 => SyncType::Slow,
            2 => SyncType::TwoWay,
            3 => SyncType::OneWayFromClient,
            4 => SyncType::RefreshFromClient,
            5 => SyncType::OneWayFromServer,
            6 => SyncType::RefreshFromServer,
            _ => SyncType::NotSet,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncmlDb {
    pub name: Option<String>,
    pub sync_type: SyncType,
    pub cli_uri: Option<String>,
    pub uri: Option<String>,
    pub accept_types: Option<String>,
    pub credentials: SyncmlCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Omads {
    pub syncml: Syncml,
    pub dbs: Vec<SyncmlDb>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Omadm {
    pub syncml: Syncml,
    /// The server asks for a management session as soon as the document is applied.
    pub init: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    pub name: Option<String>,
    pub url: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Browser {
    pub name: Option<String>,
    /// Index into `bookmarks`.
    pub start_page: Option<usize>,
    pub bookmarks: Vec<Bookmark>,
    pub connectoids: Vec<Connectoid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Application {
    Mms(Mms),
    Email(Email),
    Omads(Omads),
    Omadm(Omadm),
    Browser(Browser),
}

impl Application {
    /// The category this application contributes to the provisioned set.
    pub fn provisioned_type(&self) -> ProvisionedSet {
        match self {
            Application::Mms(_) => ProvisionedSet::MMS,
            Application::Email(_) => ProvisionedSet::EMAIL,
            Application::Omads(_) => ProvisionedSet::OMADS,
            Application::Omadm(_) => ProvisionedSet::OMADM,
            Application::Browser(_) => ProvisionedSet::BROWSER,
        }
    }
}
