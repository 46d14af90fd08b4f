//! Static schema tables for OMA Client Provisioning documents.
//!
//! Name lookups use binary search over byte-sorted tables. Per-kind parameter tables are sorted
//! by [`ParameterType`] (whose declaration order is the byte order of the wire names), so they
//! are binary searched as well.

wire_enum! {
    /// The kind of a characteristic (tree node).
    pub enum CharacteristicType / CHARACTERISTIC_NAMES {
        Access => "ACCESS",
        AppAddr => "APPADDR",
        AppAuth => "APPAUTH",
        Application => "APPLICATION",
        Bootstrap => "BOOTSTRAP",
        ClientIdentity => "CLIENTIDENTITY",
        NapAuthInfo => "NAPAUTHINFO",
        Napdef => "NAPDEF",
        Port => "PORT",
        PxAuthInfo => "PXAUTHINFO",
        PxLogical => "PXLOGICAL",
        PxPhysical => "PXPHYSICAL",
        Resource => "RESOURCE",
        Root => "ROOT",
        Validity => "VALIDITY",
        VendorConfig => "VENDORCONFIG",
    }
}

wire_enum! {
    /// The kind of a parameter (`parm` element).
    pub enum ParameterType / PARAMETER_NAMES {
        Aaccept => "AACCEPT",
        AauthData => "AAUTHDATA",
        AauthLevel => "AAUTHLEVEL",
        AauthName => "AAUTHNAME",
        AauthSecret => "AAUTHSECRET",
        AauthType => "AAUTHTYPE",
        Addr => "ADDR",
        AddrType => "ADDRTYPE",
        AppId => "APPID",
        AProtocol => "APROTOCOL",
        AuthEntity => "AUTH-ENTITY",
        AuthName => "AUTHNAME",
        AuthSecret => "AUTHSECRET",
        AuthType => "AUTHTYPE",
        AutoDownload => "AUTO-DOWNLOAD",
        BasAuthId => "BASAUTH-ID",
        BasAuthPw => "BASAUTH-PW",
        Bearer => "BEARER",
        CallType => "CALLTYPE",
        CidPrefix => "CIDPREFIX",
        ClientId => "CLIENT-ID",
        CliUri => "CLIURI",
        Cm => "CM",
        ContextAllow => "CONTEXT-ALLOW",
        Country => "COUNTRY",
        DeliveryErrSdu => "DELIVERY-ERR-SDU",
        DeliveryOrder => "DELIVERY-ORDER",
        DeliveryTime => "DELIVERY-TIME",
        DnLinkSpeed => "DNLINKSPEED",
        DnsAddr => "DNS-ADDR",
        Domain => "DOMAIN",
        ExpiryTime => "EXPIRY-TIME",
        FirstRetryTimeout => "FIRST-RETRY-TIMEOUT",
        From => "FROM",
        GuaranteedBitrateDnLink => "GUARANTEED-BITRATE-DNLINK",
        GuaranteedBitrateUpLink => "GUARANTEED-BITRATE-UPLINK",
        Image => "IMAGE",
        Init => "INIT",
        Internet => "INTERNET",
        Linger => "LINGER",
        LinkSpeed => "LINKSPEED",
        LocalAddr => "LOCAL-ADDR",
        LocalAddrType => "LOCAL-ADDRTYPE",
        Master => "MASTER",
        MaxBitrateDnLink => "MAX-BITRATE-DNLINK",
        MaxBitrateUpLink => "MAX-BITRATE-UPLINK",
        MaxNumRetry => "MAX-NUM-RETRY",
        MaxSduSize => "MAX-SDU-SIZE",
        Ms => "MS",
        Ma => "Ma",
        Name => "NAME",
        NapAddress => "NAP-ADDRESS",
        NapAddrType => "NAP-ADDRTYPE",
        NapId => "NAPID",
        Network => "NETWORK",
        PcAddr => "PC-ADDR",
        PhysicalProxyId => "PHYSICAL-PROXY-ID",
        PopBeforeSmtp => "POP-BEFORE-SMTP",
        PortNbr => "PORTNBR",
        PpgAuthType => "PPGAUTH-TYPE",
        Priority => "PRIORITY",
        ProviderId => "PROVIDER-ID",
        ProvUrl => "PROVURL",
        ProxyId => "PROXY-ID",
        ProxyProviderId => "PROXY-PROVIDER-ID",
        ProxyPw => "PROXY-PW",
        PullEnabled => "PULLENABLED",
        PushEnabled => "PUSHENABLED",
        PxAddr => "PXADDR",
        PxAddrFqdn => "PXADDR-FQDN",
        PxAddrType => "PXADDRTYPE",
        PxAuthId => "PXAUTH-ID",
        PxAuthPw => "PXAUTH-PW",
        PxAuthType => "PXAUTH-TYPE",
        RequestDelivery => "REQUEST-DELIVERY",
        RequestRead => "REQUEST-READ",
        ReregThreshold => "REREG-THRESHOLD",
        ResidualBer => "RESIDUAL-BER",
        Rm => "RM",
        Roaming => "ROAMING",
        Rule => "RULE",
        SaveSent => "SAVE-SENT",
        SduErrorRatio => "SDU-ERROR-RATIO",
        SenderVisible => "SENDER-VISIBLE",
        SentFolder => "SENT-FOLDER",
        Service => "SERVICE",
        Services => "SERVICES",
        Sid => "SID",
        Soc => "SOC",
        Spi => "SPI",
        StartPage => "STARTPAGE",
        SyncType => "SYNCTYPE",
        TBit => "T-BIT",
        ToNapid => "TO-NAPID",
        ToProxy => "TO-PROXY",
        TrafficClass => "TRAFFIC-CLASS",
        TrafficHandlPrio => "TRAFFIC-HANDL-PRIO",
        TransferDelay => "TRANSFER-DELAY",
        TrashFolder => "TRASH-FOLDER",
        Trust => "TRUST",
        Uri => "URI",
        ValidUntil => "VALIDUNTIL",
        WspVersion => "WSP-VERSION",
    }
}

impl CharacteristicType {
    /// Resolve a `type` attribute. The `Root` sentinel is never matched.
    pub fn from_wire(name: &str) -> Option<Self> {
        lookup(CHARACTERISTIC_NAMES, name).filter(|kind| *kind != CharacteristicType::Root)
    }
}

impl ParameterType {
    /// Resolve a `name` attribute.
    pub fn from_wire(name: &str) -> Option<Self> {
        lookup(PARAMETER_NAMES, name)
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table
        .binary_search_by(|(candidate, _)| candidate.as_bytes().cmp(name.as_bytes()))
        .ok()
        .map(|index| table[index].1)
}

/// How many times a parameter or child may appear under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Exactly one.
    Once,
    /// Zero or one.
    ZeroOrOne,
    /// Any number.
    ZeroOrMore,
    /// At least one.
    OneOrMore,
}

impl Occurrence {
    /// True when a second instance is never accepted.
    pub fn is_single(self) -> bool {
        matches!(self, Occurrence::Once | Occurrence::ZeroOrOne)
    }

    /// True when at least one instance must be present after validation.
    pub fn is_required(self) -> bool {
        matches!(self, Occurrence::Once | Occurrence::OneOrMore)
    }
}

/// How the `value` attribute of a parameter is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// The parameter is a flag, any value is ignored.
    None,
    /// Unsigned decimal integer.
    Uint,
    /// Unsigned hexadecimal integer, stored as an integer.
    UintHex,
    /// Mandatory text.
    Utf8,
    /// Text that may be missing.
    Utf8Opt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterRule {
    pub kind: ParameterType,
    pub occurrence: Occurrence,
    pub value: ValueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRule {
    pub kind: CharacteristicType,
    pub occurrence: Occurrence,
}

/// Longest NAPID, PROXY-ID, application NAME or PROVIDER-ID accepted, in bytes.
pub const MAX_REFERENCE_LEN: usize = 128;

const fn p(kind: ParameterType, occurrence: Occurrence, value: ValueKind) -> ParameterRule {
    ParameterRule {
        kind,
        occurrence,
        value,
    }
}

const fn c(kind: CharacteristicType, occurrence: Occurrence) -> ChildRule {
    ChildRule { kind, occurrence }
}

use self::CharacteristicType as C;
use self::Occurrence::{Once, OneOrMore, ZeroOrMore, ZeroOrOne};
use self::ParameterType as P;
use self::ValueKind::{Uint, UintHex, Utf8, Utf8Opt};

static PXLOGICAL_PARAMS: &[ParameterRule] = &[
    p(P::BasAuthId, ZeroOrOne, Utf8),
    p(P::BasAuthPw, ZeroOrOne, Utf8),
    p(P::Domain, ZeroOrMore, Utf8),
    p(P::Master, ZeroOrOne, ValueKind::None),
    p(P::Name, Once, Utf8),
    p(P::PpgAuthType, ZeroOrOne, Utf8),
    p(P::ProxyId, Once, Utf8),
    p(P::ProxyProviderId, ZeroOrOne, Utf8),
    p(P::ProxyPw, ZeroOrOne, Utf8),
    p(P::PullEnabled, ZeroOrOne, Uint),
    p(P::PushEnabled, ZeroOrOne, Uint),
    p(P::StartPage, ZeroOrOne, Utf8),
    p(P::Trust, ZeroOrOne, ValueKind::None),
    p(P::WspVersion, ZeroOrOne, Utf8),
];

static PXAUTHINFO_PARAMS: &[ParameterRule] = &[
    p(P::PxAuthId, ZeroOrOne, Utf8),
    p(P::PxAuthPw, ZeroOrOne, Utf8),
    p(P::PxAuthType, Once, Utf8),
];

static PORT_PARAMS: &[ParameterRule] = &[
    p(P::PortNbr, Once, Uint),
    p(P::Service, ZeroOrMore, Utf8),
];

static PXPHYSICAL_PARAMS: &[ParameterRule] = &[
    p(P::Domain, ZeroOrMore, Utf8),
    p(P::PhysicalProxyId, Once, Utf8),
    p(P::PullEnabled, ZeroOrOne, Uint),
    p(P::PushEnabled, ZeroOrOne, Uint),
    p(P::PxAddr, Once, Utf8),
    p(P::PxAddrFqdn, ZeroOrOne, Utf8),
    p(P::PxAddrType, ZeroOrOne, Utf8),
    p(P::ToNapid, OneOrMore, Utf8),
    p(P::WspVersion, ZeroOrOne, Utf8),
];

static NAPDEF_PARAMS: &[ParameterRule] = &[
    p(P::Bearer, ZeroOrMore, Utf8),
    p(P::CallType, ZeroOrOne, Utf8),
    p(P::DeliveryErrSdu, ZeroOrOne, UintHex),
    p(P::DeliveryOrder, ZeroOrOne, UintHex),
    p(P::DnLinkSpeed, ZeroOrOne, Utf8),
    p(P::DnsAddr, ZeroOrMore, Utf8),
    p(P::FirstRetryTimeout, ZeroOrOne, UintHex),
    p(P::GuaranteedBitrateDnLink, ZeroOrOne, UintHex),
    p(P::GuaranteedBitrateUpLink, ZeroOrOne, UintHex),
    p(P::Internet, ZeroOrOne, ValueKind::None),
    p(P::Linger, ZeroOrOne, Uint),
    p(P::LinkSpeed, ZeroOrOne, Utf8),
    p(P::LocalAddr, ZeroOrOne, Utf8),
    p(P::LocalAddrType, ZeroOrOne, Utf8),
    p(P::MaxBitrateDnLink, ZeroOrOne, UintHex),
    p(P::MaxBitrateUpLink, ZeroOrOne, UintHex),
    p(P::MaxNumRetry, ZeroOrOne, UintHex),
    p(P::MaxSduSize, ZeroOrOne, UintHex),
    p(P::Name, Once, Utf8),
    p(P::NapAddress, Once, Utf8),
    p(P::NapAddrType, ZeroOrOne, Utf8),
    p(P::NapId, Once, Utf8),
    p(P::ReregThreshold, ZeroOrOne, UintHex),
    p(P::ResidualBer, ZeroOrOne, UintHex),
    p(P::SduErrorRatio, ZeroOrOne, UintHex),
    p(P::TBit, ZeroOrOne, ValueKind::None),
    p(P::TrafficClass, ZeroOrOne, UintHex),
    p(P::TrafficHandlPrio, ZeroOrOne, UintHex),
    p(P::TransferDelay, ZeroOrOne, UintHex),
];

static NAPAUTHINFO_PARAMS: &[ParameterRule] = &[
    p(P::AuthEntity, ZeroOrMore, Utf8),
    p(P::AuthName, ZeroOrOne, Utf8),
    p(P::AuthSecret, ZeroOrOne, Utf8),
    p(P::AuthType, Once, Utf8),
    p(P::Spi, ZeroOrOne, Utf8),
];

static VALIDITY_PARAMS: &[ParameterRule] = &[
    p(P::Country, ZeroOrOne, Utf8),
    p(P::Network, ZeroOrOne, Utf8),
    p(P::Sid, ZeroOrOne, Utf8),
    p(P::Soc, ZeroOrOne, Utf8),
    p(P::ValidUntil, ZeroOrOne, Uint),
];

static BOOTSTRAP_PARAMS: &[ParameterRule] = &[
    p(P::ContextAllow, ZeroOrOne, Uint),
    p(P::Country, ZeroOrOne, Utf8),
    p(P::Name, ZeroOrOne, Utf8),
    p(P::Network, ZeroOrMore, Utf8),
    p(P::ProvUrl, ZeroOrOne, Utf8),
    p(P::ProxyId, ZeroOrMore, Utf8),
];

static CLIENTIDENTITY_PARAMS: &[ParameterRule] = &[p(P::ClientId, Once, Utf8)];

static VENDORCONFIG_PARAMS: &[ParameterRule] = &[p(P::Name, Once, Utf8)];

static APPLICATION_PARAMS: &[ParameterRule] = &[
    p(P::Aaccept, ZeroOrOne, Utf8),
    p(P::Addr, ZeroOrMore, Utf8),
    p(P::AppId, Once, Utf8),
    p(P::AProtocol, ZeroOrOne, Utf8),
    p(P::AutoDownload, ZeroOrOne, Utf8),
    p(P::CidPrefix, ZeroOrOne, Utf8),
    p(P::Cm, ZeroOrOne, Utf8),
    p(P::DeliveryTime, ZeroOrOne, Utf8),
    p(P::Domain, ZeroOrMore, Utf8),
    p(P::ExpiryTime, ZeroOrOne, Utf8),
    p(P::From, ZeroOrOne, Utf8),
    p(P::Init, ZeroOrOne, ValueKind::None),
    p(P::Ms, ZeroOrOne, Utf8),
    p(P::Ma, ZeroOrOne, Utf8),
    p(P::Name, ZeroOrOne, Utf8),
    p(P::PcAddr, ZeroOrOne, Utf8),
    p(P::PopBeforeSmtp, ZeroOrOne, Uint),
    p(P::Priority, ZeroOrOne, Utf8),
    p(P::ProviderId, ZeroOrOne, Utf8),
    p(P::RequestDelivery, ZeroOrOne, Uint),
    p(P::RequestRead, ZeroOrOne, Uint),
    p(P::Rm, ZeroOrOne, Utf8),
    p(P::Roaming, ZeroOrOne, Utf8),
    p(P::SaveSent, ZeroOrOne, Uint),
    p(P::SenderVisible, ZeroOrOne, Uint),
    p(P::SentFolder, ZeroOrOne, Utf8),
    p(P::Services, ZeroOrOne, Utf8),
    p(P::ToNapid, ZeroOrMore, Utf8),
    p(P::ToProxy, ZeroOrMore, Utf8),
    p(P::TrashFolder, ZeroOrOne, Utf8),
];

static APPADDR_PARAMS: &[ParameterRule] = &[
    p(P::Addr, Once, Utf8),
    p(P::AddrType, ZeroOrOne, Utf8),
];

static APPAUTH_PARAMS: &[ParameterRule] = &[
    p(P::AauthData, ZeroOrOne, Utf8),
    p(P::AauthLevel, ZeroOrOne, Utf8),
    p(P::AauthName, ZeroOrOne, Utf8),
    p(P::AauthSecret, ZeroOrOne, Utf8),
    p(P::AauthType, ZeroOrOne, Utf8),
];

static RESOURCE_PARAMS: &[ParameterRule] = &[
    p(P::Aaccept, ZeroOrOne, Utf8),
    p(P::AauthData, ZeroOrOne, Utf8),
    p(P::AauthName, ZeroOrOne, Utf8),
    p(P::AauthSecret, ZeroOrOne, Utf8),
    p(P::AauthType, ZeroOrOne, Utf8),
    p(P::CliUri, ZeroOrOne, Utf8),
    p(P::Image, ZeroOrOne, Utf8),
    p(P::Name, ZeroOrOne, Utf8),
    p(P::StartPage, ZeroOrOne, ValueKind::None),
    p(P::SyncType, ZeroOrOne, Uint),
    p(P::Uri, Once, Utf8),
];

static ACCESS_PARAMS: &[ParameterRule] = &[
    p(P::AppId, ZeroOrMore, Utf8),
    p(P::Domain, ZeroOrMore, Utf8),
    p(P::PortNbr, ZeroOrMore, Uint),
    p(P::Rule, OneOrMore, Utf8Opt),
    p(P::ToNapid, ZeroOrMore, Utf8),
    p(P::ToProxy, ZeroOrMore, Utf8),
];

static ROOT_CHILDREN: &[ChildRule] = &[
    c(C::Access, ZeroOrMore),
    c(C::Application, ZeroOrMore),
    c(C::Bootstrap, ZeroOrMore),
    c(C::ClientIdentity, ZeroOrOne),
    c(C::Napdef, ZeroOrMore),
    c(C::PxLogical, ZeroOrMore),
    c(C::VendorConfig, ZeroOrMore),
];

static PXLOGICAL_CHILDREN: &[ChildRule] = &[
    c(C::Port, ZeroOrMore),
    c(C::PxAuthInfo, ZeroOrMore),
    c(C::PxPhysical, OneOrMore),
];

static PXPHYSICAL_CHILDREN: &[ChildRule] = &[c(C::Port, ZeroOrMore)];

static NAPDEF_CHILDREN: &[ChildRule] = &[
    c(C::NapAuthInfo, ZeroOrMore),
    c(C::Validity, ZeroOrMore),
];

static APPLICATION_CHILDREN: &[ChildRule] = &[
    c(C::AppAddr, ZeroOrMore),
    c(C::AppAuth, ZeroOrMore),
    c(C::Resource, ZeroOrMore),
];

static APPADDR_CHILDREN: &[ChildRule] = &[c(C::Port, ZeroOrMore)];

/// Parameters a characteristic of `kind` may carry, sorted by parameter type.
pub fn parameter_rules(kind: CharacteristicType) -> &'static [ParameterRule] {
    match kind {
        C::Access => ACCESS_PARAMS,
        C::AppAddr => APPADDR_PARAMS,
        C::AppAuth => APPAUTH_PARAMS,
        C::Application => APPLICATION_PARAMS,
        C::Bootstrap => BOOTSTRAP_PARAMS,
        C::ClientIdentity => CLIENTIDENTITY_PARAMS,
        C::NapAuthInfo => NAPAUTHINFO_PARAMS,
        C::Napdef => NAPDEF_PARAMS,
        C::Port => PORT_PARAMS,
        C::PxAuthInfo => PXAUTHINFO_PARAMS,
        C::PxLogical => PXLOGICAL_PARAMS,
        C::PxPhysical => PXPHYSICAL_PARAMS,
        C::Resource => RESOURCE_PARAMS,
        C::Validity => VALIDITY_PARAMS,
        C::VendorConfig => VENDORCONFIG_PARAMS,
        C::Root => &[],
    }
}

/// Characteristics that may be nested directly under a characteristic of `kind`.
pub fn child_rules(kind: CharacteristicType) -> &'static [ChildRule] {
    match kind {
        C::Root => ROOT_CHILDREN,
        C::PxLogical => PXLOGICAL_CHILDREN,
        C::PxPhysical => PXPHYSICAL_CHILDREN,
        C::Napdef => NAPDEF_CHILDREN,
        C::Application => APPLICATION_CHILDREN,
        C::AppAddr => APPADDR_CHILDREN,
        _ => &[],
    }
}

pub fn parameter_rule(
    owner: CharacteristicType,
    kind: ParameterType,
) -> Option<&'static ParameterRule> {
    let rules = parameter_rules(owner);
    rules
        .binary_search_by(|rule| rule.kind.cmp(&kind))
        .ok()
        .map(|index| &rules[index])
}

pub fn child_rule(parent: CharacteristicType, kind: CharacteristicType) -> Option<&'static ChildRule> {
    child_rules(parent).iter().find(|rule| rule.kind == kind)
}

/// True when `kind` may appear more than once under a characteristic of `owner`.
pub fn allows_repeats(owner: CharacteristicType, kind: ParameterType) -> bool {
    parameter_rule(owner, kind).is_some_and(|rule| !rule.occurrence.is_single())
}

/// The application identifiers this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppId {
    Smtp,
    Pop3,
    Imap4,
    Browser,
    Mms,
    Omads,
    Omadm,
    Imps,
    Omadl,
    Supl,
}

impl AppId {
    pub const ALL: [AppId; 10] = [
        AppId::Smtp,
        AppId::Pop3,
        AppId::Imap4,
        AppId::Browser,
        AppId::Mms,
        AppId::Omads,
        AppId::Omadm,
        AppId::Imps,
        AppId::Omadl,
        AppId::Supl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppId::Smtp => "25",
            AppId::Pop3 => "110",
            AppId::Imap4 => "143",
            AppId::Browser => "w2",
            AppId::Mms => "w4",
            AppId::Omads => "w5",
            AppId::Omadm => "w7",
            AppId::Imps => "wA",
            AppId::Omadl => "DL",
            AppId::Supl => "ap0004",
        }
    }

    /// Case-sensitive match of an APPID value.
    pub fn from_wire(value: &str) -> Option<Self> {
        AppId::ALL.into_iter().find(|id| id.as_str() == value)
    }
}
