//! Bottom-up structural and semantic validation of the document tree.

use log::debug;

use super::merge::{self, cap_domains, remove_duplicates, resolve_duplicates};
use super::schema::{self, AppId, CharacteristicType, MAX_REFERENCE_LEN, ParameterType};
use super::{Characteristic, ParamValue};

/// Outcome of validating one characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Validity {
    Valid,
    Corrupt,
}

impl Validity {
    fn from_bool(valid: bool) -> Self {
        if valid {
            Validity::Valid
        } else {
            Validity::Corrupt
        }
    }
}

/// Validate `node` and its subtree, deleting every corrupt descendant.
///
/// A root left without children is corrupt.
pub(crate) fn validate(node: &mut Characteristic) -> Validity {
    node.children.retain_mut(|child| {
        let valid = validate(child) == Validity::Valid;
        if !valid {
            debug!("dropping invalid {}", child.kind);
        }
        valid
    });

    if node.kind == CharacteristicType::Root {
        return Validity::from_bool(!node.children.is_empty());
    }

    if !has_required_entries(node) {
        return Validity::Corrupt;
    }

    match node.kind {
        CharacteristicType::Access => validate_access(node),
        CharacteristicType::AppAddr => {
            remove_duplicates(node, CharacteristicType::Port, ParameterType::PortNbr);
            Validity::Valid
        }
        CharacteristicType::Application => validate_application(node),
        CharacteristicType::Bootstrap => validate_bootstrap(node),
        CharacteristicType::Napdef => validate_napdef(node),
        CharacteristicType::Port => check_uint_max(node, ParameterType::PortNbr, 0xffff),
        CharacteristicType::PxLogical => validate_pxlogical(node),
        CharacteristicType::PxPhysical => validate_pxphysical(node),
        CharacteristicType::Validity => validate_validity(node),
        _ => Validity::Valid,
    }
}

fn has_required_entries(node: &Characteristic) -> bool {
    for rule in schema::parameter_rules(node.kind) {
        if rule.occurrence.is_required() && !node.has_param(rule.kind) {
            debug!("{} lacks required {}", node.kind, rule.kind);
            return false;
        }
    }

    for rule in schema::child_rules(node.kind) {
        if rule.occurrence.is_required() && node.child(rule.kind).is_none() {
            debug!("{} lacks required {}", node.kind, rule.kind);
            return false;
        }
    }

    true
}

/// Delete the first `kind` parameter when its value exceeds `max`; the node is then corrupt.
fn check_uint_max(node: &mut Characteristic, kind: ParameterType, max: u32) -> Validity {
    if let Some(index) = node.find_param(kind, 0) {
        if node.params[index].uint().is_some_and(|value| value > max) {
            debug!("{} of {} exceeds {}", kind, node.kind, max);
            node.params.remove(index);
            return Validity::Corrupt;
        }
    }
    Validity::Valid
}

/// Delete the first `kind` parameter when it is too long to be a reference; the node is then
/// corrupt.
fn check_reference_len(node: &mut Characteristic, kind: ParameterType) -> Validity {
    if let Some(index) = node.find_param(kind, 0) {
        if node.params[index]
            .text()
            .is_some_and(|text| text.len() > MAX_REFERENCE_LEN)
        {
            debug!("{} of {} is too long", kind, node.kind);
            node.params.remove(index);
            return Validity::Corrupt;
        }
    }
    Validity::Valid
}

/// When `trigger` is present, `required` must be present with a non-empty value.
fn check_pair(node: &Characteristic, trigger: ParameterType, required: ParameterType) -> bool {
    !node.has_param(trigger) || node.text(required).is_some_and(|text| !text.is_empty())
}

fn is_reference(kind: ParameterType) -> bool {
    matches!(kind, ParameterType::ToNapid | ParameterType::ToProxy)
}

/// An access rule is a RULE followed by optional qualifiers and then one or more references.
pub(super) fn validate_access(node: &mut Characteristic) -> Validity {
    let _ = check_uint_max(node, ParameterType::PortNbr, 0xffff);

    if node.params.len() <= 1 || node.params[0].kind != ParameterType::Rule {
        debug!("access rule does not start with a RULE");
        return Validity::Corrupt;
    }

    let Some(first_reference) = node.params[1..].iter().position(|p| is_reference(p.kind)) else {
        debug!("access rule has no TO-NAPID or TO-PROXY");
        return Validity::Corrupt;
    };

    let trailing_ok = node.params[1 + first_reference..]
        .iter()
        .all(|p| is_reference(p.kind));
    if !trailing_ok {
        debug!("access rule has qualifiers after its references");
    }
    Validity::from_bool(trailing_ok)
}

fn validate_bootstrap(node: &mut Characteristic) -> Validity {
    if node.has_param(ParameterType::ProvUrl) {
        node.remove_params(ParameterType::Country);
        node.remove_params(ParameterType::Network);
        let _ = check_uint_max(node, ParameterType::ContextAllow, 255);
        Validity::Valid
    } else {
        Validity::from_bool(check_pair(
            node,
            ParameterType::Network,
            ParameterType::Country,
        ))
    }
}

fn validate_napdef(node: &mut Characteristic) -> Validity {
    remove_duplicates(
        node,
        CharacteristicType::NapAuthInfo,
        ParameterType::AuthType,
    );
    remove_duplicates(node, CharacteristicType::Validity, ParameterType::Country);

    if node.has_param(ParameterType::NapAddress) {
        node.add_default(ParameterType::NapAddrType, text("E164"));
        node.add_default(ParameterType::CallType, text("ANALOG-MODEM"));
        if node.has_param(ParameterType::LocalAddr) {
            node.add_default(ParameterType::LocalAddrType, text("IPV6"));
        }
    }

    match node.text(ParameterType::Bearer) {
        Some("GSM-CSD" | "GSM-GPRS") => {}
        other => {
            debug!("unsupported NAPDEF bearer {:?}", other);
            return Validity::Corrupt;
        }
    }

    check_reference_len(node, ParameterType::NapId)
}

fn validate_pxlogical(node: &mut Characteristic) -> Validity {
    remove_duplicates(node, CharacteristicType::Port, ParameterType::PortNbr);
    cap_domains(node);
    remove_duplicates(
        node,
        CharacteristicType::PxAuthInfo,
        ParameterType::PxAuthType,
    );
    resolve_duplicates(
        node,
        CharacteristicType::PxPhysical,
        ParameterType::PhysicalProxyId,
        merge::merge_physical,
    );

    node.add_default(ParameterType::PushEnabled, ParamValue::Uint(0));
    node.add_default(ParameterType::PullEnabled, ParamValue::Uint(0));
    node.add_default(ParameterType::Domain, text(""));
    node.add_default(ParameterType::WspVersion, text("1.2"));

    check_reference_len(node, ParameterType::ProxyId)
}

fn validate_pxphysical(node: &mut Characteristic) -> Validity {
    remove_duplicates(node, CharacteristicType::Port, ParameterType::PortNbr);
    cap_domains(node);
    node.add_default(ParameterType::PxAddrType, text("IPV4"));
    Validity::Valid
}

fn validate_validity(node: &mut Characteristic) -> Validity {
    Validity::from_bool(
        check_pair(node, ParameterType::Network, ParameterType::Country)
            && check_pair(node, ParameterType::Sid, ParameterType::Soc),
    )
}

/// The first APPADDR carries at least one PORT.
fn has_port(node: &Characteristic) -> bool {
    node.child(CharacteristicType::AppAddr)
        .is_some_and(|addr| addr.child(CharacteristicType::Port).is_some())
}

fn validate_application(node: &mut Characteristic) -> Validity {
    let _ = check_reference_len(node, ParameterType::Name);
    let _ = check_reference_len(node, ParameterType::ProviderId);

    let Some(app_id) = node.text(ParameterType::AppId).and_then(AppId::from_wire) else {
        debug!(
            "unsupported application {:?}",
            node.text(ParameterType::AppId)
        );
        return Validity::Corrupt;
    };

    let needs_address = !matches!(app_id, AppId::Browser | AppId::Omadl);
    if needs_address
        && !node.has_param(ParameterType::Addr)
        && node.child(CharacteristicType::AppAddr).is_none()
    {
        debug!("application {} has no address", app_id.as_str());
        return Validity::Corrupt;
    }

    let valid = match app_id {
        AppId::Omadm => node
            .text(ParameterType::ProviderId)
            .is_some_and(|id| !id.is_empty()),
        AppId::Smtp => node.has_param(ParameterType::From) && has_port(node),
        AppId::Pop3 | AppId::Imap4 => has_port(node),
        AppId::Omads => {
            node.children.retain(|child| {
                child.kind != CharacteristicType::Resource
                    || child.has_param(ParameterType::Aaccept)
            });
            node.child(CharacteristicType::Resource).is_some()
        }
        AppId::Imps => node.has_param(ParameterType::Aaccept),
        _ => true,
    };

    if !valid {
        debug!("application {} is incomplete", app_id.as_str());
    }
    Validity::from_bool(valid)
}

fn text(value: &str) -> ParamValue {
    ParamValue::Text(value.to_owned())
}
