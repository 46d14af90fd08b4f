//! Document-wide normalisation, run once the tree has been validated.

use hashbrown::HashSet;
use log::debug;

use super::merge::{self, remove_duplicates, resolve_duplicates};
use super::schema::{AppId, CharacteristicType, ParameterType};
use super::validate::{Validity, validate_access};
use super::{Characteristic, ParamValue, Parameter};
use crate::err::{ProvisioningError, Result};

/// The TO-NAPID value that names the generic internet rather than a NAPDEF.
pub(crate) const INTERNET: &str = "INTERNET";

/// Secondary keys used to spot applications provisioned twice.
const APPLICATION_KEYS: [(AppId, ParameterType); 9] = [
    (AppId::Browser, ParameterType::Name),
    (AppId::Mms, ParameterType::AppId),
    (AppId::Omads, ParameterType::ProviderId),
    (AppId::Omadm, ParameterType::ProviderId),
    (AppId::Smtp, ParameterType::ProviderId),
    (AppId::Imap4, ParameterType::ProviderId),
    (AppId::Pop3, ParameterType::ProviderId),
    (AppId::Imps, ParameterType::ProviderId),
    (AppId::Supl, ParameterType::ProviderId),
];

pub(super) fn normalize(root: &mut Characteristic) -> Result<()> {
    remove_duplicates(root, CharacteristicType::Napdef, ParameterType::NapId);
    remove_duplicates(
        root,
        CharacteristicType::ClientIdentity,
        ParameterType::ClientId,
    );
    remove_duplicates(root, CharacteristicType::VendorConfig, ParameterType::Name);

    for (app_id, key) in APPLICATION_KEYS {
        remove_duplicate_applications(root, app_id, key);
    }

    remove_duplicate_bootstraps(root);

    resolve_duplicates(
        root,
        CharacteristicType::PxLogical,
        ParameterType::ProxyId,
        merge::merge_logical,
    );

    repair_napdef_references(root);
    remove_duplicate_rules(root);

    if root.children.is_empty() {
        return Err(ProvisioningError::corrupt(
            "document has no characteristics left after normalisation",
        ));
    }

    bind_unlinked_applications(root)
}

fn is_application(node: &Characteristic, app_id: AppId) -> bool {
    node.kind == CharacteristicType::Application
        && node.text(ParameterType::AppId) == Some(app_id.as_str())
}

/// Delete later applications of `app_id` that repeat the `key` of an earlier one. Two
/// applications lacking the key count as duplicates.
fn remove_duplicate_applications(root: &mut Characteristic, app_id: AppId, key: ParameterType) {
    let mut i = 0;
    while i < root.children.len() {
        if is_application(&root.children[i], app_id) {
            let first_key = root.children[i].param(key).cloned();
            let mut j = i + 1;
            while j < root.children.len() {
                let candidate = &root.children[j];
                let duplicate = is_application(candidate, app_id)
                    && match (&first_key, candidate.param(key)) {
                        (None, None) => true,
                        (Some(a), Some(b)) => a.same_value(b),
                        _ => false,
                    };
                if duplicate {
                    debug!("removing duplicate application {}", app_id.as_str());
                    root.children.remove(j);
                } else {
                    j += 1;
                }
            }
        }
        i += 1;
    }
}

/// Only the first BOOTSTRAP carrying a PROVURL is kept among those that carry one.
fn remove_duplicate_bootstraps(root: &mut Characteristic) {
    let mut seen = false;
    root.children.retain(|child| {
        if child.kind != CharacteristicType::Bootstrap || !child.has_param(ParameterType::ProvUrl) {
            return true;
        }
        if seen {
            debug!("removing additional BOOTSTRAP with PROVURL");
            return false;
        }
        seen = true;
        true
    });
}

/// Remove TO-NAPID values naming unknown NAPDEFs, deleting whatever is left without a usable
/// reference.
fn repair_napdef_references(root: &mut Characteristic) {
    let napids: HashSet<String> = root
        .children_of(CharacteristicType::Napdef)
        .filter_map(|napdef| napdef.text(ParameterType::NapId))
        .map(str::to_owned)
        .collect();

    root.children.retain_mut(|child| match child.kind {
        CharacteristicType::Application | CharacteristicType::Access => {
            retain_known_napids(child, &napids)
        }
        CharacteristicType::PxLogical => {
            let mut found = 0;
            let mut deleted = 0;
            child.children.retain_mut(|physical| {
                if physical.kind != CharacteristicType::PxPhysical {
                    return true;
                }
                found += 1;
                let keep = retain_known_napids(physical, &napids);
                if !keep {
                    deleted += 1;
                }
                keep
            });
            if found <= deleted {
                debug!("removing PXLOGICAL without usable physical proxies");
            }
            found > deleted
        }
        _ => true,
    });
}

/// Drop dangling TO-NAPID values from `node`, returning whether the node itself survives.
fn retain_known_napids(node: &mut Characteristic, napids: &HashSet<String>) -> bool {
    let kind = node.kind;
    let mut found = 0;
    let mut deleted = 0;
    node.params.retain(|param| {
        if param.kind != ParameterType::ToNapid {
            return true;
        }
        found += 1;
        match param.text() {
            Some(id) if id == INTERNET || napids.contains(id) => true,
            other => {
                debug!("removing dangling TO-NAPID {:?} from {}", other, kind);
                deleted += 1;
                false
            }
        }
    });

    if found != deleted {
        return true;
    }

    match node.kind {
        CharacteristicType::PxPhysical => {
            debug!("removing PXPHYSICAL without a usable TO-NAPID");
            false
        }
        CharacteristicType::Access => validate_access(node) == Validity::Valid,
        _ => true,
    }
}

/// Rule names must be unique across the document. A repeated RULE is removed together with
/// the qualifiers that follow it; an ACCESS left without any RULE is removed.
fn remove_duplicate_rules(root: &mut Characteristic) {
    let mut names: HashSet<String> = HashSet::new();

    root.children.retain_mut(|child| {
        if child.kind != CharacteristicType::Access {
            return true;
        }

        let mut next = child.find_param(ParameterType::Rule, 0);
        while let Some(index) = next {
            let name = child.params[index].text().unwrap_or_default().to_owned();
            if names.insert(name) {
                next = child.find_param(ParameterType::Rule, index + 1);
                continue;
            }

            debug!("removing repeated access rule");
            child.params.remove(index);
            while index < child.params.len()
                && !matches!(
                    child.params[index].kind,
                    ParameterType::Rule | ParameterType::ToNapid | ParameterType::ToProxy
                )
            {
                child.params.remove(index);
            }
            next = child.find_param(ParameterType::Rule, index);
        }

        let keep = child.has_param(ParameterType::Rule);
        if !keep {
            debug!("removing ACCESS without rules");
        }
        keep
    });
}

/// Give every application that names neither a NAPDEF nor a proxy, and that no access rule
/// covers, a transient reference to every proxy and NAPDEF of the document.
fn bind_unlinked_applications(root: &mut Characteristic) -> Result<()> {
    let mut bindings = Vec::new();
    for child in &root.children {
        let (source, target) = match child.kind {
            CharacteristicType::PxLogical => (ParameterType::ProxyId, ParameterType::ToProxy),
            CharacteristicType::Napdef => (ParameterType::NapId, ParameterType::ToNapid),
            _ => continue,
        };
        let id = child
            .text(source)
            .ok_or_else(|| ProvisioningError::corrupt(format!("{} without {}", child.kind, source)))?;
        bindings.push(Parameter::transient(target, ParamValue::Text(id.to_owned())));
    }

    let access_app_ids: Vec<Vec<Parameter>> = root
        .children_of(CharacteristicType::Access)
        .map(|access| access.params_of(ParameterType::AppId).cloned().collect())
        .collect();

    for app in root.children.iter_mut() {
        if app.kind != CharacteristicType::Application
            || app.has_param(ParameterType::ToNapid)
            || app.has_param(ParameterType::ToProxy)
        {
            continue;
        }

        let app_id = app
            .param(ParameterType::AppId)
            .ok_or_else(|| ProvisioningError::corrupt("APPLICATION without APPID"))?;

        let covered = access_app_ids
            .iter()
            .any(|ids| ids.is_empty() || ids.iter().any(|id| id.same_value(app_id)));
        if covered {
            continue;
        }

        debug!(
            "binding application {:?} to {} connectoids",
            app_id.text(),
            bindings.len()
        );
        app.params.extend(bindings.iter().cloned());
    }

    Ok(())
}
