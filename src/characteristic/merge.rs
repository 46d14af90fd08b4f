//! Duplicate removal and merging of characteristics.

use log::debug;

use super::schema::{self, CharacteristicType, ParameterType};
use super::Characteristic;

/// Most DOMAIN parameters kept on a proxy.
pub(super) const MAX_DOMAINS: usize = 4;

/// Signature shared by the characteristic merge rules.
pub(super) type MergeFn = fn(&mut Characteristic, &Characteristic);

/// True when both characteristics carry `key` and its first values are equal.
pub(super) fn same_key(a: &Characteristic, b: &Characteristic, key: ParameterType) -> bool {
    match (a.param(key), b.param(key)) {
        (Some(a), Some(b)) => a.same_value(b),
        _ => false,
    }
}

/// Delete every child of `kind` whose `key` repeats the key of an earlier child. First wins.
pub(super) fn remove_duplicates(
    parent: &mut Characteristic,
    kind: CharacteristicType,
    key: ParameterType,
) {
    let mut i = 0;
    while i < parent.children.len() {
        if parent.children[i].kind == kind {
            let mut j = i + 1;
            while j < parent.children.len() {
                if parent.children[j].kind == kind
                    && same_key(&parent.children[i], &parent.children[j], key)
                {
                    debug!("removing duplicate {} (same {})", kind, key);
                    parent.children.remove(j);
                } else {
                    j += 1;
                }
            }
        }
        i += 1;
    }
}

/// Merge every later child of `kind` sharing `key` with an earlier one into it.
pub(super) fn resolve_duplicates(
    parent: &mut Characteristic,
    kind: CharacteristicType,
    key: ParameterType,
    merge: MergeFn,
) {
    let mut i = 0;
    while i < parent.children.len() {
        if parent.children[i].kind == kind {
            let mut j = i + 1;
            while j < parent.children.len() {
                if parent.children[j].kind == kind
                    && same_key(&parent.children[i], &parent.children[j], key)
                {
                    debug!("merging duplicate {} (same {})", kind, key);
                    let duplicate = parent.children.remove(j);
                    merge(&mut parent.children[i], &duplicate);
                } else {
                    j += 1;
                }
            }
        }
        i += 1;
    }
}

/// Keep only the first [`MAX_DOMAINS`] DOMAIN parameters.
pub(super) fn cap_domains(node: &mut Characteristic) {
    let mut seen = 0;
    node.params.retain(|p| {
        if p.kind != ParameterType::Domain {
            return true;
        }
        seen += 1;
        seen <= MAX_DOMAINS
    });
}

/// Fold the parameters of `source` into `target`.
///
/// A parameter kind the target lacks is appended. A transient target value is overwritten. Any
/// other value is appended only when the kind may repeat and no original target value equals it.
pub(super) fn merge_parameters(target: &mut Characteristic, source: &Characteristic) {
    let original = target.params.len();

    for param in &source.params {
        let Some(first) = target.find_param(param.kind, 0) else {
            target.params.push(param.clone());
            continue;
        };

        if target.params[first].transient {
            target.params[first] = param.clone();
            continue;
        }

        let known = target.params[first..original.max(first)]
            .iter()
            .any(|p| p.kind == param.kind && p.same_value(param));

        if !known && schema::allows_repeats(target.kind, param.kind) {
            target.params.push(param.clone());
        }
    }
}

/// Merge each `kind` child of `source` into the original target child with the same `key`, or
/// copy it into the target when there is none.
fn merge_children(
    target: &mut Characteristic,
    source: &Characteristic,
    kind: CharacteristicType,
    key: ParameterType,
    merge: MergeFn,
) {
    let original = target.children.len();

    for child in source.children_of(kind) {
        if !child.has_param(key) {
            continue;
        }

        let matching = (0..original).find(|&k| {
            target.children[k].kind == kind && same_key(&target.children[k], child, key)
        });

        match matching {
            Some(k) => merge(&mut target.children[k], child),
            None => target.children.push(child.clone()),
        }
    }
}

/// Merge two PXPHYSICAL characteristics.
pub(super) fn merge_physical(target: &mut Characteristic, source: &Characteristic) {
    merge_parameters(target, source);
    cap_domains(target);
    merge_children(
        target,
        source,
        CharacteristicType::Port,
        ParameterType::PortNbr,
        merge_parameters,
    );
}

/// Merge two PXLOGICAL characteristics.
pub(super) fn merge_logical(target: &mut Characteristic, source: &Characteristic) {
    merge_parameters(target, source);
    merge_children(
        target,
        source,
        CharacteristicType::Port,
        ParameterType::PortNbr,
        merge_parameters,
    );
    merge_children(
        target,
        source,
        CharacteristicType::PxAuthInfo,
        ParameterType::PxAuthType,
        merge_parameters,
    );
    merge_children(
        target,
        source,
        CharacteristicType::PxPhysical,
        ParameterType::PhysicalProxyId,
        merge_physical,
    );
}
