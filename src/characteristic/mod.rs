//! The provisioning document tree.
//!
//! A document is parsed into a tree of [`Characteristic`] nodes, validated bottom-up against the
//! static [`schema`], and then normalised by a document-wide pass (duplicate removal, proxy
//! merging, reference repair). Only a tree that survives all of this is handed out.

mod global;
mod merge;
mod parser;
pub mod schema;
mod validate;

use std::fmt::{self, Write};

use log::trace;

use crate::err::{ProvisioningError, Result};
pub(crate) use self::global::INTERNET;
pub use self::schema::{AppId, CharacteristicType, ParameterType};

/// Value of a [`Parameter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    None,
    Uint(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    kind: ParameterType,
    value: ParamValue,
    transient: bool,
}

impl Parameter {
    pub fn new(kind: ParameterType, value: ParamValue) -> Self {
        Parameter {
            kind,
            value,
            transient: false,
        }
    }

    /// A parameter synthesized during validation rather than read from the document.
    pub(crate) fn transient(kind: ParameterType, value: ParamValue) -> Self {
        Parameter {
            kind,
            value,
            transient: true,
        }
    }

    pub fn kind(&self) -> ParameterType {
        self.kind
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn uint(&self) -> Option<u32> {
        match self.value {
            ParamValue::Uint(value) => Some(value),
            _ => None,
        }
    }

    /// Value equality as used by duplicate detection and merging.
    pub fn same_value(&self, other: &Parameter) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ParamValue::None => write!(f, "{}", self.kind)?,
            ParamValue::Uint(value) => write!(f, "{} = {}", self.kind, value)?,
            ParamValue::Text(text) => write!(f, "{} = {:?}", self.kind, text)?,
        }
        if self.transient {
            f.write_str(" (t)")?;
        }
        Ok(())
    }
}

/// A node of the provisioning document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    kind: CharacteristicType,
    params: Vec<Parameter>,
    children: Vec<Characteristic>,
}

impl Characteristic {
    pub fn new(kind: CharacteristicType) -> Self {
        Characteristic {
            kind,
            params: Vec::new(),
            children: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_params(
        kind: CharacteristicType,
        params: impl IntoIterator<Item = Parameter>,
    ) -> Self {
        let mut node = Characteristic::new(kind);
        node.params.extend(params);
        node
    }

    pub fn kind(&self) -> CharacteristicType {
        self.kind
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn children(&self) -> &[Characteristic] {
        &self.children
    }

    /// Index of the first parameter of `kind` at or after `from`.
    pub fn find_param(&self, kind: ParameterType, from: usize) -> Option<usize> {
        self.params
            .iter()
            .skip(from)
            .position(|p| p.kind == kind)
            .map(|rel| from + rel)
    }

    /// The first parameter of `kind`.
    pub fn param(&self, kind: ParameterType) -> Option<&Parameter> {
        self.params.iter().find(|p| p.kind == kind)
    }

    pub fn has_param(&self, kind: ParameterType) -> bool {
        self.param(kind).is_some()
    }

    /// Text of the first parameter of `kind`.
    pub fn text(&self, kind: ParameterType) -> Option<&str> {
        self.param(kind).and_then(Parameter::text)
    }

    /// Integer value of the first parameter of `kind`.
    pub fn uint(&self, kind: ParameterType) -> Option<u32> {
        self.param(kind).and_then(Parameter::uint)
    }

    pub fn params_of(&self, kind: ParameterType) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(move |p| p.kind == kind)
    }

    /// Index of the first child of `kind` at or after `from`.
    pub fn find_child(&self, kind: CharacteristicType, from: usize) -> Option<usize> {
        self.children
            .iter()
            .skip(from)
            .position(|c| c.kind == kind)
            .map(|rel| from + rel)
    }

    /// The first child of `kind`.
    pub fn child(&self, kind: CharacteristicType) -> Option<&Characteristic> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn children_of(&self, kind: CharacteristicType) -> impl Iterator<Item = &Characteristic> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Drop every parameter of `kind`.
    pub(crate) fn remove_params(&mut self, kind: ParameterType) {
        self.params.retain(|p| p.kind != kind);
    }

    /// Append a transient parameter unless one of `kind` is already present.
    pub(crate) fn add_default(&mut self, kind: ParameterType, value: ParamValue) {
        if !self.has_param(kind) {
            self.params.push(Parameter::transient(kind, value));
        }
    }

    /// Render the tree, one line per node or parameter, indented by depth.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String never fails.
        let _ = self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) -> fmt::Result {
        writeln!(out, "{:indent$}{}", "", self.kind, indent = depth * 2)?;
        for param in &self.params {
            writeln!(out, "{:indent$}{}", "", param, indent = (depth + 1) * 2)?;
        }
        for child in &self.children {
            child.dump_into(out, depth + 1)?;
        }
        Ok(())
    }
}

/// Parse, validate and normalise a provisioning document.
///
/// The returned tree is the `Root` sentinel holding the document's top level characteristics.
pub fn parse_document(markup: &[u8]) -> Result<Characteristic> {
    let mut root = parser::parse(markup)?;

    if validate::validate(&mut root) == validate::Validity::Corrupt {
        return Err(ProvisioningError::corrupt(
            "document has no valid characteristics",
        ));
    }

    global::normalize(&mut root)?;

    if log::log_enabled!(log::Level::Trace) {
        for line in root.dump().lines() {
            trace!("{}", line);
        }
    }

    Ok(root)
}
