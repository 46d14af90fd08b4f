use log::{debug, trace};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::schema::{self, CharacteristicType, ParameterType, ValueKind};
use super::{Characteristic, ParamValue, Parameter};
use crate::err::{ProvisioningError, Result};

const DOCUMENT_ELEMENT: &[u8] = b"wap-provisioningdoc";
const CHARACTERISTIC_ELEMENT: &[u8] = b"characteristic";
const PARM_ELEMENT: &[u8] = b"parm";
const SUPPORTED_VERSION: u64 = 1;

/// One open element of the document.
#[derive(Debug)]
enum Frame {
    /// A characteristic being built, opened at `depth`.
    Tracking {
        node: Characteristic,
        depth: usize,
    },
    /// An element (and all of its descendants) that is skipped.
    Ignoring,
}

/// Build the unvalidated tree for `markup`.
///
/// Unknown or misplaced elements are dropped together with their subtree; only malformed markup
/// or an unsupported document element makes the whole document corrupt.
pub(super) fn parse(markup: &[u8]) -> Result<Characteristic> {
    let mut reader = Reader::from_reader(markup);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Frame> = Vec::new();
    let mut depth = 0_usize;
    let mut seen_document = false;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let element_depth = depth;
                depth += 1;

                if element_depth == 0 {
                    if seen_document {
                        return Err(ProvisioningError::corrupt(
                            "more than one document element",
                        ));
                    }
                    seen_document = true;
                    check_document_element(e)?;
                    stack.push(Frame::Tracking {
                        node: Characteristic::new(CharacteristicType::Root),
                        depth: 0,
                    });
                    continue;
                }

                match e.name().as_ref() {
                    PARM_ELEMENT => parse_parm(&mut stack, e, element_depth)?,
                    CHARACTERISTIC_ELEMENT => {
                        let frame = open_characteristic(&stack, e, element_depth)?;
                        stack.push(frame);
                    }
                    other => {
                        trace!(
                            "ignoring unexpected element `{}`",
                            String::from_utf8_lossy(other)
                        );
                        stack.push(Frame::Ignoring);
                    }
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 || e.name().as_ref() == PARM_ELEMENT {
                    continue;
                }
                close_element(&mut stack)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ProvisioningError::corrupt("document ends inside an element"));
    }

    match stack.pop() {
        Some(Frame::Tracking { node, .. }) if stack.is_empty() => Ok(node),
        _ => Err(ProvisioningError::corrupt("missing document element")),
    }
}

fn check_document_element(e: &BytesStart<'_>) -> Result<()> {
    if e.name().as_ref() != DOCUMENT_ELEMENT {
        return Err(ProvisioningError::corrupt(format!(
            "unexpected document element `{}`",
            String::from_utf8_lossy(e.name().as_ref())
        )));
    }

    if let Some(attr) = e.try_get_attribute("version")? {
        let version = attr.unescape_value()?;
        if leading_integer(&version) != SUPPORTED_VERSION {
            return Err(ProvisioningError::corrupt(format!(
                "unsupported document version `{}`",
                version
            )));
        }
    }

    Ok(())
}

/// Decide whether a `characteristic` element is tracked or skipped.
fn open_characteristic(stack: &[Frame], e: &BytesStart<'_>, depth: usize) -> Result<Frame> {
    let parent = match stack.last() {
        Some(Frame::Tracking { node, .. }) => node,
        _ => return Ok(Frame::Ignoring),
    };

    let Some(attr) = e.try_get_attribute("type")? else {
        debug!("dropping characteristic without a type");
        return Ok(Frame::Ignoring);
    };
    let type_name = attr.unescape_value()?;

    let Some(kind) = CharacteristicType::from_wire(&type_name) else {
        debug!("dropping unknown characteristic `{}`", type_name);
        return Ok(Frame::Ignoring);
    };

    let Some(rule) = schema::child_rule(parent.kind, kind) else {
        debug!("dropping {} not allowed under {}", kind, parent.kind);
        return Ok(Frame::Ignoring);
    };

    if rule.occurrence.is_single() && parent.child(kind).is_some() {
        debug!("dropping repeated {} under {}", kind, parent.kind);
        return Ok(Frame::Ignoring);
    }

    trace!("tracking {} at depth {}", kind, depth);
    Ok(Frame::Tracking {
        node: Characteristic::new(kind),
        depth,
    })
}

/// Attach a `parm` to the characteristic directly enclosing it, when it is acceptable there.
fn parse_parm(stack: &mut [Frame], e: &BytesStart<'_>, depth: usize) -> Result<()> {
    let node = match stack.last_mut() {
        Some(Frame::Tracking {
            node,
            depth: node_depth,
        }) if *node_depth + 1 == depth => node,
        _ => return Ok(()),
    };

    let Some(attr) = e.try_get_attribute("name")? else {
        debug!("dropping parm without a name under {}", node.kind);
        return Ok(());
    };
    let name = attr.unescape_value()?;

    let Some(kind) = ParameterType::from_wire(&name) else {
        debug!("dropping unknown parm `{}` under {}", name, node.kind);
        return Ok(());
    };

    let Some(rule) = schema::parameter_rule(node.kind, kind) else {
        debug!("dropping {} not allowed under {}", kind, node.kind);
        return Ok(());
    };

    if rule.occurrence.is_single() && node.has_param(kind) {
        debug!("dropping repeated {} under {}", kind, node.kind);
        return Ok(());
    }

    let raw = match e.try_get_attribute("value")? {
        Some(attr) => Some(attr.unescape_value()?.into_owned()),
        None => None,
    };

    let value = match (rule.value, raw) {
        (ValueKind::None, _) => ParamValue::None,
        (ValueKind::Uint, Some(raw)) => match parse_unsigned(&raw, 10) {
            Some(value) => ParamValue::Uint(value),
            None => {
                debug!("dropping {} with invalid number `{}`", kind, raw);
                return Ok(());
            }
        },
        (ValueKind::UintHex, Some(raw)) => match parse_unsigned(&raw, 16) {
            Some(value) => ParamValue::Uint(value),
            None => {
                debug!("dropping {} with invalid hex number `{}`", kind, raw);
                return Ok(());
            }
        },
        (ValueKind::Utf8 | ValueKind::Utf8Opt, Some(raw)) => ParamValue::Text(raw),
        (ValueKind::Utf8Opt, None) => ParamValue::None,
        (ValueKind::Uint | ValueKind::UintHex | ValueKind::Utf8, None) => {
            debug!("dropping {} without a value", kind);
            return Ok(());
        }
    };

    node.params.push(Parameter::new(kind, value));
    Ok(())
}

/// Pop the innermost frame, handing a finished characteristic to its parent.
fn close_element(stack: &mut Vec<Frame>) -> Result<()> {
    if stack.len() < 2 {
        return Err(ProvisioningError::corrupt("unbalanced element end"));
    }

    if let Some(Frame::Tracking { node, .. }) = stack.pop() {
        match stack.last_mut() {
            Some(Frame::Tracking { node: parent, .. }) => parent.children.push(node),
            _ => {
                return Err(ProvisioningError::corrupt(
                    "characteristic outside of a tracked parent",
                ));
            }
        }
    }

    Ok(())
}

/// The integer part of a decimal number, as read by a lenient C-style float parser.
fn leading_integer(text: &str) -> u64 {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return 0;
    }
    text[..digits].parse::<u64>().unwrap_or(u64::MAX)
}

/// Parse an unsigned integer the way `strtoul` does: leading whitespace and sign are accepted,
/// parsing stops at the first character that is not a digit, and at least one digit is needed.
fn parse_unsigned(text: &str, radix: u32) -> Option<u32> {
    let text = text.trim_start();
    let (negative, text) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let text = if radix == 16 {
        match text.get(..2) {
            Some("0x" | "0X") if text[2..].starts_with(|c: char| c.is_ascii_hexdigit()) => {
                &text[2..]
            }
            _ => text,
        }
    } else {
        text
    };

    let digits = text.chars().take_while(|c| c.is_digit(radix)).count();
    if digits == 0 {
        return None;
    }

    let value = u64::from_str_radix(&text[..digits], radix).ok()?;
    let value = u32::try_from(value).ok()?;
    match (negative, value) {
        (false, value) => Some(value),
        (true, 0) => Some(0),
        // A negated value wraps to something far above the 32 bit range.
        (true, _) => None,
    }
}
