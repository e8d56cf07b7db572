//! The `'$(PSWITCH)'` condition marker.
//!
//! A switched package reference carries `'$(PSWITCH)' == '<target path>'` and
//! the synthetic project reference carries `'$(PSWITCH)' != '<package name>'`.
//! `PSWITCH` is never defined, so the first is always false and the second
//! always true. The strings are the only persisted switch state and must stay
//! byte-for-byte stable.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{SwitchState, SWITCH_PROPERTY};

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'\$\(PSWITCH\)'\s*(?P<op>==|!=)\s*'(?P<value>.+)'").unwrap()
});

/// Parse a `Condition` attribute value into switch metadata.
///
/// Either operator marks the owning reference as switched; anything that does
/// not mention the marker is an ordinary reference.
pub fn parse_condition(condition: &str) -> SwitchState {
    match CONDITION_RE.captures(condition) {
        Some(cap) => SwitchState::switched(&cap["value"]),
        None => SwitchState::default(),
    }
}

/// Condition that keeps a package reference inert while switched to `target_path`.
pub fn disabling_condition(target_path: &str) -> String {
    format!("'$({SWITCH_PROPERTY})' == '{target_path}'")
}

/// Condition that keeps the synthetic project reference active, naming the package it replaces.
pub fn enabling_condition(package_name: &str) -> String {
    format!("'$({SWITCH_PROPERTY})' != '{package_name}'")
}
