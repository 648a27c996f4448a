//! Symbolic names for numeric protocol codes.
//!
//! Decoders present codes such as ethertypes, ICMP types or ARP opcodes through name tables: a
//! code found in its table is shown by name, anything else passes through as the bare number.

use core::fmt;
use std::collections::BTreeSet;

use serde::Serialize;

/// Code to name table.
pub type NameTable<T> = [(T, &'static str)];

/// Per-type code tables, e.g. ICMP codes keyed by ICMP type.
pub type CodeTables<K, T> = [(K, &'static NameTable<T>)];

/// A code shown by name when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Label<T> {
    Name(&'static str),
    Code(T),
}

impl<T: Copy + PartialEq> Label<T> {
    pub fn lookup(table: &NameTable<T>, code: T) -> Self {
        table
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Label::Code(code), |&(_, name)| Label::Name(name))
    }

    /// Looks `code` up in the table registered for `key`. Codes of unlisted keys pass through.
    pub fn lookup_keyed<K: PartialEq>(tables: &CodeTables<K, T>, key: K, code: T) -> Self {
        tables
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(Label::Code(code), |(_, table)| Self::lookup(table, code))
    }

    pub fn name(&self) -> Option<&'static str> {
        match self {
            Label::Name(name) => Some(*name),
            Label::Code(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Label<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Name(name) => f.write_str(name),
            Label::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Names of the flags set in a flag word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagSet(BTreeSet<&'static str>);

impl FlagSet {
    /// Collects every name in `table` whose bit (counted from the least significant bit) is set
    /// in `value`.
    pub fn from_bits(value: u32, table: &[(&'static str, u8)]) -> Self {
        Self(
            table
                .iter()
                .filter(|(_, bit)| *bit < 32 && (value >> *bit) & 1 == 1)
                .map(|(name, _)| *name)
                .collect(),
        )
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }
}

impl<const N: usize> From<[&'static str; N]> for FlagSet {
    fn from(flags: [&'static str; N]) -> Self {
        Self(flags.into_iter().collect())
    }
}
