//! Signal classification
//!
//! Groups the signal addresses of a test case into CONTROL, ASSESS and
//! COMMAND, and pre-computes the set of circuit breakers once per test case.
//! Nothing downstream of this module inspects address text.

use crate::types::{FatError, GroupType, Result, SignalAddress};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Default breaker naming conventions: `QA<digit>` device names and the
/// IEC 61850 `XCBR` logical-node class
pub const DEFAULT_BREAKER_PATTERNS: &[&str] = &[r"QA\d", "XCBR"];

/// Signal addresses of one test case, grouped by role
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGroups {
    control: Vec<SignalAddress>,
    assess: SignalAddress,
    command: Option<SignalAddress>,
}

impl SignalGroups {
    /// Build groups from explicit parts
    ///
    /// CONTROL keeps the order given here; it is the fallback order for every
    /// step without a breaker transition.
    pub fn new(
        control: Vec<SignalAddress>,
        assess: SignalAddress,
        command: Option<SignalAddress>,
    ) -> Result<Self> {
        if control.is_empty() {
            return Err(FatError::InvalidGroups("CONTROL group is empty".to_string()));
        }

        let mut seen = HashSet::new();
        let all = control.iter().chain(Some(&assess)).chain(command.as_ref());
        for address in all {
            if !seen.insert(address) {
                return Err(FatError::InvalidGroups(format!(
                    "signal {} classified more than once",
                    address
                )));
            }
        }

        Ok(Self {
            control,
            assess,
            command,
        })
    }

    /// Build groups from `(address, group)` pairs in input order
    pub fn from_classified<I>(signals: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SignalAddress, GroupType)>,
    {
        let mut control = Vec::new();
        let mut assess = Vec::new();
        let mut command = Vec::new();

        for (address, group) in signals {
            match group {
                GroupType::Control => control.push(address),
                GroupType::Assess => assess.push(address),
                GroupType::Command => command.push(address),
            }
        }

        if assess.len() != 1 {
            return Err(FatError::InvalidGroups(format!(
                "expected exactly one ASSESS signal, found {}",
                assess.len()
            )));
        }
        if command.len() > 1 {
            return Err(FatError::InvalidGroups(format!(
                "expected at most one COMMAND signal, found {}",
                command.len()
            )));
        }

        let assess = assess.remove(0);
        Self::new(control, assess, command.pop())
    }

    /// CONTROL signals in grouped (input) order
    pub fn control(&self) -> &[SignalAddress] {
        &self.control
    }

    /// The ASSESS signal
    pub fn assess(&self) -> &SignalAddress {
        &self.assess
    }

    /// The COMMAND signal, if the test case has one
    pub fn command(&self) -> Option<&SignalAddress> {
        self.command.as_ref()
    }

    /// Group of an address, if it belongs to this test case
    pub fn group_of(&self, address: &SignalAddress) -> Option<GroupType> {
        if self.control.contains(address) {
            Some(GroupType::Control)
        } else if &self.assess == address {
            Some(GroupType::Assess)
        } else if self.command.as_ref() == Some(address) {
            Some(GroupType::Command)
        } else {
            None
        }
    }

    /// `(group, addresses)` pairs for the document's `signalGroups` block
    pub fn metadata(&self) -> Vec<(GroupType, Vec<SignalAddress>)> {
        vec![
            (GroupType::Control, self.control.clone()),
            (GroupType::Assess, vec![self.assess.clone()]),
            (GroupType::Command, self.command.iter().cloned().collect()),
        ]
    }
}

/// Circuit-breaker-type CONTROL signals of a test case
///
/// Iteration is in address order so every consumer is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakerSet {
    breakers: BTreeSet<SignalAddress>,
}

impl BreakerSet {
    /// An empty breaker set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Select the CONTROL signals accepted by `is_breaker`
    pub fn from_predicate<F>(groups: &SignalGroups, is_breaker: F) -> Self
    where
        F: Fn(&SignalAddress) -> bool,
    {
        Self {
            breakers: groups
                .control()
                .iter()
                .filter(|a| is_breaker(a))
                .cloned()
                .collect(),
        }
    }

    /// Use an explicit list of breaker addresses; each must be a CONTROL signal
    pub fn from_addresses<I>(groups: &SignalGroups, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = SignalAddress>,
    {
        let mut breakers = BTreeSet::new();
        for address in addresses {
            if groups.group_of(&address) != Some(GroupType::Control) {
                return Err(FatError::InvalidGroups(format!(
                    "breaker {} is not a CONTROL signal",
                    address
                )));
            }
            breakers.insert(address);
        }
        Ok(Self { breakers })
    }

    pub fn contains(&self, address: &SignalAddress) -> bool {
        self.breakers.contains(address)
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalAddress> {
        self.breakers.iter()
    }
}

/// Regex-based breaker naming convention
#[derive(Debug, Clone)]
pub struct BreakerPattern {
    patterns: Vec<Regex>,
}

impl BreakerPattern {
    /// Compile the given patterns; an address matching any of them is a breaker
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| FatError::InvalidBreakerPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// True if the address follows a breaker naming convention
    pub fn is_breaker(&self, address: &SignalAddress) -> bool {
        self.patterns.iter().any(|re| re.is_match(address.as_str()))
    }

    /// Pre-compute the breaker set of a test case
    pub fn breaker_set(&self, groups: &SignalGroups) -> BreakerSet {
        BreakerSet::from_predicate(groups, |a| self.is_breaker(a))
    }
}

impl Default for BreakerPattern {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_BREAKER_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

/// Device-under-test identifier: the ASSESS address up to the first `/`
pub fn dut_from_assess(assess: &SignalAddress) -> &str {
    assess
        .as_str()
        .split('/')
        .next()
        .unwrap_or_else(|| assess.as_str())
}

/// Parent IED of the DUT: the first IED name contained in the DUT identifier,
/// or the DUT identifier itself when none matches
pub fn resolve_parent<S: AsRef<str>>(ieds: &[S], dut: &str) -> String {
    match ieds.iter().find(|ied| dut.contains(ied.as_ref())) {
        Some(ied) => ied.as_ref().to_string(),
        None => {
            if !ieds.is_empty() {
                log::warn!("No parent IED matches DUT {}, using DUT as parent", dut);
            }
            dut.to_string()
        }
    }
}
