//! Heuristic obfuscation and anti-analysis detectors.
//!
//! Each [`Rule`] is a pure function of the normalized listing (plus the
//! section-header listing for packer markers) producing a [`Finding`]. The
//! keyword sets and thresholds are fixed: results are only comparable with
//! earlier benchmark runs if they stay exactly as they are.

use serde::{Deserialize, Serialize};

use crate::analysis::normalize::Listing;

pub const ANTI_DEBUG_KEYWORDS: [&str; 6] = [
    "ptrace",
    "IsDebuggerPresent",
    "CheckRemoteDebuggerPresent",
    "NtQueryInformationProcess",
    "int 0x2d",
    "int 0x3",
];
/// Matched case-insensitively.
pub const ANTI_VM_KEYWORDS: [&str; 5] = ["cpuid", "vmware", "virtualbox", "qemu", "rdtsc"];
pub const ANTI_DUMP_KEYWORDS: [&str; 2] = ["VirtualProtect", "mprotect"];
pub const SELF_MODIFYING_KEYWORDS: [&str; 3] = ["modify", "decrypt", "unpack"];
/// Matched case-insensitively.
pub const CRYPTO_MNEMONICS: [&str; 5] = ["xor", "rol", "ror", "shl", "shr"];
/// Matched case-insensitively.
pub const INTERPRETER_KEYWORDS: [&str; 4] = ["fetch", "decode", "dispatch", "handler"];

pub const FLATTENING_MIN_DISPATCHERS: usize = 4;
pub const DISPATCHER_LOOKBACK_LINES: usize = 5;
pub const BOGUS_MIN_OCCURRENCES: usize = 6;
pub const ENCRYPTION_MIN_OPERATIONS: usize = 101;
pub const VIRTUALIZATION_MIN_KEYWORDS: usize = 4;
pub const VIRTUALIZATION_MIN_COMPUTED_JUMPS: usize = 51;

/// Inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct DetectorInput<'a> {
    pub listing: &'a Listing,
    /// Section-header listing (`readelf -S`), empty when unavailable.
    pub section_headers: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    OpaquePredicates,
    ControlFlowFlattening,
    BogusControlFlow,
    AntiDebug,
    AntiVm,
    AntiDump,
    SelfModifyingCode,
    Packing,
    Encryption,
    Virtualization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finding {
    Count(u64),
    Flag(bool),
}

impl Finding {
    pub fn count(self) -> u64 {
        match self {
            Finding::Count(n) => n,
            Finding::Flag(b) => b as u64,
        }
    }

    pub fn flag(self) -> bool {
        match self {
            Finding::Count(n) => n > 0,
            Finding::Flag(b) => b,
        }
    }
}

impl Rule {
    pub const ALL: [Rule; 10] = [
        Rule::OpaquePredicates,
        Rule::ControlFlowFlattening,
        Rule::BogusControlFlow,
        Rule::AntiDebug,
        Rule::AntiVm,
        Rule::AntiDump,
        Rule::SelfModifyingCode,
        Rule::Packing,
        Rule::Encryption,
        Rule::Virtualization,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rule::OpaquePredicates => "opaque_predicates",
            Rule::ControlFlowFlattening => "control_flow_flattening",
            Rule::BogusControlFlow => "bogus_control_flow",
            Rule::AntiDebug => "anti_debug",
            Rule::AntiVm => "anti_vm",
            Rule::AntiDump => "anti_dump",
            Rule::SelfModifyingCode => "self_modifying_code",
            Rule::Packing => "packing",
            Rule::Encryption => "encryption",
            Rule::Virtualization => "virtualization",
        }
    }

    pub fn evaluate(self, input: &DetectorInput<'_>) -> Finding {
        let listing = input.listing;
        match self {
            Rule::OpaquePredicates => Finding::Count(opaque_predicates(listing)),
            Rule::ControlFlowFlattening => {
                Finding::Flag(dispatcher_patterns(listing) >= FLATTENING_MIN_DISPATCHERS)
            }
            Rule::BogusControlFlow => {
                Finding::Flag(jumps_followed_by_code(listing) >= BOGUS_MIN_OCCURRENCES)
            }
            Rule::AntiDebug => {
                Finding::Count(count_all(listing.text(), &ANTI_DEBUG_KEYWORDS) as u64)
            }
            Rule::AntiVm => Finding::Count(count_all_ci(listing.text(), &ANTI_VM_KEYWORDS) as u64),
            Rule::AntiDump => Finding::Count(
                listing
                    .lines()
                    .iter()
                    .filter(|l| ANTI_DUMP_KEYWORDS.iter().any(|k| l.contains(k)))
                    .count() as u64,
            ),
            Rule::SelfModifyingCode => {
                Finding::Flag(SELF_MODIFYING_KEYWORDS.iter().any(|k| listing.text().contains(k)))
            }
            Rule::Packing => Finding::Flag(
                input.section_headers.contains("UPX")
                    || input.section_headers.to_lowercase().contains("packed"),
            ),
            Rule::Encryption => Finding::Flag(
                count_all_ci(listing.text(), &CRYPTO_MNEMONICS) >= ENCRYPTION_MIN_OPERATIONS,
            ),
            Rule::Virtualization => {
                let text = listing.text();
                let vocabulary = count_all_ci(text, &INTERPRETER_KEYWORDS);
                let computed_jumps = text.matches("jmp").count() + text.matches('*').count();
                Finding::Flag(
                    vocabulary >= VIRTUALIZATION_MIN_KEYWORDS
                        || computed_jumps >= VIRTUALIZATION_MIN_COMPUTED_JUMPS,
                )
            }
        }
    }
}

/// Findings of every rule for one input, in [`Rule::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Findings(Vec<(Rule, Finding)>);

impl Findings {
    pub fn evaluate(input: &DetectorInput<'_>) -> Self {
        Self(Rule::ALL.iter().map(|rule| (*rule, rule.evaluate(input))).collect())
    }

    pub fn get(&self, rule: Rule) -> Finding {
        self.0
            .iter()
            .find(|(r, _)| *r == rule)
            .map(|(_, f)| *f)
            .unwrap_or(Finding::Count(0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Rule, Finding)> {
        self.0.iter()
    }
}

/// `cmp` lines whose two operands are textually identical.
fn opaque_predicates(listing: &Listing) -> u64 {
    listing
        .lines()
        .iter()
        .filter(|line| line.contains("cmp"))
        .filter(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 2 {
                return false;
            }
            let left = parts[0].split_whitespace().last().unwrap_or("");
            left == parts[1].trim()
        })
        .count() as u64
}

/// Indirect jumps with a comparison in the preceding few lines.
fn dispatcher_patterns(listing: &Listing) -> usize {
    let lines = listing.lines();
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains("jmp") && line.contains('*'))
        .filter(|(i, _)| {
            let start = i.saturating_sub(DISPATCHER_LOOKBACK_LINES);
            lines[start..*i].iter().any(|l| l.contains("cmp"))
        })
        .count()
}

/// Symbolic jumps directly followed by another instruction line.
fn jumps_followed_by_code(listing: &Listing) -> usize {
    listing
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains("jmp") && line.contains('<'))
        .filter(|(i, _)| listing.is_instruction_line(i + 1))
        .count()
}

fn count_all(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|k| text.matches(k).count()).sum()
}

fn count_all_ci(text: &str, keywords: &[&str]) -> usize {
    let lower = text.to_lowercase();
    keywords.iter().map(|k| lower.matches(&k.to_lowercase()).count()).sum()
}
