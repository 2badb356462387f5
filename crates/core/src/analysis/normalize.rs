//! Disassembly normalization.
//!
//! Turns objdump-style text into a [`Listing`]: one classified entry per line,
//! the instruction records in order, basic blocks and the set of function names.
//! Every detector consumes the listing by reference instead of re-splitting text.
//!
//! Malformed or empty input never fails; it simply yields no instructions.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Mnemonics that end a basic block and contribute two control edges.
pub const CONDITIONAL_BRANCHES: [&str; 10] =
    ["je", "jne", "jz", "jnz", "jg", "jge", "jl", "jle", "ja", "jb"];

/// Mnemonics that end a basic block and contribute one control edge.
pub const UNCONDITIONAL_TRANSFERS: [&str; 2] = ["jmp", "ret"];

fn angle_target_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(.+?)>").expect("static regex"))
}

/// One decoded instruction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    /// Trimmed line text.
    pub raw: String,
    pub mnemonic: String,
    pub operands: String,
    /// Function label the instruction appears under, if any was seen yet.
    pub label: Option<String>,
}

/// How a control-transfer mnemonic affects block segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTransfer {
    Conditional,
    Unconditional,
    None,
}

impl InstructionRecord {
    pub fn control_transfer(&self) -> ControlTransfer {
        let m = self.mnemonic.as_str();
        if CONDITIONAL_BRANCHES.contains(&m) {
            ControlTransfer::Conditional
        } else if UNCONDITIONAL_TRANSFERS.contains(&m) {
            ControlTransfer::Unconditional
        } else {
            ControlTransfer::None
        }
    }
}

/// Classification of a single listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `<name>:` function boundary.
    Label(String),
    /// Index into [`Listing::instructions`].
    Instruction(usize),
    Other,
}

/// A contiguous run of instructions, stored as indices into the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicBlock {
    pub instructions: Vec<usize>,
}

impl BasicBlock {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Shared, immutable view of one disassembly listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    text: String,
    lines: Vec<String>,
    kinds: Vec<LineKind>,
    instructions: Vec<InstructionRecord>,
    blocks: Vec<BasicBlock>,
    functions: BTreeSet<String>,
}

impl Listing {
    /// Normalize raw disassembly text.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let mut kinds = Vec::with_capacity(lines.len());
        let mut instructions = Vec::new();
        let mut blocks = Vec::new();
        let mut functions = BTreeSet::new();
        let mut current = BasicBlock::default();
        let mut current_label: Option<String> = None;

        for line in &lines {
            let trimmed = line.trim();

            if let Some(name) = parse_label(trimmed) {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                functions.insert(name.clone());
                current_label = Some(name.clone());
                kinds.push(LineKind::Label(name));
                continue;
            }

            let Some((mnemonic, operands)) = split_instruction(trimmed) else {
                kinds.push(LineKind::Other);
                continue;
            };

            let record = InstructionRecord {
                raw: trimmed.to_string(),
                mnemonic,
                operands,
                label: current_label.clone(),
            };
            let ends_block = record.control_transfer() != ControlTransfer::None;
            let idx = instructions.len();
            instructions.push(record);
            current.instructions.push(idx);
            kinds.push(LineKind::Instruction(idx));

            if ends_block {
                blocks.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }

        Self { text: text.to_string(), lines, kinds, instructions, blocks, functions }
    }

    /// Original text, for whole-text keyword counts.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Untrimmed lines of the original text (split on `\n`).
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn kinds(&self) -> &[LineKind] {
        &self.kinds
    }

    pub fn instructions(&self) -> &[InstructionRecord] {
        &self.instructions
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn functions(&self) -> &BTreeSet<String> {
        &self.functions
    }

    /// Iterate lines together with their classification.
    pub fn classified_lines(&self) -> impl Iterator<Item = (&str, &LineKind)> {
        self.lines.iter().map(String::as_str).zip(self.kinds.iter())
    }

    pub fn is_instruction_line(&self, index: usize) -> bool {
        matches!(self.kinds.get(index), Some(LineKind::Instruction(_)))
    }
}

/// Extract the first `<...>` name on a line, if any.
pub fn angle_target(line: &str) -> Option<&str> {
    angle_target_re().captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn parse_label(trimmed: &str) -> Option<String> {
    if trimmed.contains('<') && trimmed.contains(">:") {
        angle_target(trimmed).map(str::to_string)
    } else {
        None
    }
}

/// Split an `addr:\tinsn` (or objdump's `addr:\tbytes\tinsn`) line.
fn split_instruction(trimmed: &str) -> Option<(String, String)> {
    if !trimmed.contains(':') || !trimmed.contains('\t') {
        return None;
    }
    let fields: Vec<&str> = trimmed.split('\t').collect();
    let insn = match fields.len() {
        0 | 1 => return None,
        2 if is_byte_column(fields[1]) => return None,
        2 => fields[1],
        _ => fields[2],
    };
    let insn = insn.trim();
    let mut parts = insn.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().filter(|m| !m.is_empty())?;
    let operands = parts.next().unwrap_or("").trim();
    Some((mnemonic.to_string(), operands.to_string()))
}

fn is_byte_column(field: &str) -> bool {
    let mut tokens = field.split_whitespace().peekable();
    tokens.peek().is_some()
        && tokens.all(|t| t.len() == 2 && t.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objdump_three_field_lines_use_the_instruction_column() {
        let listing = Listing::parse("  401000:\t48 89 e5             \tmov    rbp,rsp\n");
        assert_eq!(listing.instructions().len(), 1);
        assert_eq!(listing.instructions()[0].mnemonic, "mov");
        assert_eq!(listing.instructions()[0].operands, "rbp,rsp");
    }

    #[test]
    fn byte_continuation_lines_are_ignored() {
        let listing = Listing::parse("  401005:\t00 00 00 \n");
        assert!(listing.instructions().is_empty());
    }

    #[test]
    fn labels_flush_the_open_block() {
        let text = "<a>:\n 1:\tmov eax, 1\n<b>:\n 2:\tmov ebx, 2\n";
        let listing = Listing::parse(text);
        assert_eq!(listing.blocks().len(), 2);
        assert_eq!(listing.instructions()[1].label.as_deref(), Some("b"));
    }
}
