//! Byte-level tokenization of a script into push operands and literal bytes.

use bitcoin::Script;
use bitcoin::opcodes::all::{OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};
use bitcoin::script::{Instruction, InstructionIndices};

/// A piece of a script as seen by the payload extractors.
///
/// Push opcodes and their length prefixes are framing and never surface as a
/// segment; everything else in the script belongs to exactly one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Operand bytes of a push operation (may be empty for `OP_0`).
    Push(&'a [u8]),
    /// A non-push opcode byte, including `OP_1`..`OP_16` and undefined opcodes.
    Opcode(u8),
    /// The remainder of the script starting at a push whose operand runs past
    /// the end of the script.
    Trailing(&'a [u8]),
}

/// Iterator over the [`Segment`]s of a script, in script order.
///
/// Uses the non-minimal instruction parser so that oddly encoded pushes found
/// in historical scripts are still recognized as pushes.
pub struct Segments<'a> {
    bytes: &'a [u8],
    instructions: InstructionIndices<'a>,
    cursor: usize,
    finished: bool,
}

impl<'a> Segments<'a> {
    fn new(script: &'a Script) -> Self {
        Self {
            bytes: script.as_bytes(),
            instructions: script.instruction_indices(),
            cursor: 0,
            finished: false,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.instructions.next() {
            Some(Ok((index, Instruction::PushBytes(push)))) => {
                let operand = push.as_bytes();
                self.cursor = index + framing_len(self.bytes[index]) + operand.len();
                Some(Segment::Push(operand))
            }
            Some(Ok((index, Instruction::Op(opcode)))) => {
                self.cursor = index + 1;
                Some(Segment::Opcode(opcode.to_u8()))
            }
            Some(Err(_)) => {
                // The parser stops at the first push it cannot complete.
                self.finished = true;
                Some(Segment::Trailing(&self.bytes[self.cursor..]))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

/// Number of framing bytes (opcode plus length prefix) in front of a push operand.
fn framing_len(opcode: u8) -> usize {
    match opcode {
        op if op == OP_PUSHDATA1.to_u8() => 2,
        op if op == OP_PUSHDATA2.to_u8() => 3,
        op if op == OP_PUSHDATA4.to_u8() => 5,
        _ => 1,
    }
}

/// Splits `script` into push operands, literal opcode bytes and an optional
/// truncated tail.
pub fn script_segments(script: &Script) -> Segments<'_> {
    Segments::new(script)
}
