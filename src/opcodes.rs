//! Bytecode opcodes for the compiled pattern program

/// Max bound that means "no upper limit" in a quantifier
pub const UNBOUNDED: u8 = 255;

/// Instruction kinds, decoded from the tag byte at the start of every instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Succeeds only at input offset 0
    AnchorStart,
    /// Succeeds only at the end of input
    AnchorEnd,
    /// Succeeds at a word/non-word transition or an input edge
    AnchorWord,
    /// Byte range set (followed by length byte and range pairs)
    CharClass,
    /// Complemented byte range set
    CharClassInv,
    /// Greedy repetition (followed by min, max and one sub-pattern)
    Quantifier,
    /// Two branches separated by a skip byte
    Alternation,
    /// Ordered children (followed by length byte)
    Sequence,
    /// Any single byte
    Dot,
    /// Zero-width check of one sub-pattern
    PositiveLookahead,
    /// Records the span of one sub-pattern (followed by group index)
    CapturingGroup,
    /// Every other tag matches itself
    Literal(u8),
}

impl Opcode {
    /// Decode a tag byte. Never fails: unreserved bytes are literals.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Opcode::AnchorStart,
            2 => Opcode::AnchorEnd,
            3 => Opcode::AnchorWord,
            4 => Opcode::CharClass,
            5 => Opcode::CharClassInv,
            6 => Opcode::Quantifier,
            7 => Opcode::Alternation,
            8 => Opcode::Sequence,
            9 => Opcode::Dot,
            10 => Opcode::PositiveLookahead,
            11 => Opcode::CapturingGroup,
            other => Opcode::Literal(other),
        }
    }

    /// Convert opcode to its tag byte
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::AnchorStart => 1,
            Opcode::AnchorEnd => 2,
            Opcode::AnchorWord => 3,
            Opcode::CharClass => 4,
            Opcode::CharClassInv => 5,
            Opcode::Quantifier => 6,
            Opcode::Alternation => 7,
            Opcode::Sequence => 8,
            Opcode::Dot => 9,
            Opcode::PositiveLookahead => 10,
            Opcode::CapturingGroup => 11,
            Opcode::Literal(byte) => byte,
        }
    }

    /// True if `byte` is taken by a structural opcode and cannot be a literal
    pub fn is_reserved(byte: u8) -> bool {
        (1..=11).contains(&byte)
    }
}
