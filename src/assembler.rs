//! Assembling node trees into bytecode and back
//!
//! Parsing pattern text is left to callers; this module only lowers an already built
//! tree, filling in the length and skip bytes the matcher relies on.

use std::fmt;

use crate::{
    error::AssembleError,
    opcodes::{Opcode, UNBOUNDED},
    Program, DEFAULT_MAX_DEPTH,
};

type Result<T> = std::result::Result<T, AssembleError>;

/// Pattern tree that maps one-to-one onto instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Match one exact byte
    Literal(u8),
    /// Match any byte
    Dot,
    /// `^`
    AnchorStart,
    /// `$`
    AnchorEnd,
    /// `\b`
    AnchorWord,
    /// Byte ranges, inclusive on both ends
    Class {
        /// Match bytes outside the ranges instead
        inverted: bool,
        /// `(low, high)` pairs
        ranges: Vec<(u8, u8)>,
    },
    /// Children matched one after another
    Sequence(Vec<Node>),
    /// Greedy repetition; `max == None` means unbounded
    Quantifier {
        /// Mandatory repetitions
        min: u8,
        /// Upper bound, at most 254
        max: Option<u8>,
        /// Repeated pattern
        body: Box<Node>,
    },
    /// Left branch, tried first, then right
    Alternation(Box<Node>, Box<Node>),
    /// Zero-width positive lookahead
    Lookahead(Box<Node>),
    /// Capture the span matched by `body` into slot `index`
    Group {
        /// Capture slot
        index: u8,
        /// Captured pattern
        body: Box<Node>,
    },
}

impl Node {
    /// Sequence of literals spelling `bytes`
    pub fn literals(bytes: &[u8]) -> Self {
        Node::Sequence(bytes.iter().copied().map(Node::Literal).collect())
    }

    /// Class matching any byte in `ranges`
    pub fn class(ranges: &[(u8, u8)]) -> Self {
        Node::Class {
            inverted: false,
            ranges: ranges.to_vec(),
        }
    }

    /// Class matching any byte outside `ranges`
    pub fn inverted_class(ranges: &[(u8, u8)]) -> Self {
        Node::Class {
            inverted: true,
            ranges: ranges.to_vec(),
        }
    }

    /// `body{min,max}`
    pub fn repeat(body: Node, min: u8, max: Option<u8>) -> Self {
        Node::Quantifier {
            min,
            max,
            body: Box::new(body),
        }
    }

    /// `body*`
    pub fn star(body: Node) -> Self {
        Self::repeat(body, 0, None)
    }

    /// `body+`
    pub fn plus(body: Node) -> Self {
        Self::repeat(body, 1, None)
    }

    /// `body?`
    pub fn optional(body: Node) -> Self {
        Self::repeat(body, 0, Some(1))
    }

    /// `left|right`
    pub fn alt(left: Node, right: Node) -> Self {
        Node::Alternation(Box::new(left), Box::new(right))
    }

    /// `(?=body)`
    pub fn lookahead(body: Node) -> Self {
        Node::Lookahead(Box::new(body))
    }

    /// Capture group number `index`
    pub fn group(index: u8, body: Node) -> Self {
        Node::Group {
            index,
            body: Box::new(body),
        }
    }
}

/// Bytecode emitter
struct Assembler {
    buffer: Vec<u8>,
}

impl Assembler {
    /// Store a byte in the output buffer
    fn store(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    fn store_opcode(&mut self, opcode: Opcode) {
        self.store(opcode.to_byte());
    }

    /// Store a placeholder length byte and return its offset
    fn reserve_len(&mut self) -> usize {
        let offset = self.buffer.len();
        self.store(0);
        offset
    }

    /// Patch the length byte at `offset` so that `offset + len` is the current end
    fn put_len(&mut self, offset: usize, construct: &'static str) -> Result<()> {
        let len = self.buffer.len() - offset;
        self.buffer[offset] =
            u8::try_from(len).map_err(|_| AssembleError::OperandTooLong { construct, len })?;
        Ok(())
    }

    fn emit(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Literal(byte) if Opcode::is_reserved(*byte) => {
                // The tag would be read as an opcode, so spell it as a one-byte class
                self.store_opcode(Opcode::CharClass);
                self.store(3);
                self.store(*byte);
                self.store(*byte);
            }
            Node::Literal(byte) => self.store_opcode(Opcode::Literal(*byte)),
            Node::Dot => self.store_opcode(Opcode::Dot),
            Node::AnchorStart => self.store_opcode(Opcode::AnchorStart),
            Node::AnchorEnd => self.store_opcode(Opcode::AnchorEnd),
            Node::AnchorWord => self.store_opcode(Opcode::AnchorWord),
            Node::Class { inverted, ranges } => {
                self.store_opcode(if *inverted {
                    Opcode::CharClassInv
                } else {
                    Opcode::CharClass
                });
                let len_at = self.reserve_len();
                for &(low, high) in ranges {
                    if low > high {
                        return Err(AssembleError::InvalidRange { low, high });
                    }
                    self.store(low);
                    self.store(high);
                }
                self.put_len(len_at, "class")?;
            }
            Node::Sequence(children) => {
                self.store_opcode(Opcode::Sequence);
                let len_at = self.reserve_len();
                for child in children {
                    self.emit(child)?;
                }
                self.put_len(len_at, "sequence")?;
            }
            Node::Quantifier { min, max, body } => {
                let max = match *max {
                    Some(max) if max == UNBOUNDED || max < *min => {
                        return Err(AssembleError::InvalidBounds { min: *min, max });
                    }
                    Some(max) => max,
                    None => UNBOUNDED,
                };
                self.store_opcode(Opcode::Quantifier);
                self.store(*min);
                self.store(max);
                self.emit(body)?;
            }
            Node::Alternation(left, right) => {
                self.store_opcode(Opcode::Alternation);
                self.emit(left)?;
                let skip_at = self.reserve_len();
                self.emit(right)?;
                self.put_len(skip_at, "alternation")?;
            }
            Node::Lookahead(body) => {
                self.store_opcode(Opcode::PositiveLookahead);
                self.emit(body)?;
            }
            Node::Group { index, body } => {
                self.store_opcode(Opcode::CapturingGroup);
                self.store(*index);
                self.emit(body)?;
            }
        }
        Ok(())
    }
}

/// Lower a node tree into a program
pub fn assemble(node: &Node) -> Result<Program> {
    let mut assembler = Assembler { buffer: Vec::new() };
    assembler.emit(node)?;
    Ok(Program::from_bytes(assembler.buffer))
}

/// Bytecode reader that rebuilds the node tree
struct Disassembler<'p> {
    program: &'p [u8],
    pos: usize,
    depth: usize,
}

impl Disassembler<'_> {
    fn next_byte(&mut self) -> Result<u8> {
        let byte = self
            .program
            .get(self.pos)
            .copied()
            .ok_or(AssembleError::Truncated { pc: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    /// End of a length-prefixed region whose length byte was just read at `pos - 1`
    fn region_end(&self, len: u8) -> Result<usize> {
        let end = self.pos - 1 + len as usize;
        if end > self.program.len() {
            return Err(AssembleError::Truncated {
                pc: self.program.len(),
            });
        }
        Ok(end)
    }

    fn parse_boxed(&mut self) -> Result<Box<Node>> {
        self.parse().map(Box::new)
    }

    fn parse(&mut self) -> Result<Node> {
        if self.depth >= DEFAULT_MAX_DEPTH {
            return Err(AssembleError::TooComplex);
        }
        self.depth += 1;
        let node = self.parse_instruction();
        self.depth -= 1;
        node
    }

    fn parse_instruction(&mut self) -> Result<Node> {
        let node = match Opcode::from_byte(self.next_byte()?) {
            Opcode::AnchorStart => Node::AnchorStart,
            Opcode::AnchorEnd => Node::AnchorEnd,
            Opcode::AnchorWord => Node::AnchorWord,
            Opcode::Dot => Node::Dot,
            Opcode::Literal(byte) => Node::Literal(byte),
            opcode @ (Opcode::CharClass | Opcode::CharClassInv) => {
                let len = self.next_byte()?;
                let end = self.region_end(len)?;
                let ranges = self.program[self.pos.min(end)..end]
                    .chunks_exact(2)
                    .map(|range| (range[0], range[1]))
                    .collect();
                self.pos = end;
                Node::Class {
                    inverted: opcode == Opcode::CharClassInv,
                    ranges,
                }
            }
            Opcode::Sequence => {
                let len = self.next_byte()?;
                let end = self.region_end(len)?;
                let mut children = Vec::new();
                while self.pos < end {
                    children.push(self.parse()?);
                }
                self.pos = end;
                Node::Sequence(children)
            }
            Opcode::Quantifier => {
                let min = self.next_byte()?;
                let max = self.next_byte()?;
                Node::Quantifier {
                    min,
                    max: (max != UNBOUNDED).then_some(max),
                    body: self.parse_boxed()?,
                }
            }
            Opcode::Alternation => {
                let left = self.parse_boxed()?;
                let skip = self.next_byte()?;
                let end = self.region_end(skip)?;
                let right = self.parse_boxed()?;
                self.pos = end;
                Node::Alternation(left, right)
            }
            Opcode::PositiveLookahead => Node::Lookahead(self.parse_boxed()?),
            Opcode::CapturingGroup => {
                let index = self.next_byte()?;
                Node::Group {
                    index,
                    body: self.parse_boxed()?,
                }
            }
        };
        Ok(node)
    }
}

/// Decode the instruction at the start of `program`.
///
/// Only the first instruction is decoded, matching what the matcher evaluates; any
/// trailing bytes are ignored. Literals 1–11 come back as the one-byte classes
/// `assemble` emitted for them, not as `Node::Literal`.
pub fn disassemble(program: &[u8]) -> Result<Node> {
    Disassembler {
        program,
        pos: 0,
        depth: 0,
    }
    .parse()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(byte) => write_byte(f, *byte),
            Node::Dot => f.write_str("."),
            Node::AnchorStart => f.write_str("^"),
            Node::AnchorEnd => f.write_str("$"),
            Node::AnchorWord => f.write_str("\\b"),
            Node::Class { inverted, ranges } => {
                f.write_str(if *inverted { "[^" } else { "[" })?;
                for &(low, high) in ranges {
                    write_class_byte(f, low)?;
                    if low != high {
                        f.write_str("-")?;
                        write_class_byte(f, high)?;
                    }
                }
                f.write_str("]")
            }
            Node::Sequence(children) => {
                for child in children {
                    if matches!(child, Node::Alternation(..)) {
                        write!(f, "(?:{child})")?;
                    } else {
                        write!(f, "{child}")?;
                    }
                }
                Ok(())
            }
            Node::Quantifier { min, max, body } => {
                let needs_group = match body.as_ref() {
                    Node::Sequence(children) => children.len() != 1,
                    Node::Alternation(..) | Node::Quantifier { .. } => true,
                    _ => false,
                };
                if needs_group {
                    write!(f, "(?:{body})")?;
                } else {
                    write!(f, "{body}")?;
                }
                match (*min, *max) {
                    (0, None) => f.write_str("*"),
                    (1, None) => f.write_str("+"),
                    (0, Some(1)) => f.write_str("?"),
                    (min, None) => write!(f, "{{{min},}}"),
                    (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
                    (min, Some(max)) => write!(f, "{{{min},{max}}}"),
                }
            }
            Node::Alternation(left, right) => write!(f, "{left}|{right}"),
            Node::Lookahead(body) => write!(f, "(?={body})"),
            Node::Group { index, body } => write!(f, "(?<{index}>{body})"),
        }
    }
}

fn write_byte(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    match byte {
        b'\\' | b'.' | b'^' | b'$' | b'|' | b'?' | b'*' | b'+' | b'(' | b')' | b'[' | b']'
        | b'{' | b'}' => write!(f, "\\{}", byte as char),
        _ if byte.is_ascii_graphic() || byte == b' ' => write!(f, "{}", byte as char),
        _ => write!(f, "\\x{byte:02x}"),
    }
}

fn write_class_byte(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    match byte {
        b'\\' | b']' | b'^' | b'-' => write!(f, "\\{}", byte as char),
        _ if byte.is_ascii_graphic() || byte == b' ' => write!(f, "{}", byte as char),
        _ => write!(f, "\\x{byte:02x}"),
    }
}
