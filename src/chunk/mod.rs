use crate::value::Value;

// ── Opcodes ──────────────────────────────────────────────────────────
//
// One byte per opcode. CONSTANT / CONSTANT_LONG carry one trailing byte,
// the constant-pool index; everything else is a one-byte simple instruction.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Return = 0,
    Constant = 1,
    ConstantLong = 2,
    Negate = 3,
    Add = 4,
    Multiply = 5,
    Subtract = 6,
    Divide = 7,
    Equal = 8,
    NotEqual = 9,
    Lt = 10,
    Le = 11,
    Gt = 12,
    Ge = 13,
    Error = 14,
    Not = 15,
}

impl OpCode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Return => "RETURN",
            OpCode::Constant => "CONSTANT",
            OpCode::ConstantLong => "CONSTANT_LONG",
            OpCode::Negate => "NEGATE",
            OpCode::Add => "ADD",
            OpCode::Multiply => "MULTIPLY",
            OpCode::Subtract => "SUBTRACT",
            OpCode::Divide => "DIVIDE",
            OpCode::Equal => "EQUAL",
            OpCode::NotEqual => "NOT_EQUAL",
            OpCode::Lt => "LT",
            OpCode::Le => "LE",
            OpCode::Gt => "GT",
            OpCode::Ge => "GE",
            OpCode::Error => "ERROR",
            OpCode::Not => "NOT",
        }
    }

    /// Encoded width in bytes, opcode included.
    pub fn width(self) -> usize {
        match self {
            OpCode::Constant | OpCode::ConstantLong => 2,
            _ => 1,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    #[inline(always)]
    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            0 => OpCode::Return,
            1 => OpCode::Constant,
            2 => OpCode::ConstantLong,
            3 => OpCode::Negate,
            4 => OpCode::Add,
            5 => OpCode::Multiply,
            6 => OpCode::Subtract,
            7 => OpCode::Divide,
            8 => OpCode::Equal,
            9 => OpCode::NotEqual,
            10 => OpCode::Lt,
            11 => OpCode::Le,
            12 => OpCode::Gt,
            13 => OpCode::Ge,
            14 => OpCode::Error,
            15 => OpCode::Not,
            other => return Err(other),
        })
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.mnemonic())
    }
}

// ── Chunk ────────────────────────────────────────────────────────────

/// Constant-pool indices are encoded in a single byte, so a chunk holds at
/// most this many constants.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChunkError {
    #[error("constant pool is full ({} entries)", MAX_CONSTANTS)]
    ConstantPoolFull,
}

/// Compiled bytecode: instruction bytes, the constant pool they index into,
/// and a run-length-encoded source line table.
///
/// Each line-table entry packs `line | run_length << 16` into a `u32` and
/// covers `run_length` consecutive instruction bytes. The run lengths always
/// sum to `instructions.len()`.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    instructions: Vec<u8>,
    constants: Vec<Value>,
    linums: Vec<u32>,
}

#[inline(always)]
fn pack_linum(line: u16, run: u16) -> u32 {
    line as u32 | (run as u32) << 16
}

#[inline(always)]
fn unpack_linum(entry: u32) -> (u16, u16) {
    ((entry & 0xFFFF) as u16, (entry >> 16) as u16)
}

impl Chunk {
    pub fn new() -> Self {
        Chunk::default()
    }

    /// Appends a simple instruction and returns the offset it was written at.
    pub fn append(&mut self, op: OpCode, line: u16) -> usize {
        self.append_byte(op.into(), line)
    }

    /// Adds `value` to the constant pool and appends `op` followed by the
    /// one-byte pool index. Returns the offset of the opcode byte.
    ///
    /// Nothing is written when the pool is already full.
    pub fn append_constant(&mut self, op: OpCode, value: Value, line: u16) -> Result<usize, ChunkError> {
        let index = self.add_constant(value)?;
        let offset = self.append_byte(op.into(), line);
        self.append_byte(index, line);
        Ok(offset)
    }

    /// Appends one raw byte. Hand-built and deliberately corrupt chunks go
    /// through here; the compiler uses `append` / `append_constant`.
    pub fn append_byte(&mut self, byte: u8, line: u16) -> usize {
        let offset = self.instructions.len();
        self.instructions.push(byte);
        self.add_linum(line);
        offset
    }

    fn add_constant(&mut self, value: Value) -> Result<u8, ChunkError> {
        let index = u8::try_from(self.constants.len()).map_err(|_| ChunkError::ConstantPoolFull)?;
        self.constants.push(value);
        Ok(index)
    }

    fn add_linum(&mut self, line: u16) {
        if let Some(last) = self.linums.last_mut() {
            let (last_line, run) = unpack_linum(*last);
            if last_line == line && run < u16::MAX {
                *last = pack_linum(line, run + 1);
                return;
            }
        }
        self.linums.push(pack_linum(line, 1));
    }

    /// Source line of the instruction byte at `index`, or 0 when `index` is
    /// past the end.
    pub fn linum(&self, index: usize) -> u16 {
        let mut covered = 0usize;
        for &entry in &self.linums {
            let (line, run) = unpack_linum(entry);
            covered += run as usize;
            if covered > index {
                return line;
            }
        }
        0
    }

    /// Clone of the constant at `index`.
    ///
    /// Indices come from the compiler, so an out-of-range index is a bug and
    /// panics. Use [`Chunk::get_constant`] for untrusted bytes.
    pub fn constant(&self, index: usize) -> Value {
        self.constants[index].clone()
    }

    pub fn get_constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    /// Cursor positioned on the first instruction byte.
    pub fn cbegin(&self) -> Cursor {
        Cursor { offset: 0 }
    }

    /// Reads the byte under `cursor` and advances it. `None` past the end.
    #[inline(always)]
    pub fn fetch(&self, cursor: &mut Cursor) -> Option<u8> {
        let byte = self.instructions.get(cursor.offset).copied()?;
        cursor.offset += 1;
        Some(byte)
    }

    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn linums(&self) -> &[u32] {
        &self.linums
    }

    /// Decoded `(line, run_length)` pairs of the line table.
    pub fn line_entries(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.linums.iter().map(|&e| unpack_linum(e))
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Read position in a chunk's instruction stream.
///
/// A plain offset rather than a borrow, so the VM can hold it next to the
/// chunk it owns. Every read goes through [`Chunk::fetch`], which checks
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    offset: usize,
}

impl Cursor {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_total(chunk: &Chunk) -> usize {
        chunk.line_entries().map(|(_, run)| run as usize).sum()
    }

    #[test]
    fn opcode_bytes_are_stable() {
        assert_eq!(u8::from(OpCode::Return), 0);
        assert_eq!(u8::from(OpCode::Constant), 1);
        assert_eq!(u8::from(OpCode::ConstantLong), 2);
        assert_eq!(u8::from(OpCode::Negate), 3);
        assert_eq!(u8::from(OpCode::Divide), 7);
        assert_eq!(u8::from(OpCode::Ge), 13);
        assert_eq!(u8::from(OpCode::Error), 14);
        assert_eq!(u8::from(OpCode::Not), 15);
    }

    #[test]
    fn opcode_decode_rejects_unknown() {
        for byte in 0..=15u8 {
            let op = OpCode::try_from(byte).unwrap();
            assert_eq!(u8::from(op), byte);
        }
        assert_eq!(OpCode::try_from(16u8), Err(16));
        assert_eq!(OpCode::try_from(0xFFu8), Err(0xFF));
    }

    #[test]
    fn append_returns_offsets() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.append_constant(OpCode::Constant, Value::Integer(1), 1).unwrap(), 0);
        assert_eq!(chunk.append_constant(OpCode::Constant, Value::Integer(2), 1).unwrap(), 2);
        assert_eq!(chunk.append(OpCode::Add, 1), 4);
        assert_eq!(chunk.instructions(), &[1, 0, 1, 1, 4]);
        assert_eq!(chunk.constants(), &[Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn same_line_extends_run() {
        let mut chunk = Chunk::new();
        chunk.append_constant(OpCode::Constant, Value::Double(123.5), 123).unwrap();
        chunk.append_constant(OpCode::Constant, Value::Double(456.12), 123).unwrap();
        chunk.append(OpCode::Return, 123);
        chunk.append_constant(OpCode::Constant, Value::Double(789.32), 456).unwrap();
        chunk.append(OpCode::Return, 456);

        let entries: Vec<_> = chunk.line_entries().collect();
        assert_eq!(entries, vec![(123, 5), (456, 3)]);
        assert_eq!(run_total(&chunk), chunk.len());
        assert_eq!(chunk.linums()[0], 123 | 5 << 16);
    }

    #[test]
    fn linum_lookup() {
        let mut chunk = Chunk::new();
        chunk.append_constant(OpCode::Constant, Value::Integer(1), 1).unwrap();
        chunk.append_constant(OpCode::Constant, Value::Integer(2), 2).unwrap();
        chunk.append(OpCode::Add, 1);
        chunk.append(OpCode::Return, 0);

        let lines: Vec<u16> = (0..chunk.len()).map(|i| chunk.linum(i)).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 1, 0]);
        assert_eq!(chunk.line_entries().count(), 4);
    }

    #[test]
    fn linum_out_of_range_is_zero() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.linum(0), 0);
        chunk.append(OpCode::Return, 9);
        assert_eq!(chunk.linum(0), 9);
        assert_eq!(chunk.linum(1), 0);
        assert_eq!(chunk.linum(usize::MAX), 0);
    }

    #[test]
    fn long_runs_split_without_losing_count() {
        let mut chunk = Chunk::new();
        let total = u16::MAX as usize + 10;
        for _ in 0..total {
            chunk.append(OpCode::Negate, 3);
        }
        let entries: Vec<_> = chunk.line_entries().collect();
        assert_eq!(entries, vec![(3, u16::MAX), (3, 10)]);
        assert_eq!(run_total(&chunk), total);
        assert_eq!(chunk.linum(total - 1), 3);
        assert_eq!(chunk.linum(total), 0);
    }

    #[test]
    fn line_table_invariant_holds_for_random_appends() {
        let mut rng = fastrand::Rng::with_seed(0x5EED);
        for _ in 0..50 {
            let mut chunk = Chunk::new();
            let mut expected = Vec::new();
            let mut line = 1u16;
            for _ in 0..rng.usize(1..200) {
                if rng.u8(0..4) == 0 {
                    line = rng.u16(0..20);
                }
                if rng.bool() && chunk.constants().len() < MAX_CONSTANTS {
                    chunk.append_constant(OpCode::Constant, Value::Integer(1), line).unwrap();
                    expected.extend([line, line]);
                } else {
                    chunk.append(OpCode::Add, line);
                    expected.push(line);
                }
                assert_eq!(run_total(&chunk), chunk.len());
            }
            let actual: Vec<u16> = (0..chunk.len()).map(|i| chunk.linum(i)).collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn constant_pool_ceiling() {
        let mut chunk = Chunk::new();
        for i in 0..MAX_CONSTANTS {
            let offset = chunk.append_constant(OpCode::Constant, Value::Integer(i as i32), 1).unwrap();
            assert_eq!(chunk.instructions()[offset + 1] as usize, i);
        }
        let before = chunk.len();
        let err = chunk.append_constant(OpCode::Constant, Value::Integer(999), 1).unwrap_err();
        assert_eq!(err, ChunkError::ConstantPoolFull);
        assert_eq!(chunk.len(), before);
        assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
        assert_eq!(chunk.constant(0), Value::Integer(0));
        assert_eq!(chunk.constant(255), Value::Integer(255));
    }

    #[test]
    #[should_panic]
    fn constant_out_of_range_panics() {
        Chunk::new().constant(0);
    }

    #[test]
    fn cursor_fetch_is_bounds_checked() {
        let mut chunk = Chunk::new();
        chunk.append(OpCode::Negate, 1);
        chunk.append(OpCode::Return, 1);
        let mut ip = chunk.cbegin();
        assert_eq!(chunk.fetch(&mut ip), Some(3));
        assert_eq!(ip.offset(), 1);
        assert_eq!(chunk.fetch(&mut ip), Some(0));
        assert_eq!(chunk.fetch(&mut ip), None);
        assert_eq!(ip.offset(), 2);
    }
}
