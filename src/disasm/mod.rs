use std::io::{self, Write};

use crate::chunk::{Chunk, OpCode};

/// Writes `== name ==` followed by every instruction in `chunk`.
pub fn disassemble(chunk: &Chunk, name: &str, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "== {} ==", name)?;
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, w)?;
    }
    Ok(())
}

/// Writes the instruction at `offset` on one line and returns the offset of
/// the next one.
///
/// ```text
/// 0000  123 CONSTANT         0 '100
/// 0002    | RETURN
/// ```
///
/// The line column shows `|` when the instruction shares the previous byte's
/// line, as recorded in the chunk's line table.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, w: &mut dyn Write) -> io::Result<usize> {
    write!(w, "{:04} ", offset)?;
    let line = chunk.linum(offset);
    if offset > 0 && line == chunk.linum(offset - 1) {
        write!(w, "   | ")?;
    } else {
        write!(w, "{:>4} ", line)?;
    }

    let Some(&byte) = chunk.instructions().get(offset) else {
        writeln!(w, "<end of chunk>")?;
        return Ok(offset + 1);
    };
    let op = match OpCode::try_from(byte) {
        Ok(op) => op,
        Err(unknown) => {
            writeln!(w, "unknown opcode {}", unknown)?;
            return Ok(offset + 1);
        }
    };

    match op {
        OpCode::Constant | OpCode::ConstantLong => constant_instruction(chunk, op, offset, w),
        _ => {
            writeln!(w, "{}", op)?;
            Ok(offset + 1)
        }
    }
}

fn constant_instruction(chunk: &Chunk, op: OpCode, offset: usize, w: &mut dyn Write) -> io::Result<usize> {
    let Some(&index) = chunk.instructions().get(offset + 1) else {
        writeln!(w, "{:<16} <missing operand>", op)?;
        return Ok(offset + 1);
    };
    match chunk.get_constant(index as usize) {
        Some(value) => writeln!(w, "{:<16} {} '{}", op, index, value)?,
        None => writeln!(w, "{:<16} {} <bad constant>", op, index)?,
    }
    Ok(offset + op.width())
}
