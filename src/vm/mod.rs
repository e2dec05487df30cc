use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::chunk::{Chunk, Cursor, OpCode};
use crate::compiler::{self, CompileError};
use crate::diagnostic::{Diagnostic, OutputFormat};
use crate::disasm;
use crate::value::{Value, ValueError, ValueResult};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmErrorKind {
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("missing operand for {0}")]
    MissingOperand(OpCode),
    #[error("constant index {index} is out of range")]
    BadConstant { index: u8 },
    #[error("ran past the end of the chunk without RETURN")]
    UnexpectedEnd,
    #[error("ERROR instruction executed")]
    ErrorInstruction,
    #[error("virtual machine has already halted")]
    Halted,
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// A runtime failure with the offset and source line of the instruction that
/// raised it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} (line {line}, offset {offset:04})")]
pub struct VmError {
    pub line: u16,
    pub offset: usize,
    pub kind: VmErrorKind,
}

type VmResult<T> = Result<T, VmError>;

/// Outcome class of a compile-and-run, used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretResult {
    pub fn of(result: &Result<Value, RunError>) -> Self {
        match result {
            Ok(_) => InterpretResult::Ok,
            Err(e) => e.result(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Halted,
}

/// Stack machine executing one chunk.
///
/// A VM runs its chunk once: `RETURN` or any error leaves it halted.
pub struct Vm {
    chunk: Chunk,
    ip: Cursor,
    stack: Vec<Value>,
    state: State,
}

impl Vm {
    pub fn new(chunk: Chunk) -> Self {
        let ip = chunk.cbegin();
        Vm { chunk, ip, stack: Vec::new(), state: State::Ready }
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    pub fn run(&mut self) -> VmResult<Value> {
        self.start(None)
    }

    /// Like [`Vm::run`], writing the stack and the next instruction to
    /// `trace` before each step.
    pub fn run_with_trace(&mut self, trace: &mut dyn Write) -> VmResult<Value> {
        self.start(Some(trace))
    }

    fn start(&mut self, trace: Option<&mut dyn Write>) -> VmResult<Value> {
        if self.state == State::Halted {
            return Err(self.error(self.ip.offset(), VmErrorKind::Halted));
        }
        let result = self.execute(trace);
        self.state = State::Halted;
        result
    }

    fn error(&self, offset: usize, kind: VmErrorKind) -> VmError {
        VmError { line: self.chunk.linum(offset), offset, kind }
    }

    fn pop(&mut self, offset: usize) -> VmResult<Value> {
        match self.stack.pop() {
            Some(v) => Ok(v),
            None => Err(self.error(offset, VmErrorKind::StackUnderflow)),
        }
    }

    fn unary(&mut self, offset: usize, f: fn(&Value) -> ValueResult<Value>) -> VmResult<()> {
        let a = self.pop(offset)?;
        let result = f(&a).map_err(|e| self.error(offset, e.into()))?;
        self.stack.push(result);
        Ok(())
    }

    // The right operand was pushed last, so it comes off first.
    fn binary(&mut self, offset: usize, f: fn(&Value, &Value) -> ValueResult<Value>) -> VmResult<()> {
        let b = self.pop(offset)?;
        let a = self.pop(offset)?;
        let result = f(&a, &b).map_err(|e| self.error(offset, e.into()))?;
        self.stack.push(result);
        Ok(())
    }

    fn trace_step(&self, offset: usize, w: &mut dyn Write) -> io::Result<()> {
        write!(w, "[")?;
        for v in &self.stack {
            write!(w, " {}", v)?;
        }
        writeln!(w, " ]")?;
        disasm::disassemble_instruction(&self.chunk, offset, w)?;
        Ok(())
    }

    fn execute(&mut self, mut trace: Option<&mut dyn Write>) -> VmResult<Value> {
        loop {
            let offset = self.ip.offset();
            // Tracing is best effort. After the first failed write the trace is dropped
            // and the program runs on untraced.
            let trace_failed = match trace.as_deref_mut() {
                Some(w) => self.trace_step(offset, w).is_err(),
                None => false,
            };
            if trace_failed {
                trace = None;
            }

            let byte = self
                .chunk
                .fetch(&mut self.ip)
                .ok_or_else(|| self.error(offset, VmErrorKind::UnexpectedEnd))?;
            let op = OpCode::try_from(byte).map_err(|b| self.error(offset, VmErrorKind::UnknownOpcode(b)))?;

            match op {
                OpCode::Return => return self.pop(offset),
                OpCode::Constant | OpCode::ConstantLong => {
                    let index = self
                        .chunk
                        .fetch(&mut self.ip)
                        .ok_or_else(|| self.error(offset, VmErrorKind::MissingOperand(op)))?;
                    let value = self
                        .chunk
                        .get_constant(index as usize)
                        .cloned()
                        .ok_or_else(|| self.error(offset, VmErrorKind::BadConstant { index }))?;
                    self.stack.push(value);
                }
                OpCode::Negate => self.unary(offset, Value::negate)?,
                OpCode::Not => self.unary(offset, Value::not)?,
                OpCode::Add => self.binary(offset, Value::add)?,
                OpCode::Subtract => self.binary(offset, Value::subtract)?,
                OpCode::Multiply => self.binary(offset, Value::multiply)?,
                OpCode::Divide => self.binary(offset, Value::divide)?,
                OpCode::Equal => self.binary(offset, Value::equal)?,
                OpCode::NotEqual => self.binary(offset, Value::not_equal)?,
                OpCode::Lt => self.binary(offset, Value::less)?,
                OpCode::Le => self.binary(offset, Value::less_equal)?,
                OpCode::Gt => self.binary(offset, Value::greater)?,
                OpCode::Ge => self.binary(offset, Value::greater_equal)?,
                OpCode::Error => return Err(self.error(offset, VmErrorKind::ErrorInstruction)),
            }
        }
    }
}

// ── Drivers ─────────────────────────────────────────────────────────

/// Settings shared by the file, inline and REPL drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Write an execution trace to stderr.
    pub trace: bool,
    pub format: OutputFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{error}")]
    Compile { error: CompileError, source_code: String },
    #[error("{error}")]
    Runtime { error: VmError, source_code: String },
    #[error("cannot read {path}: {error}")]
    Io { path: String, error: io::Error },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },
}

impl RunError {
    /// Unreadable input counts as a compile error: nothing was executed.
    pub fn result(&self) -> InterpretResult {
        match self {
            RunError::Runtime { .. } => InterpretResult::RuntimeError,
            RunError::Compile { .. } | RunError::Io { .. } | RunError::Encoding { .. } => {
                InterpretResult::CompileError
            }
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::from(self)
    }
}

/// Compile and run one program.
pub fn interpret(source: &str, options: &RunOptions) -> Result<Value, RunError> {
    let chunk = compiler::compile(source)
        .map_err(|error| RunError::Compile { error, source_code: source.to_string() })?;
    let mut vm = Vm::new(chunk);
    let result = if options.trace { vm.run_with_trace(&mut io::stderr().lock()) } else { vm.run() };
    result.map_err(|error| RunError::Runtime { error, source_code: source.to_string() })
}

/// Whole file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String, RunError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|error| RunError::Io { path: display.clone(), error })?;
    String::from_utf8(bytes).map_err(|_| RunError::Encoding { path: display })
}

/// Reads the file at `path`, runs it once and prints the result to `output`.
pub fn runfile(path: &Path, output: &mut dyn Write, options: &RunOptions) -> Result<Value, RunError> {
    let source = read_source(path)?;
    let value = interpret(&source, options)?;
    writeln!(output, "{}", value).map_err(|error| RunError::Io { path: "<stdout>".to_string(), error })?;
    Ok(value)
}

/// Interactive loop: each line is an independent program. Results and
/// diagnostics both go to `output`; only a failing `output` or `input` ends
/// the loop early.
pub fn repl(input: &mut dyn BufRead, output: &mut dyn Write, options: &RunOptions) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        let line = match String::from_utf8(buf.clone()) {
            Ok(line) => line,
            Err(_) => {
                let err = RunError::Encoding { path: "<stdin>".to_string() };
                options.format.write_to(&err.diagnostic(), output)?;
                continue;
            }
        };
        let source = line.trim_end();
        if source.trim().is_empty() {
            continue;
        }

        match interpret(source, options) {
            Ok(value) => writeln!(output, "{}", value)?,
            Err(err) => options.format.write_to(&err.diagnostic(), output)?,
        }
    }
}
