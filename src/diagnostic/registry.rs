/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one-line summary for --list-errors
    pub long: &'static str,  // full explanation for --explain
}

/// All stable error codes reported by plzero.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "PL0-L001",
        short: "unexpected character",
        long: r#"## PL0-L001: unexpected character

A character was found that does not start any token.

**Example:**

    1 + $2

`$` is not part of the language. Note that assignment is written `:=`;
a lone `:` is reported here too.
"#,
    },
    ErrorEntry {
        code: "PL0-L002",
        short: "unterminated string literal",
        long: r#"## PL0-L002: unterminated string literal

A string literal must be closed with `"` on the same line it was opened.

**Example:**

    "hello + "world"

**Fix:**

    "hello" + "world"
"#,
    },

    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "PL0-P001",
        short: "unexpected token",
        long: r#"## PL0-P001: unexpected token

A token appeared where the grammar does not allow it: an operator with
no left operand, a missing `)`, or anything left over after the
expression and its optional closing `.`.

**Examples:**

    1 2
    * 3
    (1 + 2]
"#,
    },
    ErrorEntry {
        code: "PL0-P002",
        short: "unexpected end of input",
        long: r#"## PL0-P002: unexpected end of input

The program ended while an expression was still incomplete.

**Examples:**

    1 +
    (1 + 2
"#,
    },
    ErrorEntry {
        code: "PL0-P003",
        short: "construct is not executable",
        long: r#"## PL0-P003: construct is not executable

Only flat expressions over literals can be compiled and run. Declarations
(`var`, `const`, `procedure`), statements (`begin`, `if`, `while`, `call`,
`print`, `:=`) and variable references are recognised by the lexer but
are rejected here.

**Example:**

    var x; x := 1 + 2.

**Fix:**

    1 + 2.
"#,
    },

    ErrorEntry {
        code: "PL0-P004",
        short: "expression nested too deeply",
        long: r#"## PL0-P004: expression nested too deeply

Parentheses and prefix operators (`-`, `+`, `!`, `odd`) may enclose one
another at most 128 levels deep, and the whole expression tree may be at
most 1024 levels tall. A long chain of binary operators counts one level
per operator.

**Example:**

    ((((((((((1))))))))))   ...repeated past 128 levels

Remove redundant parentheses or split the program.
"#,
    },

    // ── Compiler ─────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "PL0-C001",
        short: "too many constants",
        long: r#"## PL0-C001: too many constants

A chunk holds at most 256 constants because the constant index is a
single byte. Every literal in the program takes one slot.

Split the expression into smaller programs.
"#,
    },
    ErrorEntry {
        code: "PL0-C002",
        short: "operator has no bytecode",
        long: r#"## PL0-C002: operator has no bytecode

The operator parses but the virtual machine has no instruction for it.
`odd` is the usual cause.

**Example:**

    odd 3
"#,
    },
    ErrorEntry {
        code: "PL0-C003",
        short: "invalid literal",
        long: r#"## PL0-C003: invalid literal

A number literal does not fit its type. Integers are 32-bit signed, so
the largest is `2'147'483'647`. Write a decimal point to get a double.

**Example:**

    2'147'483'648

**Fix:**

    2'147'483'648.0
"#,
    },
    ErrorEntry {
        code: "PL0-C004",
        short: "line number out of range",
        long: r#"## PL0-C004: line number out of range

The line table stores 16-bit line numbers. Source beyond line 65535
cannot be attributed and is rejected.
"#,
    },

    ErrorEntry {
        code: "PL0-C005",
        short: "expression tree too deep",
        long: r#"## PL0-C005: expression tree too deep

A syntax tree handed to the compiler directly, rather than parsed from
source, is taller than 1024 levels. Source text never reaches this
error because the parser reports PL0-P004 first.
"#,
    },

    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "PL0-R001",
        short: "unsupported operand types",
        long: r#"## PL0-R001: unsupported operand types

An operator was applied to values it is not defined for.

- `+` works on numbers and on two strings.
- `- * /` and `< <= > >=` work on numbers only.
- `== = != #` compare two numbers, two booleans or two strings.
- unary `-` needs a number; `!` needs a boolean.

Integers mixed with doubles are promoted to double.

**Example:**

    1 + "x"
"#,
    },
    ErrorEntry {
        code: "PL0-R002",
        short: "division by zero",
        long: r#"## PL0-R002: division by zero

The right operand of `/` was zero. This is an error for integers and for
doubles alike.
"#,
    },
    ErrorEntry {
        code: "PL0-R003",
        short: "integer overflow",
        long: r#"## PL0-R003: integer overflow

Integer arithmetic is checked. A result outside the 32-bit signed range
is an error rather than a wrapped value.

**Example:**

    2'147'483'647 + 1
"#,
    },
    ErrorEntry {
        code: "PL0-R004",
        short: "ERROR instruction executed",
        long: r#"## PL0-R004: ERROR instruction executed

The chunk contained an `ERROR` instruction, which halts the machine
unconditionally. The compiler never emits it; it appears only in
hand-built bytecode.
"#,
    },
    ErrorEntry {
        code: "PL0-R005",
        short: "malformed bytecode",
        long: r#"## PL0-R005: malformed bytecode

The virtual machine met bytecode it cannot execute: an unknown opcode,
a constant instruction without its index byte or with an index past
the constant pool, an operator with too few values on the stack, or a
chunk that ends without `RETURN`.

Compiled programs never produce this. If you see it for source code,
please file a bug report.
"#,
    },
    ErrorEntry {
        code: "PL0-R006",
        short: "virtual machine already halted",
        long: r#"## PL0-R006: virtual machine already halted

A machine runs its chunk once. After `RETURN` or an error it is halted
and further runs fail. Create a new machine for the next program.
"#,
    },
    ErrorEntry {
        code: "PL0-R007",
        short: "cannot read source",
        long: r#"## PL0-R007: cannot read source

The source file could not be read, or its contents are not valid UTF-8.
"#,
    },
];

/// Look up an error entry by code (e.g. `"PL0-R002"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}
