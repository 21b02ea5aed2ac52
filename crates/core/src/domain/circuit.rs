// Circuit payload structural checks
//
// The server treats circuits as opaque text. Only the outer shape of an
// OpenQASM program is checked here so that garbage never reaches the queue.

use crate::domain::error::{DomainError, Result};

/// What the structural pass learned about a circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitSummary {
    pub version: String,
    pub num_qubits: u32,
    pub num_clbits: u32,
    pub num_statements: usize,
}

/// Validate the structure of an OpenQASM 2/3 program.
///
/// Checks the `OPENQASM` header, statement termination, brace balance and
/// register declarations. Gate semantics are not interpreted.
pub fn validate_circuit(source: &str) -> Result<CircuitSummary> {
    let stripped = strip_comments(source)?;
    if stripped.trim().is_empty() {
        return Err(invalid("circuit is empty"));
    }

    let statements = split_statements(&stripped)?;
    let header = statements
        .first()
        .ok_or_else(|| invalid("circuit has no statements"))?;
    let version = parse_header(header)?;

    let mut num_qubits: u32 = 0;
    let mut num_clbits: u32 = 0;
    for statement in &statements[1..] {
        match keyword(statement) {
            "OPENQASM" => return Err(invalid("duplicate OPENQASM header")),
            "qreg" => num_qubits = add_register(num_qubits, register_size(statement, true)?)?,
            "qubit" => num_qubits = add_register(num_qubits, register_size(statement, false)?)?,
            "creg" => num_clbits = add_register(num_clbits, register_size(statement, true)?)?,
            "bit" => num_clbits = add_register(num_clbits, register_size(statement, false)?)?,
            _ => {}
        }
    }

    if num_qubits == 0 {
        return Err(invalid("circuit declares no qubits"));
    }

    Ok(CircuitSummary {
        version,
        num_qubits,
        num_clbits,
        num_statements: statements.len(),
    })
}

fn invalid(msg: impl Into<String>) -> DomainError {
    DomainError::InvalidCircuit(msg.into())
}

/// Remove `//` and `/* */` comments, leaving string literals alone
fn strip_comments(source: &str) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut closed = false;
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        closed = true;
                        break;
                    }
                    prev = skipped;
                }
                if !closed {
                    return Err(invalid("unterminated block comment"));
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    if in_string {
        return Err(invalid("unterminated string literal"));
    }
    Ok(out)
}

/// Split into top-level statements. A statement ends at `;` or at the `}`
/// closing a top-level block (gate bodies, loops).
fn split_statements(source: &str) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut in_string = false;

    for c in source.chars() {
        if in_string {
            current.push(c);
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                if depth == 0 {
                    return Err(invalid("unbalanced '}'"));
                }
                depth -= 1;
                current.push(c);
                if depth == 0 {
                    push_statement(&mut statements, &mut current);
                }
            }
            ';' if depth == 0 => push_statement(&mut statements, &mut current),
            _ => current.push(c),
        }
    }

    if depth != 0 {
        return Err(invalid("unbalanced '{'"));
    }
    if !current.trim().is_empty() {
        return Err(invalid(format!(
            "statement is missing ';': '{}'",
            truncate(current.trim(), 40)
        )));
    }
    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.split_whitespace().collect::<Vec<_>>().join(" ");
    current.clear();
    if !statement.is_empty() {
        statements.push(statement);
    }
}

fn parse_header(statement: &str) -> Result<String> {
    let mut parts = statement.split_whitespace();
    if parts.next() != Some("OPENQASM") {
        return Err(invalid("circuit must start with an OPENQASM header"));
    }
    let version = parts
        .next()
        .ok_or_else(|| invalid("OPENQASM header is missing a version"))?;
    if parts.next().is_some() {
        return Err(invalid("malformed OPENQASM header"));
    }

    let mut numbers = version.splitn(2, '.');
    let major_ok = numbers
        .next()
        .is_some_and(|major| !major.is_empty() && major.chars().all(|c| c.is_ascii_digit()));
    let minor_ok = numbers
        .next()
        .map_or(true, |minor| !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()));
    if !(major_ok && minor_ok) {
        return Err(invalid(format!("unsupported OPENQASM version '{}'", version)));
    }
    Ok(version.to_string())
}

fn keyword(statement: &str) -> &str {
    let end = statement
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(statement.len());
    &statement[..end]
}

/// Size of a register declaration: `qreg q[2]`, `qubit[2] q` or `qubit q`
fn register_size(statement: &str, brackets_required: bool) -> Result<u32> {
    let open = statement.find('[');
    let close = statement.find(']');
    match (open, close) {
        (Some(open), Some(close)) if open < close => {
            let text = statement[open + 1..close].trim();
            match text.parse::<u32>() {
                Ok(size) if size > 0 => Ok(size),
                _ => Err(invalid(format!(
                    "register size must be a positive integer in '{}'",
                    statement
                ))),
            }
        }
        (None, None) if !brackets_required => Ok(1),
        _ => Err(invalid(format!("malformed register declaration '{}'", statement))),
    }
}

fn add_register(total: u32, size: u32) -> Result<u32> {
    total
        .checked_add(size)
        .ok_or_else(|| invalid("register sizes overflow"))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
