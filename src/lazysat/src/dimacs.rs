/***************************************************************************************[dimacs.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::{clause::Lit, interface::SolverInterface},
    std::io::{self, BufRead},
};

/// `parse(input, solver, is_strict)` adds the clauses of `input` to the solver.
///
/// Lines starting with `c` are comments; the `p cnf <vars> <clauses>` header is
/// optional. Variables are created on demand.
///
/// ## Params
/// - `is_strict` if true, will fail if the number of clauses does not match the declared header
///
/// ```
/// use lazysat::*;
/// let mut s = BasicSolver::default();
/// let mut input = "c example\np cnf 2 2\n1 -2 0\n2 0\n".as_bytes();
/// dimacs::parse(&mut input, &mut s, true).unwrap();
/// assert_eq!(s.num_vars(), 2);
/// assert_eq!(s.solve_limited(), lbool::TRUE);
/// ```
pub fn parse<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    is_strict: bool,
) -> io::Result<()> {
    let mut lits = vec![];
    let mut num_clauses = 0;
    let mut num_read_clauses = 0;
    loop {
        skip_whitespace(input)?;
        let ch = next_byte(input)?;
        if ch == Some(b'p') {
            let mut header = [0; 5];
            input.read_exact(&mut header)?;
            if &header != b"p cnf" {
                return parse_error(format!("PARSE ERROR! Unexpected char: p"));
            }
            let _num_vars = parse_int(input)?;
            num_clauses = parse_int(input)?;
            debug!("dimacs header: {} vars, {} clauses", _num_vars, num_clauses);
        } else if ch == Some(b'c') {
            skip_line(input)?;
        } else if let Some(_) = ch {
            read_clause(input, solver, &mut lits)?;
            solver.add_clause_reuse(&mut lits);
            num_read_clauses += 1;
        } else {
            break;
        }
    }
    if is_strict && num_clauses != num_read_clauses {
        return parse_error(format!(
            "PARSE ERROR! DIMACS header mismatch: wrong number of clauses"
        ));
    }
    Ok(())
}

fn read_clause<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    lits: &mut Vec<Lit>,
) -> io::Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        let var = (parsed_lit.abs() - 1) as u32;
        let lit = Lit::new(solver.var_of_int(var), parsed_lit > 0);
        lits.push(lit);
    }
}

fn parse_int<R: BufRead>(input: &mut R) -> io::Result<i32> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    match next_byte(input)? {
        Some(ch) if ch.is_ascii_digit() => (),
        Some(ch) => {
            return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char));
        }
        None => return parse_error(format!("PARSE ERROR! Unexpected EOF")),
    }
    let mut val: i32 = 0;
    while let Some(ch) = next_byte(input)? {
        if !ch.is_ascii_digit() {
            break;
        }
        input.consume(1);
        val = match val
            .checked_mul(10)
            .and_then(|v| v.checked_add((ch - b'0') as i32))
        {
            Some(v) => v,
            None => return parse_error(format!("PARSE ERROR! Integer too large")),
        };
    }
    Ok(if neg { -val } else { val })
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map_or(false, |ch| (b'\x09'..=b'\x0d').contains(&ch) || ch == b' ')
}

fn skip_whitespace<R: BufRead>(input: &mut R) -> io::Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    while let Some(ch) = next_byte(input)? {
        input.consume(1);
        if ch == b'\n' {
            break;
        }
    }
    Ok(())
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    Ok(input.fill_buf()?.first().cloned())
}

fn parse_error<T>(message: String) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidInput, message))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{clause::lbool, BasicSolver};

    fn parse_str(s: &str, strict: bool) -> io::Result<BasicSolver> {
        let mut solver = BasicSolver::default();
        parse(&mut s.as_bytes(), &mut solver, strict)?;
        Ok(solver)
    }

    #[test]
    fn test_parse_sat() {
        let s = parse_str("p cnf 3 2\n1 -3 0\n  -1 2\n 0\nc done\n", true).unwrap();
        assert_eq!(s.num_vars(), 3);
        assert_eq!(s.num_clauses(), 2);
    }

    #[test]
    fn test_parse_unsat() {
        let mut s = parse_str("1 0\n-1 0\n", false).unwrap();
        assert!(!s.is_ok());
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    #[test]
    fn test_strict_header_mismatch() {
        let err = parse_str("p cnf 2 3\n1 2 0\n", true).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("PARSE ERROR!"));
        assert!(parse_str("p cnf 2 3\n1 2 0\n", false).is_ok());
    }

    #[test]
    fn test_garbage() {
        for bad in &["1 x 0\n", "p dnf 1 1\n", "1 2", "99999999999 0\n"] {
            let err = parse_str(bad, false).err().unwrap();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "input {:?}", bad);
        }
    }
}
