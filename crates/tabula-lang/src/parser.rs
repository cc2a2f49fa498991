use crate::lexer::{Token, TokenKind};
use tabula_solver::{ConstraintOp, LpProblem};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, line: usize },
    #[error("Line {line}: expected {expected} tokens for {what}, found {found}")]
    WrongTokenCount {
        what: String,
        expected: usize,
        found: usize,
        line: usize,
    },
    #[error("Line {line}: invalid integer '{text}'")]
    InvalidInteger { text: String, line: usize },
    #[error("Line {line}: invalid number '{text}'")]
    InvalidNumber { text: String, line: usize },
    #[error("Line {line}: unknown relation '{text}', expected '<=' or '>='")]
    UnknownRelation { text: String, line: usize },
    #[error("Line {line}: equality constraints are not supported")]
    UnsupportedEquality { line: usize },
    #[error("Line {line}: unexpected content after the last constraint")]
    TrailingInput { line: usize },
    #[error("Line {line}: a problem needs at least one variable")]
    NoVariables { line: usize },
}

/// Reads the line-oriented problem format:
///
/// ```text
/// <num_variables> <num_constraints>
/// <c_1> ... <c_n>
/// <a_11> ... <a_1n> <= | >= <b_1>
/// ...
/// ```
///
/// Blank lines and `#` comments are ignored.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// The non-trivia tokens of one source line.
struct Line {
    number: usize,
    tokens: Vec<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<LpProblem, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_problem()
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span.line)
            .unwrap_or(1)
    }

    /// Collects the next non-empty line, or `None` at end of input.
    fn next_line(&mut self) -> Option<Line> {
        loop {
            let number = self.current_line();
            let mut tokens = Vec::new();
            loop {
                match self.peek_kind() {
                    TokenKind::Eof => break,
                    TokenKind::Newline => {
                        self.pos += 1;
                        break;
                    }
                    TokenKind::Comment => self.pos += 1,
                    _ => {
                        tokens.push(self.tokens[self.pos].clone());
                        self.pos += 1;
                    }
                }
            }

            if !tokens.is_empty() {
                return Some(Line { number, tokens });
            }
            if self.peek_kind() == TokenKind::Eof {
                return None;
            }
        }
    }

    fn expect_line(&mut self, expected: &str) -> Result<Line, ParseError> {
        self.next_line().ok_or_else(|| ParseError::UnexpectedEof {
            expected: expected.to_string(),
            line: self.current_line(),
        })
    }

    fn parse_problem(&mut self) -> Result<LpProblem, ParseError> {
        let (num_variables, num_constraints) = self.parse_header()?;

        // Sized from the objective line, never from the header alone
        let objective = self.expect_line("objective coefficients")?;
        check_count(&objective, "objective", num_variables)?;
        let mut problem = LpProblem {
            num_variables,
            objective: parse_numbers(&objective.tokens, objective.number)?,
            constraints: Vec::new(),
        };

        for i in 0..num_constraints {
            let line = self.expect_line(&format!("constraint {} of {}", i + 1, num_constraints))?;
            let (coefficients, op, rhs) = parse_constraint(&line, num_variables)?;
            problem.add_constraint(coefficients, op, rhs);
        }

        if let Some(extra) = self.next_line() {
            return Err(ParseError::TrailingInput { line: extra.number });
        }

        Ok(problem)
    }

    fn parse_header(&mut self) -> Result<(usize, usize), ParseError> {
        let header = self.expect_line("problem size")?;
        check_count(&header, "problem size", 2)?;
        let parse_int = |token: &Token| {
            token
                .text
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidInteger {
                    text: token.text.clone(),
                    line: header.number,
                })
        };
        let num_variables = parse_int(&header.tokens[0])?;
        let num_constraints = parse_int(&header.tokens[1])?;
        if num_variables == 0 {
            return Err(ParseError::NoVariables { line: header.number });
        }
        Ok((num_variables, num_constraints))
    }
}

fn check_count(line: &Line, what: &str, expected: usize) -> Result<(), ParseError> {
    if line.tokens.len() != expected {
        return Err(ParseError::WrongTokenCount {
            what: what.to_string(),
            expected,
            found: line.tokens.len(),
            line: line.number,
        });
    }
    Ok(())
}

fn parse_number(token: &Token, line: usize) -> Result<f64, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        text: token.text.clone(),
        line,
    };
    if token.kind != TokenKind::Number {
        return Err(invalid());
    }
    match token.text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid()),
    }
}

fn parse_numbers(tokens: &[Token], line: usize) -> Result<Vec<f64>, ParseError> {
    tokens.iter().map(|t| parse_number(t, line)).collect()
}

fn parse_constraint(line: &Line, num_variables: usize) -> Result<(Vec<f64>, ConstraintOp, f64), ParseError> {
    let expected = num_variables
        .checked_add(2)
        .ok_or(ParseError::WrongTokenCount {
            what: "constraint".to_string(),
            expected: usize::MAX,
            found: line.tokens.len(),
            line: line.number,
        })?;
    check_count(line, "constraint", expected)?;

    let relation = &line.tokens[num_variables];
    let op = match relation.kind {
        TokenKind::Le => ConstraintOp::Le,
        TokenKind::Ge => ConstraintOp::Ge,
        TokenKind::Eq => return Err(ParseError::UnsupportedEquality { line: line.number }),
        _ => {
            return Err(ParseError::UnknownRelation {
                text: relation.text.clone(),
                line: line.number,
            });
        }
    };

    let coefficients = parse_numbers(&line.tokens[..num_variables], line.number)?;
    let rhs = parse_number(&line.tokens[num_variables + 1], line.number)?;
    Ok((coefficients, op, rhs))
}
