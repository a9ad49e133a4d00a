use logos::Logos;
use std::fmt;

use super::source::{Position, SourceIndex};

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t]+")] // Whitespace (newlines are significant)
#[logos(skip r"//[^\n]*")] // Line comments
pub enum Token {
    // --- Statement keywords ---
    #[token("OUTPUT")]
    Output,
    #[token("INPUT")]
    Input,
    #[token("DECLARE")]
    Declare,
    #[token("CALL")]
    Call,
    #[token("PrintfD")]
    PrintfD,
    #[token("PrintfF")]
    PrintfF,

    // --- Block keywords ---
    #[token("IF")]
    If,
    #[token("THEN")]
    Then,
    #[token("ELSE")]
    Else,
    #[token("ENDIF")]
    EndIf,
    #[token("WHILE")]
    While,
    #[token("DO")]
    Do,
    #[token("ENDWHILE")]
    EndWhile,
    #[token("REPEAT")]
    Repeat,
    #[token("UNTIL")]
    Until,

    // --- Types and boolean literals ---
    #[token("INT")]
    Int,
    #[token("REAL")]
    Real,
    #[token("BOOL")]
    Bool,
    #[token("TRUE")]
    True,
    #[token("FALSE")]
    False,

    // --- Identifiers and literals ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i32>().ok())]
    Integer(i32),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    RealLiteral(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    String(String),

    #[regex(r"\r?\n")]
    Newline,

    // --- Operators ---
    #[token("<-")]
    Assign,
    #[token("=")]
    Eq,
    #[token("<>")]
    Neq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("!")]
    Bang,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
}

/// Strip the quotes off a string literal and resolve its escapes.
fn unescape(slice: &str) -> Option<String> {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            _ => return None,
        }
    }
    Some(out)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Output => write!(f, "OUTPUT"),
            Token::Input => write!(f, "INPUT"),
            Token::Declare => write!(f, "DECLARE"),
            Token::Call => write!(f, "CALL"),
            Token::PrintfD => write!(f, "PrintfD"),
            Token::PrintfF => write!(f, "PrintfF"),
            Token::If => write!(f, "IF"),
            Token::Then => write!(f, "THEN"),
            Token::Else => write!(f, "ELSE"),
            Token::EndIf => write!(f, "ENDIF"),
            Token::While => write!(f, "WHILE"),
            Token::Do => write!(f, "DO"),
            Token::EndWhile => write!(f, "ENDWHILE"),
            Token::Repeat => write!(f, "REPEAT"),
            Token::Until => write!(f, "UNTIL"),
            Token::Int => write!(f, "INT"),
            Token::Real => write!(f, "REAL"),
            Token::Bool => write!(f, "BOOL"),
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Integer(n) => write!(f, "{}", n),
            Token::RealLiteral(r) => write!(f, "{:?}", r),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Newline => write!(f, "end of line"),
            Token::Assign => write!(f, "<-"),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Mul => write!(f, "*"),
            Token::Div => write!(f, "/"),
            Token::Bang => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
        }
    }
}

/// A token together with where it started in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: Position,
}

/// Custom error type for lexical errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub location: usize,
    pub line: usize,
    pub column: usize,
    pub lexeme: String,
    pub context: String,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unrecognized input '{}' at line {}, column {}\n  Context: {}",
            self.lexeme, self.line, self.column, self.context
        )
    }
}

impl std::error::Error for LexicalError {}

fn create_lexical_error(index: &SourceIndex<'_>, span: std::ops::Range<usize>) -> LexicalError {
    let pos = index.position(span.start);
    let lexeme = index
        .source()
        .get(span)
        .filter(|s| !s.is_empty())
        .unwrap_or("\0")
        .to_string();

    LexicalError {
        location: pos.offset,
        line: pos.line,
        column: pos.column,
        lexeme,
        context: index.line_context(pos.offset),
    }
}

/// Iterator over the tokens of a source, stopping at the first error.
pub struct LexerAdapter<'source> {
    index: SourceIndex<'source>,
    lexer: logos::Lexer<'source, Token>,
    failed: bool,
}

impl<'source> LexerAdapter<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            index: SourceIndex::new(source),
            lexer: Token::lexer(source),
            failed: false,
        }
    }
}

impl<'source> Iterator for LexerAdapter<'source> {
    type Item = Result<SpannedToken, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let token_result = self.lexer.next()?;
        let span = self.lexer.span();

        Some(match token_result {
            Ok(token) => Ok(SpannedToken {
                token,
                pos: self.index.position(span.start),
            }),
            Err(()) => {
                self.failed = true;
                Err(create_lexical_error(&self.index, span))
            }
        })
    }
}

/// Lex the whole source, failing at the first unmatched lexeme.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexicalError> {
    let tokens = LexerAdapter::new(source).collect::<Result<Vec<_>, _>>()?;
    tracing::trace!(count = tokens.len(), "lexed source");
    Ok(tokens)
}
