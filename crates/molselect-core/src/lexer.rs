use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Atoms
    Atom,
    BracketAtom,

    // Bond symbols: - = # $ : / \
    Bond,

    // Topology
    LParen,
    RParen,
    RingClosure,
    Dot,

    // Special
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

/// Tokenizer for line notation structure encodings (organic subset SMILES).
pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.advance();
        Token::new(kind, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    fn read_bracket_atom(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // [
        while let Some(c) = self.peek() {
            self.advance();
            if c == ']' {
                return Token::new(
                    TokenKind::BracketAtom,
                    Span::new(start, self.pos),
                    &self.source[start..self.pos],
                );
            }
        }
        // Unterminated bracket atom
        Token::new(TokenKind::Error, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    fn read_organic_atom(&mut self) -> Token {
        let start = self.pos;
        let first = self.advance();
        // Two-letter organic subset symbols
        if matches!((first, self.peek()), (Some('C'), Some('l')) | (Some('B'), Some('r'))) {
            self.advance();
        }
        Token::new(TokenKind::Atom, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    fn read_percent_ring(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // %
        let digits = self.peek().is_some_and(|c| c.is_ascii_digit())
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if !digits {
            return Token::new(TokenKind::Error, Span::new(start, self.pos), "%");
        }
        self.advance();
        self.advance();
        Token::new(
            TokenKind::RingClosure,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    pub fn next_token(&mut self) -> Token {
        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), "");
        };

        match c {
            '[' => self.read_bracket_atom(),
            'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' | 'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                self.read_organic_atom()
            }
            '-' | '=' | '#' | '$' | ':' | '/' | '\\' => self.single(TokenKind::Bond),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '.' => self.single(TokenKind::Dot),
            '%' => self.read_percent_ring(),
            c if c.is_ascii_digit() => self.single(TokenKind::RingClosure),
            _ => self.single(TokenKind::Error),
        }
    }
}
