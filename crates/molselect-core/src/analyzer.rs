use std::collections::HashMap;

use thiserror::Error;

use crate::lexer::{Lexer, Span, Token, TokenKind};

/// Heavy-atom and bond counts of one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Counts {
    pub atoms: u32,
    pub bonds: u32,
}

impl Counts {
    pub fn new(atoms: u32, bonds: u32) -> Self {
        Self { atoms, bonds }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Empty structure")]
    Empty,
    #[error("Unexpected '{text}' at position {span:?}")]
    UnexpectedCharacter { text: String, span: Span },
    #[error("Invalid bracket atom '{text}' at position {span:?}")]
    InvalidBracketAtom { text: String, span: Span },
    #[error("Unbalanced branch at position {span:?}")]
    UnbalancedBranch { span: Span },
    #[error("Ring bond {label} is never closed")]
    UnclosedRing { label: String },
    #[error("Bond at position {span:?} does not connect two atoms")]
    DanglingBond { span: Span },
    #[error("Atom and bond counts must be given together")]
    PartialCounts,
}

/// Turns a structure encoding into atom/bond counts.
pub trait StructureAnalyzer {
    fn analyze(&self, encoding: &str) -> Result<Counts, StructureError>;
}

/// Counts heavy atoms and bonds in organic-subset SMILES.
///
/// Implicit hydrogens are not atoms. Every atom that follows another in a
/// chain or branch adds one bond, whatever its order, and every matched
/// ring-closure pair adds one more.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmilesAnalyzer;

impl StructureAnalyzer for SmilesAnalyzer {
    fn analyze(&self, encoding: &str) -> Result<Counts, StructureError> {
        let mut walk = Walk::default();
        for token in Lexer::tokenize(encoding.trim()) {
            if token.kind == TokenKind::Eof {
                break;
            }
            walk.step(&token)?;
        }
        walk.finish()
    }
}

#[derive(Default)]
struct Walk {
    atoms: u32,
    bonds: u32,
    /// Atom the next atom attaches to
    prev: Option<u32>,
    /// Attachment points saved by open branches
    branches: Vec<(Option<u32>, Span)>,
    /// Ring labels waiting for their partner
    rings: HashMap<String, u32>,
    /// Explicit bond symbol not yet consumed
    pending_bond: Option<Span>,
}

impl Walk {
    fn step(&mut self, token: &Token) -> Result<(), StructureError> {
        match token.kind {
            TokenKind::Atom => self.add_atom(),
            TokenKind::BracketAtom => {
                validate_bracket_atom(token)?;
                self.add_atom();
            }
            TokenKind::Bond => {
                if self.prev.is_none() || self.pending_bond.is_some() {
                    return Err(StructureError::DanglingBond { span: token.span });
                }
                self.pending_bond = Some(token.span);
            }
            TokenKind::RingClosure => {
                let Some(atom) = self.prev else {
                    return Err(StructureError::UnexpectedCharacter {
                        text: token.text.clone(),
                        span: token.span,
                    });
                };
                match self.rings.remove(&token.text) {
                    Some(partner) if partner != atom => self.bonds += 1,
                    Some(_) => {
                        return Err(StructureError::UnexpectedCharacter {
                            text: token.text.clone(),
                            span: token.span,
                        });
                    }
                    None => {
                        self.rings.insert(token.text.clone(), atom);
                    }
                }
                self.pending_bond = None;
            }
            TokenKind::LParen => {
                if self.prev.is_none() || self.pending_bond.is_some() {
                    return Err(StructureError::UnbalancedBranch { span: token.span });
                }
                self.branches.push((self.prev, token.span));
            }
            TokenKind::RParen => {
                if let Some(span) = self.pending_bond {
                    return Err(StructureError::DanglingBond { span });
                }
                let Some((attach, _)) = self.branches.pop() else {
                    return Err(StructureError::UnbalancedBranch { span: token.span });
                };
                self.prev = attach;
            }
            TokenKind::Dot => {
                if self.prev.is_none() || self.pending_bond.is_some() {
                    return Err(StructureError::UnexpectedCharacter {
                        text: token.text.clone(),
                        span: token.span,
                    });
                }
                self.prev = None;
            }
            TokenKind::Error | TokenKind::Eof => {
                if token.text.starts_with('[') {
                    return Err(StructureError::InvalidBracketAtom {
                        text: token.text.clone(),
                        span: token.span,
                    });
                }
                return Err(StructureError::UnexpectedCharacter {
                    text: token.text.clone(),
                    span: token.span,
                });
            }
        }
        Ok(())
    }

    fn add_atom(&mut self) {
        let id = self.atoms;
        self.atoms += 1;
        if self.prev.is_some() {
            self.bonds += 1;
        }
        self.pending_bond = None;
        self.prev = Some(id);
    }

    fn finish(self) -> Result<Counts, StructureError> {
        if let Some(span) = self.pending_bond {
            return Err(StructureError::DanglingBond { span });
        }
        if let Some((_, span)) = self.branches.last() {
            return Err(StructureError::UnbalancedBranch { span: *span });
        }
        if let Some(label) = self.rings.keys().min() {
            return Err(StructureError::UnclosedRing { label: label.clone() });
        }
        if self.atoms == 0 {
            return Err(StructureError::Empty);
        }
        Ok(Counts::new(self.atoms, self.bonds))
    }
}

/// `[` isotope? symbol ... `]` with a letter right after the isotope digits
fn validate_bracket_atom(token: &Token) -> Result<(), StructureError> {
    let inner = token
        .text
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or_default();
    let symbol = inner.trim_start_matches(|c: char| c.is_ascii_digit());
    if symbol.starts_with(|c: char| c.is_ascii_alphabetic() || c == '*') {
        Ok(())
    } else {
        Err(StructureError::InvalidBracketAtom {
            text: token.text.clone(),
            span: token.span,
        })
    }
}
