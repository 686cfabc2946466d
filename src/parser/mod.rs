// Column rule grammars

pub mod ast;
pub mod expr;
pub mod footer;
pub mod lexer;
pub mod link;
pub mod pattern;

// Public API re-exports
pub use ast::{BinaryOp, Expr, FooterRule, LinkParam, LinkTemplate, LinkValue, UnaryOp};
pub use expr::parse_expression;
pub use footer::parse_footer;
pub use link::parse_link;
