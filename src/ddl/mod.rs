//! DDL handling: statement splitting, dependency ordering and the external parser.

mod lexer;
mod order;

#[cfg(not(target_arch = "wasm32"))]
mod locate;
#[cfg(not(target_arch = "wasm32"))]
mod parser;

pub use lexer::{split_statements, RawStatement, TrailingComment};
pub use order::{classify, collect_statements, order_statements, Statement, StatementKind};

#[cfg(not(target_arch = "wasm32"))]
pub use locate::{GoBuilder, ParserBuilder, ParserLocator};
#[cfg(not(target_arch = "wasm32"))]
pub use parser::{DdlParser, ProcessParser};
