pub mod ast;
pub mod cli;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod program;
pub mod registry;
pub mod selection;
pub mod value;

pub use ast::{GraphKind, Node, NodeType, Pipe};
pub use evaluator::{EvalError, Evaluator};
pub use lexer::{CompileError, Lexer};
pub use output::{to_json, to_json_pretty, Response, ResponseError};
pub use parser::Parser;
pub use pipeline::PipelineError;
pub use program::{NodeId, Program};
pub use registry::Registry;
pub use selection::{Selection, SelectionError, SelectionKind, SelectionRef};
pub use value::{Value, ValueError};

/// Compiles an expression into a reusable [`Program`].
pub fn compile(expression: impl AsRef<[u8]>) -> Result<Program, CompileError> {
    Parser::new(Lexer::new(expression.as_ref())).parse()
}

/// Compiles `expression` and runs it over `document` in one step.
///
/// A compile failure is reported in the response's errors with null data.
pub fn parse_from_str(document: &str, expression: &str) -> Response {
    match compile(expression) {
        Ok(program) => program.run(document),
        Err(e) => Response::failed(format!("compile error: {}", e)),
    }
}
