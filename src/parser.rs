use crate::{
    ast::{GraphKind, Node, NodeType, Pipe, Signal},
    lexer::{CompileError, Lexer},
    program::Program,
};

/// Recursive-descent parser for GraphQuery expressions.
///
/// ```text
/// Program    := Object | Node
/// Object     := '{' Node* '}'
/// Node       := Name Pipelines? Children? ';'?
/// Pipelines  := '`' ( Pipeline ';'? )* '`'
/// Pipeline   := FuncName '(' ( '"' chars '"' ','? )* ')'
/// Children   := '[' Node* ']' | '[' '{' Node* '}' ']' | '{' Node* '}'
/// ```
///
/// Every routine returns `Result`, so the first error aborts the whole parse
/// and nothing after it is scanned.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Parser { lexer }
    }

    /// Parses a complete program.
    ///
    /// Input after the first complete top-level construct is ignored.
    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let (kind, nodes) = self.parse_nodes()?;
        Ok(Program::from_nodes(kind, nodes))
    }

    /// Parses the top level into an output kind and its declared nodes.
    pub fn parse_nodes(&mut self) -> Result<(GraphKind, Vec<Node>), CompileError> {
        match self.lexer.peek_signal() {
            Signal::Object => Ok((GraphKind::Object, self.parse_object()?)),
            _ => Ok((GraphKind::Atom, vec![self.parse_node()?])),
        }
    }

    fn expect(&mut self, operation: &'static str, expected: u8) -> Result<(), CompileError> {
        match self.lexer.next_token() {
            Some(c) if c == expected => Ok(()),
            found => Err(self.lexer.mismatch(operation, expected, found)),
        }
    }

    /// `{ Node* }`
    pub fn parse_object(&mut self) -> Result<Vec<Node>, CompileError> {
        self.expect("read_object", b'{')?;
        self.parse_nodes_until("read_object", b'}')
    }

    fn parse_nodes_until(
        &mut self,
        operation: &'static str,
        close: u8,
    ) -> Result<Vec<Node>, CompileError> {
        let mut nodes = Vec::new();
        loop {
            match self.lexer.peek_byte() {
                Some(c) if c == close => {
                    self.lexer.next_token();
                    return Ok(nodes);
                }
                None => return Err(self.lexer.mismatch(operation, close, None)),
                Some(_) => nodes.push(self.parse_node()?),
            }
        }
    }

    /// `Name Pipelines? Children?`
    pub fn parse_node(&mut self) -> Result<Node, CompileError> {
        if self.lexer.peek_signal() != Signal::Name {
            let found = self.lexer.next_token();
            return Err(self.lexer.unexpected("read_node", found));
        }
        let name = self.parse_name()?;
        let pipeline = match self.lexer.peek_signal() {
            Signal::Pipeline => self.parse_pipelines()?,
            _ => Vec::new(),
        };
        let (node_type, children) = self.parse_children()?;
        if self.lexer.peek_byte() == Some(b';') {
            self.lexer.next_token();
        }
        Ok(Node {
            name,
            node_type,
            pipeline,
            children,
        })
    }

    fn parse_name(&mut self) -> Result<String, CompileError> {
        self.lexer.skip_whitespace();
        let name = self.lexer.read_name();
        match self.lexer.current() {
            None | Some(b' ' | b'\t' | b'\r' | b'\n' | b'`' | b'[' | b'{' | b']' | b'}' | b';') => {
                Ok(name.to_string())
            }
            Some(found) => {
                self.lexer.set_position(self.lexer.position() + 1);
                Err(self.lexer.unexpected("read_node_name", Some(found)))
            }
        }
    }

    /// `` ` ( Pipeline ';'? )* ` ``
    fn parse_pipelines(&mut self) -> Result<Vec<Pipe>, CompileError> {
        self.expect("read_pipelines", b'`')?;
        let mut pipes = Vec::new();
        loop {
            match self.lexer.next_token() {
                Some(b'`') => return Ok(pipes),
                Some(b';') => continue,
                None => return Err(self.lexer.mismatch("read_pipelines", b'`', None)),
                Some(_) => {
                    self.lexer.unread();
                    pipes.push(self.parse_pipe()?);
                }
            }
        }
    }

    fn parse_pipe(&mut self) -> Result<Pipe, CompileError> {
        self.lexer.skip_whitespace();
        let name = self.lexer.read_name();
        if name.is_empty() {
            let found = self.lexer.next_token();
            return Err(self.lexer.unexpected("read_func_name", found));
        }
        Ok(Pipe {
            name: name.to_string(),
            args: self.parse_arguments()?,
        })
    }

    /// `( "arg", "arg" )` with an optional comma after each argument.
    fn parse_arguments(&mut self) -> Result<Vec<String>, CompileError> {
        self.expect("read_string_tuple", b'(')?;
        let mut args = Vec::new();
        loop {
            match self.lexer.next_token() {
                Some(b')') => return Ok(args),
                Some(b'"') => {
                    let Some(raw) = self.lexer.read_until(b'"') else {
                        self.lexer.set_position(usize::MAX);
                        return Err(self.lexer.mismatch("read_string_tuple", b'"', None));
                    };
                    let arg = std::str::from_utf8(raw).map_err(|e| {
                        self.lexer
                            .error("read_string_tuple", format!("argument is not UTF-8: {}", e))
                    })?;
                    args.push(arg.to_string());
                    if self.lexer.peek_byte() == Some(b',') {
                        self.lexer.next_token();
                    }
                }
                found => return Err(self.lexer.unexpected("read_string_tuple", found)),
            }
        }
    }

    /// Decides the node type from the trailing syntax.
    ///
    /// After `[` the next significant byte is peeked: `{` means an object
    /// array, anything else a plain array.
    fn parse_children(&mut self) -> Result<(NodeType, Vec<Node>), CompileError> {
        match self.lexer.peek_byte() {
            Some(b'[') => {
                self.lexer.next_token();
                if self.lexer.peek_byte() == Some(b'{') {
                    self.lexer.next_token();
                    let children = self.parse_nodes_until("read_object_array", b'}')?;
                    self.expect("read_object_array", b']')?;
                    Ok((NodeType::ObjectArray, children))
                } else {
                    let children = self.parse_nodes_until("read_array", b']')?;
                    Ok((NodeType::Array, children))
                }
            }
            Some(b'{') => Ok((NodeType::Object, self.parse_object()?)),
            _ => Ok((NodeType::String, Vec::new())),
        }
    }
}
