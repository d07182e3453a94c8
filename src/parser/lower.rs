//! Parse tree → typed AST
//!
//! Walks the tree produced by the table-driven parser and builds the
//! [`ast`](super::ast) types. The tree is assumed to come from a successful
//! parse; anything that does not fit the grammar shape is reported as a
//! [`LowerError`] rather than a panic.
//!
//! Operator chains (`<expression_tail>`, `<condition_tail>`,
//! `<arithmetic_tail>`) are flat in the grammar. They are folded here with
//! the precedence table on [`BinaryOp`].

use std::rc::Rc;
use std::slice;

use thiserror::Error;

use super::ast::*;
use super::grammar::NonTerminal;
use super::lexer::TokenKind;
use super::tree::{NodeTag, ParseTreeNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("malformed parse tree at line {line}: expected {expected}, found {found}")]
    Malformed {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("invalid literal '{lexeme}' at line {line}")]
    InvalidLiteral { lexeme: String, line: usize },
}

type Result<T> = std::result::Result<T, LowerError>;

/// Sequential access to a node's children
struct Children<'a> {
    parent: &'a ParseTreeNode,
    iter: std::iter::Peekable<slice::Iter<'a, ParseTreeNode>>,
}

impl<'a> Children<'a> {
    fn of(parent: &'a ParseTreeNode) -> Self {
        Children {
            parent,
            iter: parent.children.iter().peekable(),
        }
    }

    fn peek_tag(&mut self) -> Option<NodeTag> {
        self.iter.peek().map(|node| node.tag)
    }

    fn next(&mut self, expected: impl FnOnce() -> String) -> Result<&'a ParseTreeNode> {
        self.iter.next().ok_or_else(|| LowerError::Malformed {
            expected: expected(),
            found: String::from("end of production"),
            line: self.parent.line,
        })
    }

    fn token(&mut self, kind: TokenKind) -> Result<&'a ParseTreeNode> {
        let node = self.next(|| kind.to_string())?;
        if node.tag == NodeTag::Terminal(kind) {
            Ok(node)
        } else {
            Err(malformed(kind.to_string(), node))
        }
    }

    fn lexeme(&mut self, kind: TokenKind) -> Result<&'a str> {
        let node = self.token(kind)?;
        Ok(node.value.as_deref().unwrap_or_default())
    }

    fn node(&mut self, nt: NonTerminal) -> Result<&'a ParseTreeNode> {
        let node = self.next(|| nt.to_string())?;
        if node.tag == NodeTag::NonTerminal(nt) {
            Ok(node)
        } else {
            Err(malformed(nt.to_string(), node))
        }
    }

    fn skip(&mut self) -> Result<&'a ParseTreeNode> {
        self.next(|| String::from("a symbol"))
    }
}

fn malformed(expected: String, node: &ParseTreeNode) -> LowerError {
    LowerError::Malformed {
        expected,
        found: node.tag.to_string(),
        line: node.line,
    }
}

/// Lower the root `<program>` node.
pub fn lower_program(root: &ParseTreeNode) -> Result<Program> {
    if root.tag != NodeTag::NonTerminal(NonTerminal::Program) {
        return Err(malformed(NonTerminal::Program.to_string(), root));
    }

    let mut c = Children::of(root);
    c.token(TokenKind::Dinein)?;
    let globals = declaration_list(c.node(NonTerminal::GlobalDec)?, NonTerminal::GlobalDec)?;
    let functions = function_list(c.node(NonTerminal::Function)?)?;
    for kind in [
        TokenKind::Chef,
        TokenKind::Pinch,
        TokenKind::Dish,
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::LBrace,
    ] {
        c.token(kind)?;
    }
    let locals = declaration_list(c.node(NonTerminal::LocalDec)?, NonTerminal::LocalDec)?;
    let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;
    c.token(TokenKind::Spit)?;
    let code = c.token(TokenKind::PinchLiteral)?;
    let exit_code = parse_integer(code)?;

    Ok(Program {
        globals,
        functions,
        locals,
        body,
        exit_code,
        exit_line: code.line,
    })
}

/// `<global_dec>` / `<local_dec>` chains
fn declaration_list(mut node: &ParseTreeNode, chain: NonTerminal) -> Result<Vec<Declaration>> {
    let mut out = Vec::new();
    while !node.is_lambda() {
        let mut c = Children::of(node);
        let decl = c.skip()?;
        out.push(declaration(decl)?);
        node = c.node(chain)?;
    }
    Ok(out)
}

/// `<declarations>` / `<local_declarations>`
fn declaration(node: &ParseTreeNode) -> Result<Declaration> {
    let mut c = Children::of(node);

    if c.peek_tag() == Some(NodeTag::Terminal(TokenKind::Recipe)) {
        c.token(TokenKind::Recipe)?;
        let element = data_type(c.node(NonTerminal::DataType2)?)?;
        let name_node = c.token(TokenKind::Id)?;
        c.token(TokenKind::LBracket)?;
        let dimension = c.lexeme(TokenKind::PinchLiteral)?.to_string();
        c.token(TokenKind::RBracket)?;
        let elements = elements(c.node(NonTerminal::Elements)?)?;
        return Ok(Declaration::Array(ArrayDecl {
            element,
            name: leaf_text(name_node),
            dimension,
            elements,
            line: name_node.line,
        }));
    }

    let data_type = data_type(c.node(NonTerminal::DataType)?)?;
    let first = c.token(TokenKind::Id)?;
    let mut declarators = Vec::new();
    let mut current = Declarator {
        name: leaf_text(first),
        init: None,
        line: first.line,
    };

    // <dec_or_init> → = <literals> <next_dec_or_init> | <next_dec_or_init>
    let mut dec_or_init = c.node(NonTerminal::DecOrInit)?;
    loop {
        let mut d = Children::of(dec_or_init);
        if d.peek_tag() == Some(NodeTag::Terminal(TokenKind::Assign)) {
            d.token(TokenKind::Assign)?;
            current.init = Some(literal(d.node(NonTerminal::Literals)?)?);
        }
        let next = d.node(NonTerminal::NextDecOrInit)?;
        declarators.push(current);

        if next.is_lambda() {
            break;
        }
        let mut n = Children::of(next);
        n.token(TokenKind::Comma)?;
        let name = n.token(TokenKind::Id)?;
        current = Declarator {
            name: leaf_text(name),
            init: None,
            line: name.line,
        };
        dec_or_init = n.node(NonTerminal::DecOrInit)?;
    }

    Ok(Declaration::Variables {
        data_type,
        declarators,
    })
}

fn data_type(node: &ParseTreeNode) -> Result<DataType> {
    let leaf = Children::of(node).skip()?;
    match leaf.token_kind() {
        Some(TokenKind::Pinch) => Ok(DataType::Pinch),
        Some(TokenKind::Skim) => Ok(DataType::Skim),
        Some(TokenKind::Pasta) => Ok(DataType::Pasta),
        Some(TokenKind::Bool) => Ok(DataType::Bool),
        _ => Err(malformed(String::from("a data type"), leaf)),
    }
}

/// `<elements>`: optional `= { lit, lit, ... }`
fn elements(node: &ParseTreeNode) -> Result<Option<Vec<Literal>>> {
    if node.is_lambda() {
        return Ok(None);
    }
    let mut c = Children::of(node);
    c.token(TokenKind::Assign)?;
    c.token(TokenKind::LBrace)?;
    let mut out = vec![literal(c.node(NonTerminal::Literals)?)?];
    let mut tail = c.node(NonTerminal::ElementTail)?;
    while !tail.is_lambda() {
        let mut t = Children::of(tail);
        t.token(TokenKind::Comma)?;
        out.push(literal(t.node(NonTerminal::Literals)?)?);
        tail = t.node(NonTerminal::ElementTail)?;
    }
    Ok(Some(out))
}

/// Any of the literal non-terminals, or a literal leaf.
fn literal(node: &ParseTreeNode) -> Result<Literal> {
    match node.tag {
        NodeTag::Terminal(TokenKind::PinchLiteral) => Ok(Literal::Pinch(parse_integer(node)?)),
        NodeTag::Terminal(TokenKind::SkimLiteral) => {
            let text = leaf_text(node);
            text.parse::<f64>()
                .map(Literal::Skim)
                .map_err(|_| LowerError::InvalidLiteral {
                    lexeme: text,
                    line: node.line,
                })
        }
        NodeTag::Terminal(TokenKind::PastaLiteral) => Ok(Literal::Pasta(unquote(&leaf_text(node)))),
        NodeTag::Terminal(TokenKind::Yum) => Ok(Literal::Bool(true)),
        NodeTag::Terminal(TokenKind::Bleh) => Ok(Literal::Bool(false)),
        NodeTag::NonTerminal(_) => literal(Children::of(node).skip()?),
        _ => Err(malformed(String::from("a literal"), node)),
    }
}

fn parse_integer(node: &ParseTreeNode) -> Result<i64> {
    let text = leaf_text(node);
    text.parse::<i64>().map_err(|_| LowerError::InvalidLiteral {
        lexeme: text,
        line: node.line,
    })
}

fn leaf_text(node: &ParseTreeNode) -> String {
    node.value.clone().unwrap_or_default()
}

fn unquote(lexeme: &str) -> String {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
        .to_string()
}

/// `<function>` chain
fn function_list(mut node: &ParseTreeNode) -> Result<Vec<Rc<FunctionDef>>> {
    let mut out = Vec::new();
    while !node.is_lambda() {
        let mut c = Children::of(node);
        let header = c.skip()?;
        let line = header.line;

        let return_type = match header.token_kind() {
            Some(TokenKind::Full) => Some(data_type(c.node(NonTerminal::DataType)?)?),
            Some(TokenKind::Hungry) => None,
            _ => return Err(malformed(String::from("full or hungry"), header)),
        };

        let name = leaf_text(c.token(TokenKind::Id)?);
        c.token(TokenKind::LParen)?;
        let params = parameters(c.node(NonTerminal::Parameters)?)?;
        c.token(TokenKind::RParen)?;
        c.token(TokenKind::LBrace)?;
        let locals = declaration_list(c.node(NonTerminal::LocalDec)?, NonTerminal::LocalDec)?;
        let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;

        let result = if return_type.is_some() {
            c.token(TokenKind::Spit)?;
            let expr = expression(c.node(NonTerminal::Expression)?)?;
            c.token(TokenKind::Semicolon)?;
            Some(expr)
        } else {
            None
        };
        c.token(TokenKind::RBrace)?;

        out.push(Rc::new(FunctionDef {
            name,
            return_type,
            params,
            locals,
            body,
            result,
            line,
        }));
        node = c.node(NonTerminal::Function)?;
    }
    Ok(out)
}

fn parameters(node: &ParseTreeNode) -> Result<Vec<Param>> {
    let mut out = Vec::new();
    if node.is_lambda() {
        return Ok(out);
    }

    // <parameters> and <param_tail> differ only by the leading comma
    let mut current = node;
    loop {
        let mut c = Children::of(current);
        if c.peek_tag() == Some(NodeTag::Terminal(TokenKind::Comma)) {
            c.token(TokenKind::Comma)?;
        }
        let data_type = data_type(c.node(NonTerminal::DataType)?)?;
        let name = c.token(TokenKind::Id)?;
        out.push(Param {
            data_type,
            name: leaf_text(name),
            line: name.line,
        });
        current = c.node(NonTerminal::ParamTail)?;
        if current.is_lambda() {
            return Ok(out);
        }
    }
}

fn statement_block(mut node: &ParseTreeNode) -> Result<Vec<Statement>> {
    let mut out = Vec::new();
    while !node.is_lambda() {
        let mut c = Children::of(node);
        out.push(statement(c.node(NonTerminal::Statement)?)?);
        node = c.node(NonTerminal::StatementBlock)?;
    }
    Ok(out)
}

fn statement(node: &ParseTreeNode) -> Result<Statement> {
    let mut c = Children::of(node);
    let first = c.skip()?;
    let line = first.line;

    match first.tag {
        NodeTag::Terminal(TokenKind::Id) => id_statement(leaf_text(first), line, c.node(NonTerminal::StatementIdTail)?),

        NodeTag::NonTerminal(NonTerminal::UnaryOp) => {
            let op = step_op(first)?;
            let name = leaf_text(c.token(TokenKind::Id)?);
            Ok(Statement::Step { name, op, line })
        }

        NodeTag::NonTerminal(NonTerminal::ConditionalStatement) => conditional(first),

        NodeTag::NonTerminal(NonTerminal::LoopingStatement) => looping(first),

        NodeTag::Terminal(TokenKind::Serve) => {
            c.token(TokenKind::LParen)?;
            let mut parts = vec![value(c.node(NonTerminal::Value3)?)?];
            let mut tail = c.node(NonTerminal::ServeTail)?;
            while !tail.is_lambda() {
                let mut t = Children::of(tail);
                t.token(TokenKind::Plus)?;
                parts.push(value(t.node(NonTerminal::Value3)?)?);
                tail = t.node(NonTerminal::ServeTail)?;
            }
            Ok(Statement::Serve { parts, line })
        }

        NodeTag::Terminal(TokenKind::Make) => {
            c.token(TokenKind::LParen)?;
            let target = leaf_text(c.token(TokenKind::Id)?);
            Ok(Statement::Make { target, line })
        }

        _ => Err(malformed(String::from("a statement"), first)),
    }
}

/// `id <statement_id_tail>`
fn id_statement(name: String, line: usize, tail: &ParseTreeNode) -> Result<Statement> {
    let mut c = Children::of(tail);
    let first = c.skip()?;

    match first.tag {
        NodeTag::Terminal(TokenKind::LParen) => {
            let args = argument_list(c.node(NonTerminal::ArgumentList)?)?;
            Ok(Statement::Call { name, args, line })
        }
        NodeTag::NonTerminal(NonTerminal::AssignmentOperator) => {
            let op = assign_op(first)?;
            let value = expression(c.node(NonTerminal::Expression)?)?;
            Ok(Statement::Assign {
                target: Place::Variable(name),
                op,
                value,
                line,
            })
        }
        NodeTag::Terminal(TokenKind::LBracket) => {
            let index = parse_integer(c.token(TokenKind::PinchLiteral)?)?;
            c.token(TokenKind::RBracket)?;
            let op = assign_op(c.node(NonTerminal::AssignmentOperator)?)?;
            let value = expression(c.node(NonTerminal::ArithmeticExp)?)?;
            Ok(Statement::Assign {
                target: Place::Element { name, index },
                op,
                value,
                line,
            })
        }
        NodeTag::NonTerminal(NonTerminal::UnaryOp) => Ok(Statement::Step {
            name,
            op: step_op(first)?,
            line,
        }),
        _ => Err(malformed(NonTerminal::StatementIdTail.to_string(), first)),
    }
}

fn argument_list(node: &ParseTreeNode) -> Result<Vec<Expr>> {
    let mut out = Vec::new();
    if node.is_lambda() {
        return Ok(out);
    }
    let mut c = Children::of(node);
    out.push(expression(c.node(NonTerminal::ArithmeticExp)?)?);
    let mut tail = c.node(NonTerminal::ArgumentTail)?;
    while !tail.is_lambda() {
        let mut t = Children::of(tail);
        t.token(TokenKind::Comma)?;
        out.push(expression(t.node(NonTerminal::ArithmeticExp)?)?);
        tail = t.node(NonTerminal::ArgumentTail)?;
    }
    Ok(out)
}

fn assign_op(node: &ParseTreeNode) -> Result<AssignOp> {
    let leaf = Children::of(node).skip()?;
    match leaf.token_kind() {
        Some(TokenKind::Assign) => Ok(AssignOp::Assign),
        Some(TokenKind::PlusEq) => Ok(AssignOp::AddAssign),
        Some(TokenKind::MinusEq) => Ok(AssignOp::SubAssign),
        Some(TokenKind::StarEq) => Ok(AssignOp::MulAssign),
        Some(TokenKind::SlashEq) => Ok(AssignOp::DivAssign),
        Some(TokenKind::PercentEq) => Ok(AssignOp::ModAssign),
        _ => Err(malformed(NonTerminal::AssignmentOperator.to_string(), leaf)),
    }
}

fn step_op(node: &ParseTreeNode) -> Result<StepOp> {
    let leaf = Children::of(node).skip()?;
    match leaf.token_kind() {
        Some(TokenKind::PlusPlus) => Ok(StepOp::Increment),
        Some(TokenKind::MinusMinus) => Ok(StepOp::Decrement),
        _ => Err(malformed(NonTerminal::UnaryOp.to_string(), leaf)),
    }
}

fn binary_op(node: &ParseTreeNode) -> Result<BinaryOp> {
    let leaf = Children::of(node).skip()?;
    let op = match leaf.token_kind() {
        Some(TokenKind::Plus) => BinaryOp::Add,
        Some(TokenKind::Minus) => BinaryOp::Sub,
        Some(TokenKind::Star) => BinaryOp::Mul,
        Some(TokenKind::Slash) => BinaryOp::Div,
        Some(TokenKind::Percent) => BinaryOp::Mod,
        Some(TokenKind::EqEq) => BinaryOp::Equal,
        Some(TokenKind::NotEq) => BinaryOp::NotEqual,
        Some(TokenKind::Lt) => BinaryOp::Less,
        Some(TokenKind::Gt) => BinaryOp::Greater,
        Some(TokenKind::Le) => BinaryOp::LessEqual,
        Some(TokenKind::Ge) => BinaryOp::GreaterEqual,
        Some(TokenKind::AndAnd) => BinaryOp::And,
        Some(TokenKind::OrOr) => BinaryOp::Or,
        _ => return Err(malformed(String::from("an operator"), leaf)),
    };
    Ok(op)
}

/// `<expression>`, `<condition>` or `<arithmetic_exp>`: an operand followed
/// by a flat tail of operator/operand pairs.
fn expression(node: &ParseTreeNode) -> Result<Expr> {
    let mut c = Children::of(node);
    let first = operand(c.skip()?)?;
    let mut rest = Vec::new();

    let mut tail = c.skip()?;
    while !tail.is_lambda() {
        let mut t = Children::of(tail);
        let op = binary_op(t.skip()?)?;
        let rhs = operand(t.skip()?)?;
        rest.push((op, rhs));
        tail = t.skip()?;
    }

    fold_chain(first, rest)
}

/// Fold a flat operand/operator chain into a tree using operator precedence.
fn fold_chain(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Result<Expr> {
    let line = first.line();
    let mut operands = vec![first];
    let mut operators: Vec<BinaryOp> = Vec::new();

    for (op, rhs) in rest {
        while let Some(&top) = operators.last() {
            if top.precedence() < op.precedence() {
                break;
            }
            operators.pop();
            reduce(&mut operands, top, line)?;
        }
        operators.push(op);
        operands.push(rhs);
    }
    while let Some(op) = operators.pop() {
        reduce(&mut operands, op, line)?;
    }

    operands.pop().ok_or_else(|| LowerError::Malformed {
        expected: String::from("an operand"),
        found: String::from("empty chain"),
        line,
    })
}

fn reduce(operands: &mut Vec<Expr>, op: BinaryOp, line: usize) -> Result<()> {
    let missing = || LowerError::Malformed {
        expected: String::from("an operand"),
        found: format!("dangling '{}'", op),
        line,
    };
    let right = operands.pop().ok_or_else(missing)?;
    let left = operands.pop().ok_or_else(missing)?;
    operands.push(Expr::Binary {
        op,
        line: left.line(),
        left: Box::new(left),
        right: Box::new(right),
    });
    Ok(())
}

/// `<expression_operand>`, `<condition_operand>` or `<arithmetic_operand>`
fn operand(node: &ParseTreeNode) -> Result<Expr> {
    let mut c = Children::of(node);
    let first = c.skip()?;
    let line = first.line;

    match first.tag {
        NodeTag::Terminal(TokenKind::LParen) => expression(c.skip()?),
        NodeTag::Terminal(TokenKind::Bang) => {
            c.token(TokenKind::LParen)?;
            Ok(Expr::Not {
                operand: Box::new(expression(c.skip()?)?),
                line,
            })
        }
        NodeTag::Terminal(TokenKind::BangBang) => {
            c.token(TokenKind::LParen)?;
            Ok(Expr::DoubleNot {
                operand: Box::new(expression(c.skip()?)?),
                line,
            })
        }
        NodeTag::NonTerminal(_) => value(first),
        _ => Err(malformed(String::from("an operand"), first)),
    }
}

/// `<value>`, `<value2>`, `<value3>` or `<for_init>`
fn value(node: &ParseTreeNode) -> Result<Expr> {
    let mut c = Children::of(node);
    let first = c.skip()?;
    let line = first.line;

    if first.tag != NodeTag::Terminal(TokenKind::Id) {
        return Ok(Expr::Literal {
            value: literal(first)?,
            line,
        });
    }

    let name = leaf_text(first);
    let tail = c.node(NonTerminal::ValueIdTail)?;
    if tail.is_lambda() {
        return Ok(Expr::Variable { name, line });
    }

    let mut t = Children::of(tail);
    match t.peek_tag() {
        Some(NodeTag::Terminal(TokenKind::LParen)) => {
            t.token(TokenKind::LParen)?;
            let args = argument_list(t.node(NonTerminal::ArgumentList)?)?;
            Ok(Expr::Call { name, args, line })
        }
        _ => {
            t.token(TokenKind::LBracket)?;
            let index = parse_integer(t.token(TokenKind::PinchLiteral)?)?;
            Ok(Expr::Element { name, index, line })
        }
    }
}

fn conditional(node: &ParseTreeNode) -> Result<Statement> {
    let mut c = Children::of(node);
    let keyword = c.skip()?;
    let line = keyword.line;

    match keyword.token_kind() {
        Some(TokenKind::Taste) => {
            let mut branches = Vec::new();
            let mut otherwise = None;

            branches.push(branch(&mut c, line)?);
            let mut tail = c.node(NonTerminal::ConditionalTail)?;
            while !tail.is_lambda() {
                let mut t = Children::of(tail);
                let kw = t.skip()?;
                match kw.token_kind() {
                    Some(TokenKind::Elif) => {
                        branches.push(branch(&mut t, kw.line)?);
                        tail = t.node(NonTerminal::ConditionalTail)?;
                    }
                    Some(TokenKind::Mix) => {
                        t.token(TokenKind::LBrace)?;
                        otherwise = Some(statement_block(t.node(NonTerminal::StatementBlock)?)?);
                        break;
                    }
                    _ => return Err(malformed(String::from("elif or mix"), kw)),
                }
            }

            Ok(Statement::If {
                branches,
                otherwise,
                line,
            })
        }

        Some(TokenKind::Flip) => {
            c.token(TokenKind::LParen)?;
            let subject = leaf_text(c.token(TokenKind::Id)?);
            c.token(TokenKind::RParen)?;
            c.token(TokenKind::LBrace)?;

            let mut cases = vec![case_arm(&mut c)?];
            let mut tail = c.node(NonTerminal::CaseTail)?;
            while !tail.is_lambda() {
                let mut t = Children::of(tail);
                cases.push(case_arm(&mut t)?);
                tail = t.node(NonTerminal::CaseTail)?;
            }

            let default_node = c.node(NonTerminal::DefaultBlock)?;
            let default = if default_node.is_lambda() {
                None
            } else {
                let mut d = Children::of(default_node);
                d.token(TokenKind::Default)?;
                d.token(TokenKind::Colon)?;
                Some(statement_block(d.node(NonTerminal::StatementBlock)?)?)
            };

            Ok(Statement::Switch {
                subject,
                cases,
                default,
                line,
            })
        }

        _ => Err(malformed(String::from("taste or flip"), keyword)),
    }
}

/// `( <condition> ) { <statement_block> }` after `taste` / `elif`
fn branch(c: &mut Children<'_>, line: usize) -> Result<Branch> {
    c.token(TokenKind::LParen)?;
    let condition = expression(c.node(NonTerminal::Condition)?)?;
    c.token(TokenKind::RParen)?;
    c.token(TokenKind::LBrace)?;
    let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;
    c.token(TokenKind::RBrace)?;
    Ok(Branch {
        condition,
        body,
        line,
    })
}

/// `case <literals4> : <statement_block> chop ;`
fn case_arm(c: &mut Children<'_>) -> Result<Case> {
    let line = c.token(TokenKind::Case)?.line;
    let value = literal(c.node(NonTerminal::Literals4)?)?;
    c.token(TokenKind::Colon)?;
    let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;
    c.token(TokenKind::Chop)?;
    c.token(TokenKind::Semicolon)?;
    Ok(Case { value, body, line })
}

fn looping(node: &ParseTreeNode) -> Result<Statement> {
    let mut c = Children::of(node);
    let keyword = c.skip()?;
    let line = keyword.line;

    match keyword.token_kind() {
        Some(TokenKind::For) => {
            c.token(TokenKind::LParen)?;
            let declares = !c.node(NonTerminal::PinchOpt)?.is_lambda();
            let var = leaf_text(c.token(TokenKind::Id)?);
            c.token(TokenKind::Assign)?;
            let init = value(c.node(NonTerminal::ForInit)?)?;
            c.token(TokenKind::Semicolon)?;
            let condition = expression(c.node(NonTerminal::Condition)?)?;
            c.token(TokenKind::Semicolon)?;

            let inc_dec = c.node(NonTerminal::IncDec)?;
            let mut s = Children::of(inc_dec);
            let (step_var, step) = match s.peek_tag() {
                Some(NodeTag::Terminal(TokenKind::Id)) => {
                    let name = leaf_text(s.token(TokenKind::Id)?);
                    (name, step_op(s.node(NonTerminal::UnaryOp)?)?)
                }
                _ => {
                    let op = step_op(s.node(NonTerminal::UnaryOp)?)?;
                    (leaf_text(s.token(TokenKind::Id)?), op)
                }
            };

            c.token(TokenKind::RParen)?;
            c.token(TokenKind::LBrace)?;
            let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;

            Ok(Statement::For {
                declares,
                var,
                init,
                condition,
                step_var,
                step,
                body,
                line,
            })
        }

        Some(TokenKind::Simmer) => {
            c.token(TokenKind::LParen)?;
            let condition = expression(c.node(NonTerminal::Condition)?)?;
            c.token(TokenKind::RParen)?;
            c.token(TokenKind::LBrace)?;
            let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;
            Ok(Statement::While {
                condition,
                body,
                line,
            })
        }

        Some(TokenKind::Keepmix) => {
            c.token(TokenKind::LBrace)?;
            let body = statement_block(c.node(NonTerminal::StatementBlock)?)?;
            c.token(TokenKind::RBrace)?;
            c.token(TokenKind::Simmer)?;
            c.token(TokenKind::LParen)?;
            let condition = expression(c.node(NonTerminal::Condition)?)?;
            Ok(Statement::DoWhile {
                body,
                condition,
                line,
            })
        }

        _ => Err(malformed(String::from("for, simmer or keepmix"), keyword)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::parser::grammar::language_tables;
    use crate::parser::lexer::Lexer;
    use crate::parser::parser::parse;

    fn lower_source(source: &str) -> Program {
        let lexed = Lexer::new(source).tokenize();
        let outcome = parse(language_tables().unwrap(), &RunConfig::default(), &lexed.tokens);
        assert!(outcome.success, "{:?}", outcome.errors);
        lower_program(&outcome.tree.unwrap()).unwrap()
    }

    #[test]
    fn test_precedence_folding() {
        let program = lower_source(
            "dinein chef pinch dish() { pinch x; x = 1 + 2 * 3 == 7 ?? bleh; spit 0; } takeout",
        );
        let Statement::Assign { value, .. } = &program.body[0] else {
            panic!("expected assignment");
        };

        // ((1 + (2 * 3)) == 7) ?? bleh
        let Expr::Binary { op: BinaryOp::Or, left, .. } = value else {
            panic!("expected ?? at the root: {:?}", value);
        };
        let Expr::Binary { op: BinaryOp::Equal, left: sum, .. } = left.as_ref() else {
            panic!("expected == under ??");
        };
        let Expr::Binary { op: BinaryOp::Add, right: product, .. } = sum.as_ref() else {
            panic!("expected + under ==");
        };
        assert!(matches!(product.as_ref(), Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let program = lower_source("dinein chef pinch dish() { pinch x; x = 10 - 3 - 2; spit 0; } takeout");
        let Statement::Assign { value, .. } = &program.body[0] else {
            panic!("expected assignment");
        };
        let Expr::Binary { op: BinaryOp::Sub, left, right, .. } = value else {
            panic!("expected subtraction");
        };
        assert!(matches!(left.as_ref(), Expr::Binary { op: BinaryOp::Sub, .. }));
        assert!(matches!(right.as_ref(), Expr::Literal { value: Literal::Pinch(2), .. }));
    }

    #[test]
    fn test_declarators_and_functions() {
        let program = lower_source(
            r#"dinein
pinch a = 1, b, c = 3;
recipe pasta names[2] = {"x", "y"};
full pinch twice(pinch n) { spit n * 2; }
hungry hello() { serve("hi"); }
chef pinch dish() { spit 0; }
takeout"#,
        );

        assert_eq!(program.globals.len(), 2);
        let Declaration::Variables { declarators, .. } = &program.globals[0] else {
            panic!("expected variables");
        };
        let names: Vec<_> = declarators.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(declarators[1].init, None);
        assert_eq!(declarators[2].init, Some(Literal::Pinch(3)));

        let Declaration::Array(array) = &program.globals[1] else {
            panic!("expected array");
        };
        assert_eq!(
            array.elements,
            Some(vec![Literal::Pasta("x".into()), Literal::Pasta("y".into())])
        );

        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[0].return_type, Some(DataType::Pinch));
        assert_eq!(program.functions[0].params.len(), 1);
        assert!(program.functions[0].result.is_some());
        assert_eq!(program.functions[1].return_type, None);
    }

    #[test]
    fn test_for_loop_shape() {
        let program = lower_source(
            "dinein chef pinch dish() { pinch s = 0; for (pinch i = 1; i <= 10; i++) { s += i; } spit 0; } takeout",
        );
        assert_eq!(program.locals.len(), 1);
        let Statement::For { declares, var, step_var, step, body, .. } = &program.body[0] else {
            panic!("expected for loop");
        };
        assert!(*declares);
        assert_eq!(var, "i");
        assert_eq!(step_var, "i");
        assert_eq!(*step, StepOp::Increment);
        assert_eq!(body.len(), 1);
    }
}
