//! Grammar model
//!
//! A [`Grammar`] maps each non-terminal to its ordered list of alternatives.
//! An alternative is a sequence of [`GrammarSymbol`]s; the empty sequence is
//! the λ production.
//!
//! The model is generic over the non-terminal and terminal types so the set
//! computations in [`super::sets`] and the table builder in [`super::table`]
//! can be exercised on small hand-written grammars. The dinein language
//! grammar itself lives at the bottom of this module and is built once per
//! process by [`language_tables`].

use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

use indexmap::IndexMap;

use super::lexer::TokenKind;
use super::sets::{self, FirstSets, FollowSets, PredictSets};
use super::table::{self, GrammarConflict, ParseTable};

/// Bounds shared by terminal and non-terminal types.
pub trait Atom: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {}

impl<A> Atom for A where A: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {}

/// One symbol on the right-hand side of a production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarSymbol<N, T> {
    Terminal(T),
    NonTerminal(N),
}

impl<N: fmt::Display, T: fmt::Display> fmt::Display for GrammarSymbol<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(t) => write!(f, "{}", t),
            GrammarSymbol::NonTerminal(n) => write!(f, "{}", n),
        }
    }
}

/// Right-hand side of a rule. Empty means λ.
pub type Production<N, T> = Vec<GrammarSymbol<N, T>>;

/// Render a production the way it is written in the grammar table.
pub fn render_production<N: fmt::Display, T: fmt::Display>(production: &[GrammarSymbol<N, T>]) -> String {
    if production.is_empty() {
        return String::from("λ");
    }
    production
        .iter()
        .map(|symbol| symbol.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A context-free grammar with a distinguished start symbol
#[derive(Debug, Clone)]
pub struct Grammar<N, T> {
    start: N,
    rules: IndexMap<N, Vec<Production<N, T>>>,
}

impl<N: Atom, T: Atom> Grammar<N, T> {
    pub fn new(start: N) -> Self {
        Grammar {
            start,
            rules: IndexMap::new(),
        }
    }

    /// Add a rule. Alternatives keep the order they are given in.
    pub fn rule(mut self, head: N, alternatives: Vec<Production<N, T>>) -> Self {
        self.rules.entry(head).or_default().extend(alternatives);
        self
    }

    pub fn start(&self) -> N {
        self.start
    }

    /// Non-terminals in declaration order
    pub fn nonterminals(&self) -> impl Iterator<Item = N> + '_ {
        self.rules.keys().copied()
    }

    pub fn alternatives(&self, head: N) -> &[Production<N, T>] {
        self.rules.get(&head).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(head, alternative index, production)` in declaration order.
    pub fn productions(&self) -> impl Iterator<Item = (N, usize, &Production<N, T>)> + '_ {
        self.rules.iter().flat_map(|(head, alternatives)| {
            alternatives
                .iter()
                .enumerate()
                .map(move |(index, production)| (*head, index, production))
        })
    }

    pub fn is_nonterminal(&self, symbol: N) -> bool {
        self.rules.contains_key(&symbol)
    }
}

/// Non-terminals of the dinein grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerminal {
    Program,
    GlobalDec,
    Declarations,
    DataType,
    DataType2,
    DecOrInit,
    NextDecOrInit,
    Literals,
    Literals2,
    Literals3,
    YumOrBleh,
    Elements,
    ElementTail,
    Function,
    Parameters,
    ParamTail,
    LocalDec,
    LocalDeclarations,
    StatementBlock,
    Statement,
    StatementIdTail,
    ArgumentList,
    ArgumentTail,
    Expression,
    ExpressionTail,
    ExpressionOperand,
    ExpressionOperator,
    ArithmeticExp,
    ArithmeticTail,
    ArithmeticOperand,
    ArithmeticOperator,
    Value,
    ValueIdTail,
    Value2,
    Value3,
    AssignmentOperator,
    UnaryOp,
    ConditionalStatement,
    ConditionalTail,
    Condition,
    ConditionTail,
    ConditionOperand,
    ConditionOperator,
    CaseTail,
    Literals4,
    DefaultBlock,
    LoopingStatement,
    PinchOpt,
    ForInit,
    IncDec,
    ServeTail,
}

impl NonTerminal {
    pub fn name(self) -> &'static str {
        match self {
            NonTerminal::Program => "program",
            NonTerminal::GlobalDec => "global_dec",
            NonTerminal::Declarations => "declarations",
            NonTerminal::DataType => "data_type",
            NonTerminal::DataType2 => "data_type2",
            NonTerminal::DecOrInit => "dec_or_init",
            NonTerminal::NextDecOrInit => "next_dec_or_init",
            NonTerminal::Literals => "literals",
            NonTerminal::Literals2 => "literals2",
            NonTerminal::Literals3 => "literals3",
            NonTerminal::YumOrBleh => "yum_or_bleh",
            NonTerminal::Elements => "elements",
            NonTerminal::ElementTail => "elementtail",
            NonTerminal::Function => "function",
            NonTerminal::Parameters => "parameters",
            NonTerminal::ParamTail => "param_tail",
            NonTerminal::LocalDec => "local_dec",
            NonTerminal::LocalDeclarations => "local_declarations",
            NonTerminal::StatementBlock => "statement_block",
            NonTerminal::Statement => "statement",
            NonTerminal::StatementIdTail => "statement_id_tail",
            NonTerminal::ArgumentList => "argument_list",
            NonTerminal::ArgumentTail => "argument_tail",
            NonTerminal::Expression => "expression",
            NonTerminal::ExpressionTail => "expression_tail",
            NonTerminal::ExpressionOperand => "expression_operand",
            NonTerminal::ExpressionOperator => "expression_operator",
            NonTerminal::ArithmeticExp => "arithmetic_exp",
            NonTerminal::ArithmeticTail => "arithmetic_tail",
            NonTerminal::ArithmeticOperand => "arithmetic_operand",
            NonTerminal::ArithmeticOperator => "arithmetic_operator",
            NonTerminal::Value => "value",
            NonTerminal::ValueIdTail => "value_id_tail",
            NonTerminal::Value2 => "value2",
            NonTerminal::Value3 => "value3",
            NonTerminal::AssignmentOperator => "assignment_operator",
            NonTerminal::UnaryOp => "unary_op",
            NonTerminal::ConditionalStatement => "conditional_statement",
            NonTerminal::ConditionalTail => "conditional_tail",
            NonTerminal::Condition => "condition",
            NonTerminal::ConditionTail => "condition_tail",
            NonTerminal::ConditionOperand => "condition_operand",
            NonTerminal::ConditionOperator => "condition_operator",
            NonTerminal::CaseTail => "case_tail",
            NonTerminal::Literals4 => "literals4",
            NonTerminal::DefaultBlock => "default_block",
            NonTerminal::LoopingStatement => "looping_statement",
            NonTerminal::PinchOpt => "pinch_opt",
            NonTerminal::ForInit => "for_init",
            NonTerminal::IncDec => "inc_dec",
            NonTerminal::ServeTail => "serve_tail",
        }
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// Symbol type of the dinein grammar
pub type LangSymbol = GrammarSymbol<NonTerminal, TokenKind>;

impl From<TokenKind> for LangSymbol {
    fn from(kind: TokenKind) -> Self {
        GrammarSymbol::Terminal(kind)
    }
}

impl From<NonTerminal> for LangSymbol {
    fn from(nt: NonTerminal) -> Self {
        GrammarSymbol::NonTerminal(nt)
    }
}

macro_rules! prod {
    ($($symbol:expr),* $(,)?) => {
        vec![$(LangSymbol::from($symbol)),*]
    };
}

/// Build the dinein grammar.
pub fn dinein_grammar() -> Grammar<NonTerminal, TokenKind> {
    use NonTerminal as N;
    use TokenKind as T;

    Grammar::new(N::Program)
        .rule(
            N::Program,
            vec![prod![
                T::Dinein,
                N::GlobalDec,
                N::Function,
                T::Chef,
                T::Pinch,
                T::Dish,
                T::LParen,
                T::RParen,
                T::LBrace,
                N::LocalDec,
                N::StatementBlock,
                T::Spit,
                T::PinchLiteral,
                T::Semicolon,
                T::RBrace,
                T::Takeout,
            ]],
        )
        .rule(
            N::GlobalDec,
            vec![prod![N::Declarations, N::GlobalDec], prod![]],
        )
        .rule(
            N::Declarations,
            vec![
                prod![N::DataType, T::Id, N::DecOrInit, T::Semicolon],
                prod![
                    T::Recipe,
                    N::DataType2,
                    T::Id,
                    T::LBracket,
                    T::PinchLiteral,
                    T::RBracket,
                    N::Elements,
                    T::Semicolon,
                ],
            ],
        )
        .rule(
            N::DataType,
            vec![prod![T::Pinch], prod![T::Skim], prod![T::Pasta], prod![T::Bool]],
        )
        .rule(
            N::DataType2,
            vec![prod![T::Pinch], prod![T::Skim], prod![T::Pasta]],
        )
        .rule(
            N::DecOrInit,
            vec![
                prod![T::Assign, N::Literals, N::NextDecOrInit],
                prod![N::NextDecOrInit],
            ],
        )
        .rule(
            N::NextDecOrInit,
            vec![prod![T::Comma, T::Id, N::DecOrInit], prod![]],
        )
        .rule(
            N::Literals,
            vec![
                prod![T::PinchLiteral],
                prod![T::SkimLiteral],
                prod![T::PastaLiteral],
                prod![N::YumOrBleh],
            ],
        )
        .rule(
            N::Literals2,
            vec![
                prod![T::PinchLiteral],
                prod![T::SkimLiteral],
                prod![T::PastaLiteral],
            ],
        )
        .rule(
            N::Literals3,
            vec![prod![T::PastaLiteral], prod![N::YumOrBleh]],
        )
        .rule(N::YumOrBleh, vec![prod![T::Yum], prod![T::Bleh]])
        .rule(
            N::Elements,
            vec![
                prod![T::Assign, T::LBrace, N::Literals, N::ElementTail, T::RBrace],
                prod![],
            ],
        )
        .rule(
            N::ElementTail,
            vec![prod![T::Comma, N::Literals, N::ElementTail], prod![]],
        )
        .rule(
            N::Function,
            vec![
                prod![
                    T::Full,
                    N::DataType,
                    T::Id,
                    T::LParen,
                    N::Parameters,
                    T::RParen,
                    T::LBrace,
                    N::LocalDec,
                    N::StatementBlock,
                    T::Spit,
                    N::Expression,
                    T::Semicolon,
                    T::RBrace,
                    N::Function,
                ],
                prod![
                    T::Hungry,
                    T::Id,
                    T::LParen,
                    N::Parameters,
                    T::RParen,
                    T::LBrace,
                    N::LocalDec,
                    N::StatementBlock,
                    T::RBrace,
                    N::Function,
                ],
                prod![],
            ],
        )
        .rule(
            N::Parameters,
            vec![prod![N::DataType, T::Id, N::ParamTail], prod![]],
        )
        .rule(
            N::ParamTail,
            vec![prod![T::Comma, N::DataType, T::Id, N::ParamTail], prod![]],
        )
        .rule(
            N::LocalDec,
            vec![prod![N::LocalDeclarations, N::LocalDec], prod![]],
        )
        .rule(
            N::LocalDeclarations,
            vec![
                prod![N::DataType, T::Id, N::DecOrInit, T::Semicolon],
                prod![
                    T::Recipe,
                    N::DataType2,
                    T::Id,
                    T::LBracket,
                    T::PinchLiteral,
                    T::RBracket,
                    N::Elements,
                    T::Semicolon,
                ],
            ],
        )
        .rule(
            N::StatementBlock,
            vec![prod![N::Statement, N::StatementBlock], prod![]],
        )
        .rule(
            N::Statement,
            vec![
                prod![T::Id, N::StatementIdTail],
                prod![N::UnaryOp, T::Id, T::Semicolon],
                prod![N::ConditionalStatement],
                prod![N::LoopingStatement],
                prod![
                    T::Serve,
                    T::LParen,
                    N::Value3,
                    N::ServeTail,
                    T::RParen,
                    T::Semicolon,
                ],
                prod![T::Make, T::LParen, T::Id, T::RParen, T::Semicolon],
            ],
        )
        .rule(
            N::StatementIdTail,
            vec![
                prod![T::LParen, N::ArgumentList, T::RParen, T::Semicolon],
                prod![N::AssignmentOperator, N::Expression, T::Semicolon],
                prod![
                    T::LBracket,
                    T::PinchLiteral,
                    T::RBracket,
                    N::AssignmentOperator,
                    N::ArithmeticExp,
                    T::Semicolon,
                ],
                prod![N::UnaryOp, T::Semicolon],
            ],
        )
        .rule(
            N::ArgumentList,
            vec![prod![N::ArithmeticExp, N::ArgumentTail], prod![]],
        )
        .rule(
            N::ArgumentTail,
            vec![prod![T::Comma, N::ArithmeticExp, N::ArgumentTail], prod![]],
        )
        .rule(
            N::Expression,
            vec![prod![N::ExpressionOperand, N::ExpressionTail]],
        )
        .rule(
            N::ExpressionTail,
            vec![
                prod![N::ExpressionOperator, N::ExpressionOperand, N::ExpressionTail],
                prod![],
            ],
        )
        .rule(
            N::ExpressionOperand,
            vec![
                prod![N::Value],
                prod![T::LParen, N::Expression, T::RParen],
                prod![T::Bang, T::LParen, N::Expression, T::RParen],
                prod![T::BangBang, T::LParen, N::Expression, T::RParen],
            ],
        )
        .rule(
            N::ExpressionOperator,
            [
                T::Plus,
                T::Minus,
                T::Star,
                T::Slash,
                T::Percent,
                T::EqEq,
                T::NotEq,
                T::Lt,
                T::Gt,
                T::Le,
                T::Ge,
                T::AndAnd,
                T::OrOr,
            ]
            .into_iter()
            .map(|op| prod![op])
            .collect(),
        )
        .rule(
            N::ArithmeticExp,
            vec![prod![N::ArithmeticOperand, N::ArithmeticTail]],
        )
        .rule(
            N::ArithmeticTail,
            vec![
                prod![N::ArithmeticOperator, N::ArithmeticOperand, N::ArithmeticTail],
                prod![],
            ],
        )
        .rule(
            N::ArithmeticOperand,
            vec![
                prod![N::Value2],
                prod![T::LParen, N::ArithmeticExp, T::RParen],
            ],
        )
        .rule(
            N::ArithmeticOperator,
            [T::Plus, T::Minus, T::Star, T::Slash, T::Percent]
                .into_iter()
                .map(|op| prod![op])
                .collect(),
        )
        .rule(
            N::Value,
            vec![prod![N::Literals], prod![T::Id, N::ValueIdTail]],
        )
        .rule(
            N::ValueIdTail,
            vec![
                prod![T::LParen, N::ArgumentList, T::RParen],
                prod![T::LBracket, T::PinchLiteral, T::RBracket],
                prod![],
            ],
        )
        .rule(
            N::Value2,
            vec![prod![N::Literals2], prod![T::Id, N::ValueIdTail]],
        )
        .rule(
            N::Value3,
            vec![prod![N::Literals3], prod![T::Id, N::ValueIdTail]],
        )
        .rule(
            N::AssignmentOperator,
            [
                T::Assign,
                T::PlusEq,
                T::MinusEq,
                T::StarEq,
                T::SlashEq,
                T::PercentEq,
            ]
            .into_iter()
            .map(|op| prod![op])
            .collect(),
        )
        .rule(
            N::UnaryOp,
            vec![prod![T::PlusPlus], prod![T::MinusMinus]],
        )
        .rule(
            N::ConditionalStatement,
            vec![
                prod![
                    T::Taste,
                    T::LParen,
                    N::Condition,
                    T::RParen,
                    T::LBrace,
                    N::StatementBlock,
                    T::RBrace,
                    N::ConditionalTail,
                ],
                prod![
                    T::Flip,
                    T::LParen,
                    T::Id,
                    T::RParen,
                    T::LBrace,
                    T::Case,
                    N::Literals4,
                    T::Colon,
                    N::StatementBlock,
                    T::Chop,
                    T::Semicolon,
                    N::CaseTail,
                    N::DefaultBlock,
                    T::RBrace,
                ],
            ],
        )
        .rule(
            N::ConditionalTail,
            vec![
                prod![
                    T::Elif,
                    T::LParen,
                    N::Condition,
                    T::RParen,
                    T::LBrace,
                    N::StatementBlock,
                    T::RBrace,
                    N::ConditionalTail,
                ],
                prod![T::Mix, T::LBrace, N::StatementBlock, T::RBrace],
                prod![],
            ],
        )
        .rule(
            N::Condition,
            vec![prod![N::ConditionOperand, N::ConditionTail]],
        )
        .rule(
            N::ConditionTail,
            vec![
                prod![N::ConditionOperator, N::ConditionOperand, N::ConditionTail],
                prod![],
            ],
        )
        .rule(
            N::ConditionOperand,
            vec![
                prod![N::Value],
                prod![T::LParen, N::Condition, T::RParen],
                prod![T::Bang, T::LParen, N::Condition, T::RParen],
                prod![T::BangBang, T::LParen, N::Condition, T::RParen],
            ],
        )
        .rule(
            N::ConditionOperator,
            [
                T::EqEq,
                T::NotEq,
                T::Lt,
                T::Gt,
                T::Le,
                T::Ge,
                T::AndAnd,
                T::OrOr,
            ]
            .into_iter()
            .map(|op| prod![op])
            .collect(),
        )
        .rule(
            N::CaseTail,
            vec![
                prod![
                    T::Case,
                    N::Literals4,
                    T::Colon,
                    N::StatementBlock,
                    T::Chop,
                    T::Semicolon,
                    N::CaseTail,
                ],
                prod![],
            ],
        )
        .rule(
            N::Literals4,
            vec![prod![T::PinchLiteral], prod![T::PastaLiteral]],
        )
        .rule(
            N::DefaultBlock,
            vec![
                prod![T::Default, T::Colon, N::StatementBlock, T::Chop, T::Semicolon],
                prod![],
            ],
        )
        .rule(
            N::LoopingStatement,
            vec![
                prod![
                    T::For,
                    T::LParen,
                    N::PinchOpt,
                    T::Id,
                    T::Assign,
                    N::ForInit,
                    T::Semicolon,
                    N::Condition,
                    T::Semicolon,
                    N::IncDec,
                    T::RParen,
                    T::LBrace,
                    N::StatementBlock,
                    T::RBrace,
                ],
                prod![
                    T::Simmer,
                    T::LParen,
                    N::Condition,
                    T::RParen,
                    T::LBrace,
                    N::StatementBlock,
                    T::RBrace,
                ],
                prod![
                    T::Keepmix,
                    T::LBrace,
                    N::StatementBlock,
                    T::RBrace,
                    T::Simmer,
                    T::LParen,
                    N::Condition,
                    T::RParen,
                ],
            ],
        )
        .rule(N::PinchOpt, vec![prod![T::Pinch], prod![]])
        .rule(
            N::ForInit,
            vec![prod![T::PinchLiteral], prod![T::Id, N::ValueIdTail]],
        )
        .rule(
            N::IncDec,
            vec![prod![T::Id, N::UnaryOp], prod![N::UnaryOp, T::Id]],
        )
        .rule(
            N::ServeTail,
            vec![prod![T::Plus, N::Value3, N::ServeTail], prod![]],
        )
}

/// Everything derived from the dinein grammar. Built once, read-only after.
#[derive(Debug)]
pub struct LanguageTables {
    pub grammar: Grammar<NonTerminal, TokenKind>,
    pub first: FirstSets<NonTerminal, TokenKind>,
    pub follow: FollowSets<NonTerminal, TokenKind>,
    pub predict: PredictSets<NonTerminal, TokenKind>,
    pub table: ParseTable<NonTerminal, TokenKind>,
}

impl LanguageTables {
    /// Derive the sets and the parse table from a grammar.
    pub fn build(grammar: Grammar<NonTerminal, TokenKind>) -> Result<Self, GrammarConflict> {
        let first = sets::first_sets(&grammar);
        let follow = sets::follow_sets(&grammar, grammar.start(), &first);
        let predict = sets::predict_sets(&grammar, &first, &follow);
        let table = table::build_table(&predict)?;

        tracing::info!(
            nonterminals = grammar.nonterminals().count(),
            productions = predict.len(),
            "parse table built"
        );

        Ok(LanguageTables {
            grammar,
            first,
            follow,
            predict,
            table,
        })
    }
}

static LANGUAGE_TABLES: OnceLock<Result<LanguageTables, GrammarConflict>> = OnceLock::new();

/// Process-wide tables for the dinein grammar, built on first use.
pub fn language_tables() -> Result<&'static LanguageTables, GrammarConflict> {
    LANGUAGE_TABLES
        .get_or_init(|| LanguageTables::build(dinein_grammar()))
        .as_ref()
        .map_err(Clone::clone)
}
