//! AST node types produced by [`JsParser`](super::JsParser).
//!
//! The shapes loosely follow ESTree, trimmed to the subset of the language
//! the snippet runner evaluates.

use std::fmt::Debug;
use std::rc::Rc;

/// Byte offsets of a node in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}

/// A parsed script.
#[derive(Debug)]
pub struct ProgramData {
    pub body: Vec<StatementType>,
    /// Names declared with `var` anywhere in the body (outside nested functions).
    pub var_names: Vec<String>,
}

#[derive(Debug)]
pub enum StatementType {
    EmptyStatement,
    ExpressionStatement {
        expression: ExpressionType,
    },
    BlockStatement(BlockStatementData),
    VariableDeclaration(VariableDeclarationData),
    FunctionDeclaration(Rc<FunctionData>),
    IfStatement {
        test: ExpressionType,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    WhileStatement {
        test: ExpressionType,
        body: Box<StatementType>,
    },
    DoWhileStatement {
        body: Box<StatementType>,
        test: ExpressionType,
    },
    ForStatement {
        init: Option<ForInit>,
        test: Option<ExpressionType>,
        update: Option<ExpressionType>,
        body: Box<StatementType>,
    },
    ForInStatement(ForIteratorData),
    ForOfStatement(ForIteratorData),
    SwitchStatement {
        discriminant: ExpressionType,
        cases: Vec<SwitchCaseData>,
    },
    BreakStatement,
    ContinueStatement,
    ReturnStatement {
        argument: Option<ExpressionType>,
    },
    ThrowStatement {
        argument: ExpressionType,
    },
    TryStatement {
        block: BlockStatementData,
        handler: Option<CatchClauseData>,
        finalizer: Option<BlockStatementData>,
    },
}

#[derive(Debug)]
pub struct BlockStatementData {
    pub body: Vec<StatementType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug)]
pub struct VariableDeclarationData {
    pub kind: VariableDeclarationKind,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug)]
pub struct VariableDeclaratorData {
    pub id: PatternType,
    pub init: Option<ExpressionType>,
}

#[derive(Debug)]
pub enum ForInit {
    VariableDeclaration(VariableDeclarationData),
    Expression(ExpressionType),
}

#[derive(Debug)]
pub enum ForBinding {
    Declaration(VariableDeclarationKind, PatternType),
    Identifier(String),
}

#[derive(Debug)]
pub struct ForIteratorData {
    pub left: ForBinding,
    pub right: ExpressionType,
    pub body: Box<StatementType>,
}

#[derive(Debug)]
pub struct SwitchCaseData {
    /// `None` for the `default:` clause.
    pub test: Option<ExpressionType>,
    pub consequent: Vec<StatementType>,
}

#[derive(Debug)]
pub struct CatchClauseData {
    pub param: Option<PatternType>,
    pub body: BlockStatementData,
}

/// Destructuring and plain binding targets.
#[derive(Debug)]
pub enum PatternType {
    Identifier(String),
    ArrayPattern {
        elements: Vec<Option<PatternElement>>,
        rest: Option<Box<PatternType>>,
    },
    ObjectPattern {
        properties: Vec<ObjectPatternProperty>,
        rest: Option<Box<PatternType>>,
    },
}

impl PatternType {
    /// All identifiers bound by this pattern, in source order.
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = vec![];
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names(&self, names: &mut Vec<String>) {
        match self {
            PatternType::Identifier(name) => names.push(name.clone()),
            PatternType::ArrayPattern { elements, rest } => {
                for element in elements.iter().flatten() {
                    element.target.collect_bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.collect_bound_names(names);
                }
            }
            PatternType::ObjectPattern { properties, rest } => {
                for property in properties {
                    property.value.target.collect_bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.collect_bound_names(names);
                }
            }
        }
    }
}

/// A pattern with an optional default value (`a = 1`).
#[derive(Debug)]
pub struct PatternElement {
    pub target: PatternType,
    pub default: Option<ExpressionType>,
}

#[derive(Debug)]
pub struct ObjectPatternProperty {
    pub key: PropertyKey,
    pub value: PatternElement,
}

#[derive(Debug)]
pub enum PropertyKey {
    Static(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug)]
pub enum FunctionBodyOrExpression {
    FunctionBody(Vec<StatementType>),
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<String>,
    pub params: Vec<PatternElement>,
    pub rest: Option<PatternType>,
    pub body: FunctionBodyOrExpression,
    pub is_arrow: bool,
    pub is_async: bool,
    /// Declared in a `function` statement (as opposed to an expression).
    pub is_declaration: bool,
    pub var_names: Vec<String>,
    /// Source text of the whole function, as returned by `String(fn)`.
    pub source_text: String,
}

impl FunctionData {
    /// Number of parameters before the first default or rest, as `fn.length` reports.
    pub fn length(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| p.default.is_none())
            .count()
    }
}

#[derive(Debug)]
pub enum ExpressionOrSpreadElement {
    Expression(ExpressionType),
    SpreadElement(ExpressionType),
}

#[derive(Debug)]
pub enum PropertyData {
    KeyValue {
        key: PropertyKey,
        value: ExpressionType,
    },
    Shorthand(String),
    Method {
        key: PropertyKey,
        function: Rc<FunctionData>,
    },
    Spread(ExpressionType),
}

#[derive(Debug)]
pub enum MemberProperty {
    Static(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug)]
pub enum AssignmentTarget {
    Identifier(String),
    Member {
        object: Box<ExpressionType>,
        property: MemberProperty,
    },
    Pattern(PatternType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    NullLiteral,
    BooleanLiteral(bool),
    NumberLiteral(f64),
    BigIntLiteral(i128),
    StringLiteral(String),
}

#[derive(Debug)]
pub enum ExpressionType {
    Literal(LiteralType),
    TemplateLiteral {
        quasis: Vec<String>,
        expressions: Vec<ExpressionType>,
    },
    Identifier(String),
    ThisExpression,
    ArrayExpression(Vec<Option<ExpressionOrSpreadElement>>),
    ObjectExpression(Vec<PropertyData>),
    FunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    /// `await argument`, only produced inside async functions.
    AwaitExpression(Box<ExpressionType>),
    UpdateExpression {
        operator: UpdateOperator,
        argument: Box<ExpressionType>,
        prefix: bool,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        operator: AssignmentOperator,
        left: AssignmentTarget,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    CallExpression {
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionOrSpreadElement>,
        optional: bool,
    },
    NewExpression {
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionOrSpreadElement>,
    },
    MemberExpression {
        object: Box<ExpressionType>,
        property: MemberProperty,
        optional: bool,
    },
    /// Wraps a member/call chain containing `?.` so the whole chain short-circuits.
    ChainExpression(Box<ExpressionType>),
    SequenceExpression(Vec<ExpressionType>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    Or,
    And,
    NullishCoalescing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
    ExponentEquals,
    NullishEquals,
    OrEquals,
    AndEquals,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::AddEquals => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractEquals => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyEquals => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideEquals => Some(BinaryOperator::Divide),
            AssignmentOperator::ModuloEquals => Some(BinaryOperator::Modulo),
            AssignmentOperator::ExponentEquals => Some(BinaryOperator::Exponent),
            _ => None,
        }
    }
}
