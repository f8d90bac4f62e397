/*! The program tree consumed by the resolver.

A [`TranslationUnit`] owns one arena per node kind. Nodes refer to their
children by [`Handle`], so every expression, assignable expression,
statement and block has an identity of its own: two structurally equal
subtrees appended separately are distinct nodes, and the resolver's side
tables keep them apart.

User-defined names (structs, aliases, functions, variables) are referred to
by string until resolution.
*/

use crate::arena::{Arena, Handle};
use crate::types::{AccessMode, AddressSpace, Scalar, TextureKind, VectorSize};

#[derive(Debug, Default)]
pub struct TranslationUnit {
    /// `enable`, `requires` and `diagnostic` directives, in textual order.
    pub directives: Vec<Directive>,
    /// Module-scope declarations, in textual order.
    pub decls: Arena<GlobalDecl>,
    /// Every expression of the unit: initializers, attribute arguments,
    /// array sizes and function bodies alike.
    pub expressions: Arena<Expression>,
    pub lhs_expressions: Arena<LhsExpression>,
    pub statements: Arena<Statement>,
    pub blocks: Arena<Block>,
    /// Type annotations, like `vec4<f32>` or `array<i32, N>`.
    pub types: Arena<TypeDecl>,
}

impl TranslationUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_expression(&mut self, expression: Expression) -> Handle<Expression> {
        self.expressions.append(expression)
    }

    pub fn append_lhs(&mut self, lhs: LhsExpression) -> Handle<LhsExpression> {
        self.lhs_expressions.append(lhs)
    }

    pub fn append_statement(&mut self, statement: Statement) -> Handle<Statement> {
        self.statements.append(statement)
    }

    pub fn append_block(&mut self, stmts: Vec<Handle<Statement>>) -> Handle<Block> {
        self.blocks.append(Block { stmts })
    }

    pub fn append_type(&mut self, ty: TypeDecl) -> Handle<TypeDecl> {
        self.types.append(ty)
    }

    pub fn append_decl(&mut self, decl: GlobalDecl) -> Handle<GlobalDecl> {
        self.decls.append(decl)
    }

    /// Names enabled by `enable` directives.
    pub fn enabled_extensions(&self) -> impl Iterator<Item = &str> {
        self.directives
            .iter()
            .flat_map(|directive| match *directive {
                Directive::Enable(ref names) => &names[..],
                Directive::Requires(_) | Directive::Diagnostic { .. } => &[][..],
            })
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// `enable f16, subgroups;`
    Enable(Vec<String>),
    /// `requires readonly_and_readwrite_storage_textures;`
    Requires(Vec<String>),
    /// `diagnostic(off, derivative_uniformity);`
    Diagnostic { severity: String, rule: String },
}

/// A module-scope declaration.
#[derive(Debug)]
pub enum GlobalDecl {
    Function(Function),
    Variable(GlobalVariable),
    Constant(Const),
    Override(Override),
    Struct(Struct),
    TypeAlias(TypeAlias),
    ConstAssert(Handle<Expression>),
}

impl GlobalDecl {
    /// The name this declaration introduces at module scope, if any.
    pub fn name(&self) -> Option<&str> {
        match *self {
            GlobalDecl::Function(ref f) => Some(&f.name),
            GlobalDecl::Variable(ref v) => Some(&v.name),
            GlobalDecl::Constant(ref c) => Some(&c.name),
            GlobalDecl::Override(ref o) => Some(&o.name),
            GlobalDecl::Struct(ref s) => Some(&s.name),
            GlobalDecl::TypeAlias(ref a) => Some(&a.name),
            GlobalDecl::ConstAssert(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum Attribute {
    Align(Handle<Expression>),
    Binding(Handle<Expression>),
    BlendSrc(Handle<Expression>),
    Builtin(String),
    Compute,
    Const,
    Diagnostic { severity: String, rule: String },
    Fragment,
    Group(Handle<Expression>),
    Id(Handle<Expression>),
    Interpolate {
        kind: String,
        sampling: Option<String>,
    },
    Invariant,
    Location(Handle<Expression>),
    MustUse,
    Size(Handle<Expression>),
    Vertex,
    WorkgroupSize([Option<Handle<Expression>>; 3]),
}

impl Attribute {
    /// The expressions this attribute takes as arguments.
    pub fn expressions(&self) -> impl Iterator<Item = Handle<Expression>> {
        let args: [Option<Handle<Expression>>; 3] = match *self {
            Attribute::Align(e)
            | Attribute::Binding(e)
            | Attribute::BlendSrc(e)
            | Attribute::Group(e)
            | Attribute::Id(e)
            | Attribute::Location(e)
            | Attribute::Size(e) => [Some(e), None, None],
            Attribute::WorkgroupSize(sizes) => sizes,
            Attribute::Builtin(_)
            | Attribute::Compute
            | Attribute::Const
            | Attribute::Diagnostic { .. }
            | Attribute::Fragment
            | Attribute::Interpolate { .. }
            | Attribute::Invariant
            | Attribute::MustUse
            | Attribute::Vertex => [None, None, None],
        };
        IntoIterator::into_iter(args).flatten()
    }
}

#[derive(Debug)]
pub struct FunctionParameter {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: Handle<TypeDecl>,
}

#[derive(Debug)]
pub struct FunctionResult {
    pub attributes: Vec<Attribute>,
    pub ty: Handle<TypeDecl>,
}

#[derive(Debug)]
pub struct Function {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub parameters: Vec<FunctionParameter>,
    pub result: Option<FunctionResult>,
    pub body: Handle<Block>,
}

#[derive(Debug)]
pub struct GlobalVariable {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub space: Option<AddressSpace>,
    pub access: Option<AccessMode>,
    pub ty: Option<Handle<TypeDecl>>,
    pub init: Option<Handle<Expression>>,
}

#[derive(Debug)]
pub struct Const {
    pub name: String,
    pub ty: Option<Handle<TypeDecl>>,
    pub init: Handle<Expression>,
}

#[derive(Debug)]
pub struct Override {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: Option<Handle<TypeDecl>>,
    pub init: Option<Handle<Expression>>,
}

#[derive(Debug)]
pub struct StructMember {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: Handle<TypeDecl>,
}

#[derive(Debug)]
pub struct Struct {
    pub name: String,
    pub members: Vec<StructMember>,
}

#[derive(Debug)]
pub struct TypeAlias {
    pub name: String,
    pub ty: Handle<TypeDecl>,
}

/// A type as written in a declaration or constructor.
#[derive(Debug)]
pub enum TypeDecl {
    Scalar(Scalar),
    Vector {
        size: VectorSize,
        component: Handle<TypeDecl>,
    },
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        component: Handle<TypeDecl>,
    },
    /// `size` is `None` for runtime-sized arrays.
    Array {
        base: Handle<TypeDecl>,
        size: Option<Handle<Expression>>,
    },
    Atomic(Handle<TypeDecl>),
    Pointer {
        space: AddressSpace,
        base: Handle<TypeDecl>,
        access: Option<AccessMode>,
    },
    Texture(TextureKind),
    Sampler {
        comparison: bool,
    },
    /// A user-defined type: a struct or a type alias.
    Named(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    AbstractInt(i64),
    I32(i32),
    U32(u32),
    AbstractFloat(f64),
    F32(f32),
    /// Stored widened; the value is exactly representable as `f16`.
    F16(f32),
}

impl Literal {
    pub const fn scalar(self) -> Scalar {
        match self {
            Literal::Bool(_) => Scalar::Bool,
            Literal::AbstractInt(_) => Scalar::AbstractInt,
            Literal::I32(_) => Scalar::I32,
            Literal::U32(_) => Scalar::U32,
            Literal::AbstractFloat(_) => Scalar::AbstractFloat,
            Literal::F32(_) => Scalar::F32,
            Literal::F16(_) => Scalar::F16,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum UnaryOperator {
    Negate,
    LogicalNot,
    BitwiseNot,
    /// `*p`
    Deref,
    /// `&r`
    AddressOf,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    ExclusiveOr,
    InclusiveOr,
    LogicalAnd,
    LogicalOr,
    ShiftLeft,
    ShiftRight,
}

/// A type at the head of a [`Construct`] expression.
///
/// The component type of vectors and matrices, and both the element type and
/// count of arrays, may be left out and inferred from the arguments.
///
/// This does not cover structs or types referred to by type aliases: those
/// are constructed with [`Call`] expressions naming them.
///
/// [`Construct`]: Expression::Construct
/// [`Call`]: Expression::Call
#[derive(Debug)]
pub enum ConstructorType {
    /// A scalar type or conversion: `f32(1)`.
    Scalar(Scalar),
    /// `vec3<f32>(...)` or `vec3(...)`.
    Vector {
        size: VectorSize,
        component: Option<Handle<TypeDecl>>,
    },
    /// `mat2x2<f32>(...)` or `mat2x2(...)`.
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        component: Option<Handle<TypeDecl>>,
    },
    /// `array<u32, 4>(...)` or `array(...)`.
    Array {
        base: Option<Handle<TypeDecl>>,
        size: Option<Handle<Expression>>,
    },
}

#[derive(Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Paren(Handle<Expression>),
    Unary {
        op: UnaryOperator,
        expr: Handle<Expression>,
    },
    Binary {
        op: BinaryOperator,
        left: Handle<Expression>,
        right: Handle<Expression>,
    },
    Index {
        base: Handle<Expression>,
        index: Handle<Expression>,
    },
    Member {
        base: Handle<Expression>,
        member: String,
    },
    /// A type constructor expression for a type-defining keyword.
    Construct {
        ty: ConstructorType,
        args: Vec<Handle<Expression>>,
    },
    /// A function call, or a construction of a struct or aliased type.
    ///
    /// `template` is only used by builtins taking an explicit type, like
    /// `bitcast<u32>(x)`.
    Call {
        callee: String,
        template: Option<Handle<TypeDecl>>,
        args: Vec<Handle<Expression>>,
    },
    /// A rewritten expression that carries extra facts about its value.
    Augmented(AugmentedExpression),
}

/// Expressions produced by semantics-preserving program transformations.
///
/// Each wraps the expression it stands for and types like it.
#[derive(Debug)]
pub enum AugmentedExpression {
    /// `expression` is known to evaluate to `known_value`.
    KnownValue {
        known_value: Handle<Expression>,
        expression: Handle<Expression>,
    },
    /// `original` plus a zero value.
    AddZero {
        original: Handle<Expression>,
        zero: Handle<Expression>,
        zero_on_left: bool,
    },
    /// `original` times a one value.
    MulOne {
        original: Handle<Expression>,
        one: Handle<Expression>,
        one_on_left: bool,
    },
    /// A boolean expression that always evaluates to `false`.
    FalseByConstruction(Handle<Expression>),
    /// A boolean expression that always evaluates to `true`.
    TrueByConstruction(Handle<Expression>),
}

impl AugmentedExpression {
    /// The expression whose type this one takes.
    pub const fn wrapped(&self) -> Handle<Expression> {
        match *self {
            AugmentedExpression::KnownValue { expression, .. } => expression,
            AugmentedExpression::AddZero { original, .. }
            | AugmentedExpression::MulOne { original, .. } => original,
            AugmentedExpression::FalseByConstruction(expr)
            | AugmentedExpression::TrueByConstruction(expr) => expr,
        }
    }
}

/// The left-hand side of an assignment, increment or decrement.
#[derive(Debug)]
pub enum LhsExpression {
    Identifier(String),
    Paren(Handle<LhsExpression>),
    Member {
        base: Handle<LhsExpression>,
        member: String,
    },
    /// The index is an ordinary expression.
    Index {
        base: Handle<LhsExpression>,
        index: Handle<Expression>,
    },
    /// `*p`
    Deref(Handle<LhsExpression>),
    /// `&r`
    AddressOf(Handle<LhsExpression>),
}

#[derive(Debug, Default)]
pub struct Block {
    pub stmts: Vec<Handle<Statement>>,
}

#[derive(Debug)]
pub enum Statement {
    /// A nested `{ ... }` block.
    Compound(Handle<Block>),
    If {
        condition: Handle<Expression>,
        accept: Handle<Block>,
        reject: Option<Else>,
    },
    Switch {
        selector: Handle<Expression>,
        clauses: Vec<SwitchClause>,
    },
    Loop {
        body: Handle<Block>,
        continuing: Option<Continuing>,
    },
    For {
        init: Option<Handle<Statement>>,
        condition: Option<Handle<Expression>>,
        update: Option<Handle<Statement>>,
        body: Handle<Block>,
    },
    While {
        condition: Handle<Expression>,
        body: Handle<Block>,
    },
    Break,
    Continue,
    Discard,
    Return(Option<Handle<Expression>>),
    Call {
        callee: String,
        args: Vec<Handle<Expression>>,
    },
    /// `lhs op= rhs`. A `None` left-hand side is the phony `_ = rhs`.
    Assignment {
        lhs: Option<Handle<LhsExpression>>,
        op: Option<BinaryOperator>,
        rhs: Handle<Expression>,
    },
    Increment(Handle<LhsExpression>),
    Decrement(Handle<LhsExpression>),
    Variable(LocalVariable),
    /// `let` or function-scope `const`.
    Value(LocalValue),
    ConstAssert(Handle<Expression>),
    Empty,
    Augmented(AugmentedStatement),
}

#[derive(Debug)]
pub enum Else {
    Block(Handle<Block>),
    /// `else if ...`: the handle is an [`Statement::If`].
    If(Handle<Statement>),
}

#[derive(Debug)]
pub enum CaseSelector {
    Expression(Handle<Expression>),
    Default,
}

#[derive(Debug)]
pub struct SwitchClause {
    pub selectors: Vec<CaseSelector>,
    pub body: Handle<Block>,
}

#[derive(Debug)]
pub struct Continuing {
    pub body: Handle<Block>,
    pub break_if: Option<Handle<Expression>>,
}

#[derive(Debug)]
pub struct LocalVariable {
    pub name: String,
    pub space: Option<AddressSpace>,
    pub access: Option<AccessMode>,
    pub ty: Option<Handle<TypeDecl>>,
    pub init: Option<Handle<Expression>>,
}

#[derive(Debug)]
pub struct LocalValue {
    pub name: String,
    /// `const` rather than `let`.
    pub constant: bool,
    pub ty: Option<Handle<TypeDecl>>,
    pub init: Handle<Expression>,
}

#[derive(Debug)]
pub enum AugmentedStatement {
    /// Code that never executes, inserted by a transformation.
    DeadCodeFragment(Handle<Statement>),
}
