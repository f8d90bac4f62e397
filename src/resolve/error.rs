use std::ops::Range;

use crate::arena::Handle;
use crate::ast::{BinaryOperator, Expression, LhsExpression, TypeDecl, UnaryOperator};
use crate::proc::{ConstEvalError, LayoutError};
use crate::types::{AccessMode, AddressSpace, Type};
use crate::Capabilities;

/// Why a program tree failed to resolve.
///
/// The first malformed construct found aborts resolution; there is no
/// recovery and no partial environment.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error("redefinition of `{name}`")]
    Redefinition { name: String },
    #[error("declaration of `{name}` refers to itself")]
    RecursiveDeclaration { name: String },
    #[error("cyclic declarations: {}", .path.join(" -> "))]
    CyclicDeclaration { path: Vec<String> },

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("{kind} `{name}` cannot be used as a value")]
    NotAValue { name: String, kind: &'static str },
    #[error("{kind} `{name}` cannot be used as a type")]
    NotAType { name: String, kind: &'static str },
    #[error("{kind} `{name}` cannot be called")]
    NotCallable { name: String, kind: &'static str },
    #[error("`{0}` does not return a value")]
    NoReturnValue(String),

    #[error("wrong number of arguments to `{function}`: expected {}..={}, found {found}", .expected.start, .expected.end - 1)]
    WrongArgumentCount {
        function: String,
        expected: Range<usize>,
        found: usize,
    },
    #[error("argument {index} of `{function}` cannot have type `{ty}`")]
    InvalidArgument {
        function: String,
        index: usize,
        ty: Type,
    },
    #[error("`{0}` needs a type argument")]
    MissingTemplateArgument(String),
    #[error("`{0}` does not take a type argument")]
    UnexpectedTemplateArgument(String),

    #[error("expression {expr:?}: `{op:?}` cannot be applied to `{left}` and `{right}`")]
    InvalidBinaryOperands {
        expr: Handle<Expression>,
        op: BinaryOperator,
        left: Type,
        right: Type,
    },
    #[error("expression {expr:?}: `{op:?}` cannot be applied to `{ty}`")]
    InvalidUnaryOperand {
        expr: Handle<Expression>,
        op: UnaryOperator,
        ty: Type,
    },
    #[error("expression {expr:?}: `{ty}` cannot be indexed")]
    NotIndexable { expr: Handle<Expression>, ty: Type },
    #[error("expression {expr:?}: index of type `{ty}` is not an integer")]
    InvalidIndexType { expr: Handle<Expression>, ty: Type },
    #[error("expression {expr:?}: `{ty}` has no member `{member}`")]
    NoSuchMember {
        expr: Handle<Expression>,
        member: String,
        ty: Type,
    },
    #[error("expression {expr:?}: argument {index} of type `{ty}` does not fit the constructed type")]
    InvalidConstructorArgument {
        expr: Handle<Expression>,
        index: usize,
        ty: Type,
    },
    #[error("expression {expr:?}: expected {expected} constructor arguments, found {found}")]
    WrongComponentCount {
        expr: Handle<Expression>,
        expected: usize,
        found: usize,
    },
    #[error("expression {expr:?}: `{ty}` cannot be constructed")]
    NotConstructible { expr: Handle<Expression>, ty: Type },
    #[error("expression {expr:?}: cannot infer the element type of an empty array")]
    CannotInferElementType { expr: Handle<Expression> },
    #[error("expression {expr:?}: known value of type `{known}` does not match `{actual}`")]
    KnownValueMismatch {
        expr: Handle<Expression>,
        known: Type,
        actual: Type,
    },
    #[error("expression {expr:?}: expected `bool`, found `{ty}`")]
    ExpectedBool { expr: Handle<Expression>, ty: Type },
    #[error("expression {expr:?}: switch selector of type `{ty}` is not an integer")]
    InvalidSwitchSelector { expr: Handle<Expression>, ty: Type },
    #[error("expression {expr:?}: case selector of type `{ty}` does not match the switch selector `{selector}`")]
    InvalidCaseSelector {
        expr: Handle<Expression>,
        ty: Type,
        selector: Type,
    },

    #[error("type {0:?} cannot be written in source")]
    InvalidTypeAnnotation(Handle<TypeDecl>),
    #[error("type {ty:?}: `{component}` is not a valid component type")]
    InvalidComponentType {
        ty: Handle<TypeDecl>,
        component: Type,
    },
    #[error("type {ty:?}: array length {length} is not positive")]
    InvalidArrayLength { ty: Handle<TypeDecl>, length: i64 },

    #[error("variable `{name}` needs a type annotation or an initializer")]
    MissingType { name: String },
    #[error("`{name}` is declared as `{expected}` but initialized with `{found}`")]
    InitializerTypeMismatch {
        name: String,
        expected: Type,
        found: Type,
    },
    #[error("module-scope variable `{name}` needs an address space")]
    MissingAddressSpace { name: String },
    #[error("variable `{name}` cannot be declared in the {} address space here", .space.to_wgsl())]
    InvalidAddressSpace { name: String, space: AddressSpace },
    #[error("variable `{name}` in the {} address space cannot have access mode `{}`", .space.to_wgsl(), .access.to_wgsl())]
    InvalidAccessMode {
        name: String,
        space: AddressSpace,
        access: AccessMode,
    },
    #[error("variable `{name}` in the {} address space cannot be initialized", .space.to_wgsl())]
    InvalidInitializer { name: String, space: AddressSpace },
    #[error("resource `{name}` needs both @group and @binding")]
    IncompleteBinding { name: String },
    #[error("`{name}` and `{other}` are both bound to @group({group}) @binding({binding})")]
    DuplicateBinding {
        name: String,
        other: String,
        group: u32,
        binding: u32,
    },

    #[error("`{function}` returns `{}`, but a return of `{}` was found", display_optional(.expected), display_optional(.found))]
    InvalidReturnType {
        function: String,
        expected: Option<Type>,
        found: Option<Type>,
    },
    #[error("left-hand side {lhs:?} of type `{ty}` is not a reference")]
    NotAReference {
        lhs: Handle<LhsExpression>,
        ty: Type,
    },
    #[error("left-hand side {lhs:?} of type `{ty}` is not writable")]
    NotWritable {
        lhs: Handle<LhsExpression>,
        ty: Type,
    },
    #[error("left-hand side {lhs:?}: cannot store `{found}` into `{expected}`")]
    AssignmentTypeMismatch {
        lhs: Handle<LhsExpression>,
        expected: Type,
        found: Type,
    },
    #[error("left-hand side {lhs:?}: `{ty}` cannot be incremented or decremented")]
    InvalidIncrement {
        lhs: Handle<LhsExpression>,
        ty: Type,
    },
    #[error("left-hand side {lhs:?}: `{ty}` cannot be indexed")]
    LhsNotIndexable {
        lhs: Handle<LhsExpression>,
        ty: Type,
    },
    #[error("left-hand side {lhs:?}: `{ty}` has no member `{member}`")]
    LhsNoSuchMember {
        lhs: Handle<LhsExpression>,
        member: String,
        ty: Type,
    },
    #[error("left-hand side {lhs:?}: `{ty}` cannot be dereferenced")]
    LhsNotAPointer {
        lhs: Handle<LhsExpression>,
        ty: Type,
    },

    #[error("{0:?} must be enabled to use this")]
    MissingCapability(Capabilities),
    #[error(transparent)]
    ConstEval(#[from] ConstEvalError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("{0} was resolved more than once")]
    NodeRevisited(String),
}

fn display_optional(ty: &Option<Type>) -> String {
    match *ty {
        Some(ref ty) => ty.to_wgsl(),
        None => "nothing".to_string(),
    }
}
