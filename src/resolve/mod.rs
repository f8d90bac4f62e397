/*!
Scope and type resolution of a [`TranslationUnit`](ast::TranslationUnit).

Module-scope declarations are first put in dependency order by [`Index`],
then resolved one by one: their types are computed and their names are
added to the module scope. Function bodies come last, in textual order, so
that they may call any function of the unit.

Every expression is typed after its children. Every statement gets a
snapshot of the scope it runs in, and every block a snapshot of the scope
at its end. The results are collected in a [`ResolvedEnvironment`].
*/

mod builtins;
mod construction;
mod conversion;
mod env;
mod error;
mod index;
mod scope;
mod typifier;

use std::convert::TryFrom;
use std::sync::Arc;

use crate::arena::Handle;
use crate::ast;
use crate::proc::ConstantEvaluator;
use crate::types::{AccessMode, AddressSpace, Scalar, StructMember, StructType, Type};
use crate::ResourceBinding;

pub use env::ResolvedEnvironment;
pub use error::Error;
pub use scope::{FunctionSignature, Scope, ScopeEntry};

use builtins::Builtin;
use env::EnvironmentBuilder;
use index::Index;

bitflags::bitflags! {
    /// Optional language features.
    #[derive(Default)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize))]
    #[cfg_attr(feature = "deserialize", derive(serde::Deserialize))]
    pub struct Capabilities: u32 {
        /// The `f16` type and `h`-suffixed literals.
        const F16 = 0x1;
        /// Subgroup and quad builtin functions.
        const SUBGROUPS = 0x2;
    }
}

/// Configuration of a [`Resolver`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "deserialize", derive(serde::Deserialize))]
pub struct Options {
    /// Features usable even without an `enable` directive.
    pub capabilities: Capabilities,
}

#[derive(Debug, Default)]
pub struct Resolver {
    options: Options,
}

impl Resolver {
    pub const fn new(options: Options) -> Self {
        Self { options }
    }

    /// Resolve every declaration, statement and expression of `tu`.
    pub fn resolve(&self, tu: &ast::TranslationUnit) -> Result<ResolvedEnvironment, Error> {
        let mut capabilities = self.options.capabilities;
        for extension in tu.enabled_extensions() {
            capabilities |= match extension {
                "f16" => Capabilities::F16,
                "subgroups" => Capabilities::SUBGROUPS,
                _ => Capabilities::empty(),
            };
        }

        let index = Index::generate(tu)?;
        let mut ctx = Context {
            tu,
            capabilities,
            scope: Scope::new(),
            env: EnvironmentBuilder::new(tu),
            function: None,
        };

        for handle in index.visit_ordered() {
            ctx.global_decl(handle)?;
        }
        log::debug!("Resolved {} module-scope declarations", tu.decls.len());

        for (handle, decl) in tu.decls.iter() {
            if let ast::GlobalDecl::Function(ref f) = *decl {
                ctx.function_body(handle, f)?;
            }
        }

        Ok(ctx.env.finish(ctx.scope))
    }
}

/// Resolve `tu` with the default [`Options`].
pub fn resolve(tu: &ast::TranslationUnit) -> Result<ResolvedEnvironment, Error> {
    Resolver::new(Options::default()).resolve(tu)
}

/// The function whose body is being resolved.
struct FunctionContext<'a> {
    name: &'a str,
    result: Option<Type>,
}

struct Context<'a> {
    tu: &'a ast::TranslationUnit,
    capabilities: Capabilities,
    scope: Scope,
    env: EnvironmentBuilder,
    function: Option<FunctionContext<'a>>,
}

impl<'a> Context<'a> {
    fn require(&self, capabilities: Capabilities) -> Result<(), Error> {
        if self.capabilities.contains(capabilities) {
            Ok(())
        } else {
            Err(Error::MissingCapability(capabilities - self.capabilities))
        }
    }

    fn global_decl(&mut self, handle: Handle<ast::GlobalDecl>) -> Result<(), Error> {
        let tu = self.tu;
        match tu.decls[handle] {
            ast::GlobalDecl::Function(ref f) => {
                self.attributes(&f.attributes)?;
                let mut parameters = Vec::with_capacity(f.parameters.len());
                for param in f.parameters.iter() {
                    self.attributes(&param.attributes)?;
                    parameters.push(self.ty(param.ty)?);
                }
                let result = match f.result {
                    Some(ref result) => {
                        self.attributes(&result.attributes)?;
                        Some(self.ty(result.ty)?)
                    }
                    None => None,
                };
                self.scope.add_entry(
                    &f.name,
                    ScopeEntry::Function {
                        decl: handle,
                        signature: FunctionSignature { parameters, result },
                    },
                )
            }
            ast::GlobalDecl::Variable(ref v) => {
                let ty = self.global_variable(v)?;
                self.scope
                    .add_entry(&v.name, ScopeEntry::GlobalVariable { decl: handle, ty })
            }
            ast::GlobalDecl::Constant(ref c) => {
                let ty = self.declared_value(&c.name, c.ty, Some(c.init))?;
                self.scope
                    .add_entry(&c.name, ScopeEntry::GlobalConstant { decl: handle, ty })
            }
            ast::GlobalDecl::Override(ref o) => {
                self.attributes(&o.attributes)?;
                let ty = self.declared_value(&o.name, o.ty, o.init)?;
                self.scope
                    .add_entry(&o.name, ScopeEntry::GlobalOverride { decl: handle, ty })
            }
            ast::GlobalDecl::Struct(ref s) => {
                let mut members: Vec<StructMember> = Vec::with_capacity(s.members.len());
                for member in s.members.iter() {
                    if members.iter().any(|other| other.name == member.name) {
                        return Err(Error::Redefinition {
                            name: member.name.clone(),
                        });
                    }
                    self.attributes(&member.attributes)?;
                    let ty = self.ty(member.ty)?;
                    let (mut align, mut size) = (None, None);
                    for attribute in member.attributes.iter() {
                        match *attribute {
                            ast::Attribute::Align(expr) => align = Some(self.const_u32(expr)?),
                            ast::Attribute::Size(expr) => size = Some(self.const_u32(expr)?),
                            _ => {}
                        }
                    }
                    members.push(StructMember {
                        name: member.name.clone(),
                        ty,
                        align,
                        size,
                    });
                }
                let ty = Type::Struct(Arc::new(StructType {
                    name: s.name.clone(),
                    members,
                }));
                self.scope
                    .add_entry(&s.name, ScopeEntry::Struct { decl: handle, ty })
            }
            ast::GlobalDecl::TypeAlias(ref a) => {
                let ty = self.ty(a.ty)?;
                self.scope
                    .add_entry(&a.name, ScopeEntry::TypeAlias { decl: handle, ty })
            }
            ast::GlobalDecl::ConstAssert(condition) => self.condition(condition),
        }
    }

    fn attributes(&mut self, attributes: &[ast::Attribute]) -> Result<(), Error> {
        for attribute in attributes {
            for expr in attribute.expressions() {
                self.expression(expr)?;
            }
        }
        Ok(())
    }

    fn const_u32(&self, expr: Handle<ast::Expression>) -> Result<u32, Error> {
        Ok(ConstantEvaluator::new(self.tu, &self.scope).eval_u32(expr)?)
    }

    /// The type of a `var`, `let`, `const` or `override`, before any
    /// reference wrapping: the annotation if any, else the concretized type
    /// of the initializer.
    fn declared_value(
        &mut self,
        name: &str,
        annotation: Option<Handle<ast::TypeDecl>>,
        init: Option<Handle<ast::Expression>>,
    ) -> Result<Type, Error> {
        let declared = annotation.map(|ty| self.ty(ty)).transpose()?;
        let initial = init.map(|init| self.expression(init)).transpose()?;
        match (declared, initial) {
            (Some(declared), Some(initial)) => {
                if initial.is_abstraction_of(&declared) {
                    Ok(declared)
                } else {
                    Err(Error::InitializerTypeMismatch {
                        name: name.to_string(),
                        expected: declared,
                        found: initial.store_type().clone(),
                    })
                }
            }
            (Some(declared), None) => Ok(declared),
            (None, Some(initial)) => Ok(initial.store_type().concretize()),
            (None, None) => Err(Error::MissingType {
                name: name.to_string(),
            }),
        }
    }

    fn global_variable(&mut self, v: &ast::GlobalVariable) -> Result<Type, Error> {
        self.attributes(&v.attributes)?;
        self.resource_binding(&v.name, &v.attributes)?;
        let store = self.declared_value(&v.name, v.ty, v.init)?;

        let space = match v.space {
            // Textures and samplers are the only variables written without
            // an address space.
            None if store.is_handle() => AddressSpace::Handle,
            None => {
                return Err(Error::MissingAddressSpace {
                    name: v.name.clone(),
                })
            }
            Some(space @ AddressSpace::Function) | Some(space @ AddressSpace::Handle) => {
                return Err(Error::InvalidAddressSpace {
                    name: v.name.clone(),
                    space,
                })
            }
            Some(space) => space,
        };
        let access = match v.access {
            None => space.default_access(),
            Some(access) if space == AddressSpace::Storage && access != AccessMode::Write => access,
            Some(access) => {
                return Err(Error::InvalidAccessMode {
                    name: v.name.clone(),
                    space,
                    access,
                })
            }
        };
        if v.init.is_some() && space != AddressSpace::Private {
            return Err(Error::InvalidInitializer {
                name: v.name.clone(),
                space,
            });
        }

        Ok(Type::reference(store, space, access))
    }

    fn resource_binding(&mut self, name: &str, attributes: &[ast::Attribute]) -> Result<(), Error> {
        let (mut group, mut binding) = (None, None);
        for attribute in attributes {
            match *attribute {
                ast::Attribute::Group(expr) => group = Some(expr),
                ast::Attribute::Binding(expr) => binding = Some(expr),
                _ => {}
            }
        }
        match (group, binding) {
            (Some(group), Some(binding)) => {
                let binding = ResourceBinding {
                    group: self.const_u32(group)?,
                    binding: self.const_u32(binding)?,
                };
                self.env.record_binding(binding, name)
            }
            (None, None) => Ok(()),
            _ => Err(Error::IncompleteBinding {
                name: name.to_string(),
            }),
        }
    }

    fn function_body(
        &mut self,
        handle: Handle<ast::GlobalDecl>,
        f: &'a ast::Function,
    ) -> Result<(), Error> {
        log::debug!("Resolving the body of `{}`", f.name);
        let signature = match self.scope.lookup(&f.name) {
            Some(&ScopeEntry::Function { ref signature, .. }) => signature.clone(),
            _ => return Err(Error::UnknownFunction(f.name.clone())),
        };

        self.function = Some(FunctionContext {
            name: f.name.as_str(),
            result: signature.result,
        });
        // Parameters and the outermost statements of the body share a level.
        self.scope.push_level();
        for (index, (param, ty)) in f
            .parameters
            .iter()
            .zip(signature.parameters.into_iter())
            .enumerate()
        {
            self.scope.add_entry(
                &param.name,
                ScopeEntry::Parameter {
                    function: handle,
                    index,
                    ty,
                },
            )?;
        }
        self.block(f.body)?;
        self.scope.pop_level();
        self.function = None;
        Ok(())
    }

    /// Resolve the statements of `block` at the current level.
    fn block(&mut self, block: Handle<ast::Block>) -> Result<(), Error> {
        let tu = self.tu;
        for &stmt in tu.blocks[block].stmts.iter() {
            self.statement(stmt)?;
        }
        self.env.record_block(block, self.scope.clone())
    }

    /// Resolve `block` in a level of its own.
    fn nested_block(&mut self, block: Handle<ast::Block>) -> Result<(), Error> {
        self.scope.push_level();
        self.block(block)?;
        self.scope.pop_level();
        Ok(())
    }

    fn condition(&mut self, expr: Handle<ast::Expression>) -> Result<(), Error> {
        let ty = self.value(expr)?;
        match ty {
            Type::Scalar(Scalar::Bool) => Ok(()),
            _ => Err(Error::ExpectedBool { expr, ty }),
        }
    }

    fn statement(&mut self, stmt: Handle<ast::Statement>) -> Result<(), Error> {
        self.env.record_statement(stmt, self.scope.clone())?;

        let tu = self.tu;
        match tu.statements[stmt] {
            ast::Statement::Compound(block) => self.nested_block(block)?,
            ast::Statement::If {
                condition,
                accept,
                ref reject,
            } => {
                self.condition(condition)?;
                self.nested_block(accept)?;
                match *reject {
                    Some(ast::Else::Block(block)) => self.nested_block(block)?,
                    Some(ast::Else::If(next)) => self.statement(next)?,
                    None => {}
                }
            }
            ast::Statement::Switch {
                selector,
                ref clauses,
            } => {
                let selector_ty = self.value(selector)?;
                match selector_ty {
                    Type::Scalar(scalar) if scalar.is_integer() => {}
                    _ => {
                        return Err(Error::InvalidSwitchSelector {
                            expr: selector,
                            ty: selector_ty,
                        })
                    }
                }
                for clause in clauses.iter() {
                    for case in clause.selectors.iter() {
                        if let ast::CaseSelector::Expression(expr) = *case {
                            let ty = self.value(expr)?;
                            if ty.automatic_conversion_combine(&selector_ty).is_none() {
                                return Err(Error::InvalidCaseSelector {
                                    expr,
                                    ty,
                                    selector: selector_ty,
                                });
                            }
                        }
                    }
                    self.nested_block(clause.body)?;
                }
            }
            ast::Statement::Loop {
                body,
                ref continuing,
            } => {
                // The body and the continuing block share the loop's level.
                self.scope.push_level();
                self.block(body)?;
                if let Some(ref continuing) = *continuing {
                    self.block(continuing.body)?;
                    if let Some(break_if) = continuing.break_if {
                        self.condition(break_if)?;
                    }
                }
                self.scope.pop_level();
            }
            ast::Statement::For {
                init,
                condition,
                update,
                body,
            } => {
                self.scope.push_level();
                if let Some(init) = init {
                    self.statement(init)?;
                }
                if let Some(condition) = condition {
                    self.condition(condition)?;
                }
                if let Some(update) = update {
                    self.statement(update)?;
                }
                self.nested_block(body)?;
                self.scope.pop_level();
            }
            ast::Statement::While { condition, body } => {
                self.condition(condition)?;
                self.nested_block(body)?;
            }
            ast::Statement::Break
            | ast::Statement::Continue
            | ast::Statement::Discard
            | ast::Statement::Empty => {}
            ast::Statement::Return(value) => {
                let found = value.map(|value| self.value(value)).transpose()?;
                let expected = self.function.as_ref().and_then(|f| f.result.clone());
                let fits = match (&expected, &found) {
                    (&None, &None) => true,
                    (&Some(ref expected), &Some(ref found)) => found.is_abstraction_of(expected),
                    _ => false,
                };
                if !fits {
                    return Err(Error::InvalidReturnType {
                        function: self
                            .function
                            .as_ref()
                            .map_or_else(String::new, |f| f.name.to_string()),
                        expected,
                        found,
                    });
                }
            }
            ast::Statement::Call {
                ref callee,
                ref args,
            } => {
                self.call(callee, None, args)?;
            }
            ast::Statement::Assignment { lhs, op, rhs } => {
                let target = match lhs {
                    Some(lhs) => Some((lhs, self.lhs(lhs)?)),
                    None => None,
                };
                let value = self.value(rhs)?;
                // The phony assignment `_ = e` accepts any value.
                if let Some((lhs, target)) = target {
                    let store = writable(lhs, &target, self.accessed(lhs))?;
                    let value = match op {
                        Some(op) => typifier::binary(op, store, &value).ok_or_else(|| {
                            Error::InvalidBinaryOperands {
                                expr: rhs,
                                op,
                                left: store.clone(),
                                right: value.clone(),
                            }
                        })?,
                        None => value,
                    };
                    if !value.is_abstraction_of(store) {
                        return Err(Error::AssignmentTypeMismatch {
                            lhs,
                            expected: store.clone(),
                            found: value,
                        });
                    }
                }
            }
            ast::Statement::Increment(lhs) | ast::Statement::Decrement(lhs) => {
                let target = self.lhs(lhs)?;
                let store = writable(lhs, &target, self.accessed(lhs))?;
                match *store {
                    Type::Scalar(Scalar::I32) | Type::Scalar(Scalar::U32) => {}
                    ref other => {
                        return Err(Error::InvalidIncrement {
                            lhs,
                            ty: other.clone(),
                        })
                    }
                }
            }
            ast::Statement::Variable(ref v) => {
                match v.space {
                    None | Some(AddressSpace::Function) => {}
                    Some(space) => {
                        return Err(Error::InvalidAddressSpace {
                            name: v.name.clone(),
                            space,
                        })
                    }
                }
                if let Some(access) = v.access {
                    return Err(Error::InvalidAccessMode {
                        name: v.name.clone(),
                        space: AddressSpace::Function,
                        access,
                    });
                }
                let store = self.declared_value(&v.name, v.ty, v.init)?;
                let ty = Type::reference(store, AddressSpace::Function, AccessMode::ReadWrite);
                self.scope
                    .add_entry(&v.name, ScopeEntry::LocalVariable { decl: stmt, ty })?;
            }
            ast::Statement::Value(ref v) => {
                let ty = self.declared_value(&v.name, v.ty, Some(v.init))?;
                self.scope
                    .add_entry(&v.name, ScopeEntry::LocalValue { decl: stmt, ty })?;
            }
            ast::Statement::ConstAssert(condition) => self.condition(condition)?,
            ast::Statement::Augmented(ast::AugmentedStatement::DeadCodeFragment(inner)) => {
                self.statement(inner)?
            }
        }
        Ok(())
    }

    /// Resolve `expr` and record its type.
    fn expression(&mut self, expr: Handle<ast::Expression>) -> Result<Type, Error> {
        let ty = self.expression_inner(expr)?;
        self.env.record_expression(expr, ty.clone())?;
        Ok(ty)
    }

    /// Resolve `expr` and apply the load rule to its type.
    fn value(&mut self, expr: Handle<ast::Expression>) -> Result<Type, Error> {
        Ok(match self.expression(expr)? {
            Type::Reference { base, .. } => *base,
            other => other,
        })
    }

    fn values(&mut self, exprs: &[Handle<ast::Expression>]) -> Result<Vec<Type>, Error> {
        exprs.iter().map(|&expr| self.value(expr)).collect()
    }

    fn expression_inner(&mut self, expr: Handle<ast::Expression>) -> Result<Type, Error> {
        let tu = self.tu;
        Ok(match tu.expressions[expr] {
            ast::Expression::Literal(literal) => {
                if literal.scalar() == Scalar::F16 {
                    self.require(Capabilities::F16)?;
                }
                Type::Scalar(literal.scalar())
            }
            ast::Expression::Identifier(ref name) => match self.scope.lookup(name) {
                Some(entry) => match entry.value_type() {
                    Some(ty) => ty.clone(),
                    None => {
                        return Err(Error::NotAValue {
                            name: name.clone(),
                            kind: entry.kind(),
                        })
                    }
                },
                None => return Err(Error::UnknownIdentifier(name.clone())),
            },
            ast::Expression::Paren(inner) => self.expression(inner)?,
            ast::Expression::Unary { op, expr: operand } => {
                let ty = self.expression(operand)?;
                match typifier::unary(op, &ty) {
                    Some(result) => result,
                    None => return Err(Error::InvalidUnaryOperand { expr, op, ty }),
                }
            }
            ast::Expression::Binary { op, left, right } => {
                let left = self.value(left)?;
                let right = self.value(right)?;
                match typifier::binary(op, &left, &right) {
                    Some(result) => result,
                    None => {
                        log::error!("Operands of {:?} do not fit: `{}`, `{}`", op, left, right);
                        return Err(Error::InvalidBinaryOperands {
                            expr,
                            op,
                            left,
                            right,
                        });
                    }
                }
            }
            ast::Expression::Index { base, index } => {
                let base_ty = self.expression(base)?;
                let index_ty = self.value(index)?;
                match index_ty {
                    Type::Scalar(scalar) if scalar.is_integer() => {}
                    _ => {
                        return Err(Error::InvalidIndexType {
                            expr: index,
                            ty: index_ty,
                        })
                    }
                }
                match typifier::index(&base_ty) {
                    Some(element) => element,
                    None => return Err(Error::NotIndexable { expr, ty: base_ty }),
                }
            }
            ast::Expression::Member { base, ref member } => {
                let base_ty = self.expression(base)?;
                match typifier::member(&base_ty, member) {
                    Some(ty) => ty,
                    None => {
                        return Err(Error::NoSuchMember {
                            expr,
                            member: member.clone(),
                            ty: base_ty,
                        })
                    }
                }
            }
            ast::Expression::Construct { ref ty, ref args } => self.construct(expr, ty, args)?,
            ast::Expression::Call {
                ref callee,
                template,
                ref args,
            } => {
                // Structs and aliased types are constructed with call syntax.
                let declared = self
                    .scope
                    .lookup(callee)
                    .and_then(ScopeEntry::declared_type)
                    .cloned();
                match declared {
                    Some(target) => {
                        if template.is_some() {
                            return Err(Error::UnexpectedTemplateArgument(callee.clone()));
                        }
                        let args = self.values(args)?;
                        construction::check_constructor(expr, &target, &args)?;
                        target
                    }
                    None => match self.call(callee, template, args)? {
                        Some(result) => result,
                        None => return Err(Error::NoReturnValue(callee.clone())),
                    },
                }
            }
            ast::Expression::Augmented(ref augmented) => match *augmented {
                ast::AugmentedExpression::KnownValue {
                    known_value,
                    expression,
                } => {
                    let known = self.value(known_value)?;
                    let actual = self.expression(expression)?;
                    if &known != actual.store_type() {
                        return Err(Error::KnownValueMismatch {
                            expr,
                            known,
                            actual: actual.store_type().clone(),
                        });
                    }
                    actual
                }
                ast::AugmentedExpression::AddZero { original, zero, .. } => {
                    let ty = self.expression(original)?;
                    self.expression(zero)?;
                    ty
                }
                ast::AugmentedExpression::MulOne { original, one, .. } => {
                    let ty = self.expression(original)?;
                    self.expression(one)?;
                    ty
                }
                ast::AugmentedExpression::FalseByConstruction(inner)
                | ast::AugmentedExpression::TrueByConstruction(inner) => {
                    let ty = self.expression(inner)?;
                    if ty.store_type() != &Type::BOOL {
                        return Err(Error::ExpectedBool { expr: inner, ty });
                    }
                    ty
                }
            },
        })
    }

    /// Resolve a call to a user-defined or builtin function. `None` means
    /// the function returns nothing.
    fn call(
        &mut self,
        callee: &str,
        template: Option<Handle<ast::TypeDecl>>,
        args: &[Handle<ast::Expression>],
    ) -> Result<Option<Type>, Error> {
        let signature = match self.scope.lookup(callee) {
            Some(&ScopeEntry::Function { ref signature, .. }) => Some(signature.clone()),
            Some(entry) => {
                return Err(Error::NotCallable {
                    name: callee.to_string(),
                    kind: entry.kind(),
                })
            }
            None => None,
        };
        let template = template.map(|ty| self.ty(ty)).transpose()?;
        let arg_types = self.values(args)?;

        let signature = match signature {
            Some(signature) => signature,
            None => {
                let builtin = Builtin::map(callee)
                    .ok_or_else(|| Error::UnknownFunction(callee.to_string()))?;
                self.require(builtin.required_capabilities())?;
                return builtin.resolve(callee, template.as_ref(), &arg_types);
            }
        };

        if template.is_some() {
            return Err(Error::UnexpectedTemplateArgument(callee.to_string()));
        }
        let expected = signature.parameters.len();
        if arg_types.len() != expected {
            return Err(Error::WrongArgumentCount {
                function: callee.to_string(),
                expected: expected..expected + 1,
                found: arg_types.len(),
            });
        }
        for (index, (arg, param)) in arg_types.iter().zip(signature.parameters.iter()).enumerate() {
            if !arg.is_abstraction_of(param) {
                return Err(Error::InvalidArgument {
                    function: callee.to_string(),
                    index,
                    ty: arg.clone(),
                });
            }
        }
        Ok(signature.result)
    }

    /// Resolve `lhs` and record its type.
    fn lhs(&mut self, lhs: Handle<ast::LhsExpression>) -> Result<Type, Error> {
        let tu = self.tu;
        let ty = match tu.lhs_expressions[lhs] {
            ast::LhsExpression::Identifier(ref name) => match self.scope.lookup(name) {
                Some(entry) => match entry.value_type() {
                    Some(ty) => ty.clone(),
                    None => {
                        return Err(Error::NotAValue {
                            name: name.clone(),
                            kind: entry.kind(),
                        })
                    }
                },
                None => return Err(Error::UnknownIdentifier(name.clone())),
            },
            ast::LhsExpression::Paren(inner) => self.lhs(inner)?,
            ast::LhsExpression::Member { base, ref member } => {
                let base_ty = self.lhs(base)?;
                match typifier::member(&base_ty, member) {
                    Some(ty) => ty,
                    None => {
                        return Err(Error::LhsNoSuchMember {
                            lhs,
                            member: member.clone(),
                            ty: base_ty,
                        })
                    }
                }
            }
            ast::LhsExpression::Index { base, index } => {
                let base_ty = self.lhs(base)?;
                let index_ty = self.value(index)?;
                match index_ty {
                    Type::Scalar(scalar) if scalar.is_integer() => {}
                    _ => {
                        return Err(Error::InvalidIndexType {
                            expr: index,
                            ty: index_ty,
                        })
                    }
                }
                match typifier::index(&base_ty) {
                    Some(ty) => ty,
                    None => return Err(Error::LhsNotIndexable { lhs, ty: base_ty }),
                }
            }
            ast::LhsExpression::Deref(inner) => {
                let ty = self.lhs(inner)?;
                match typifier::unary(ast::UnaryOperator::Deref, &ty) {
                    Some(ty) => ty,
                    None => return Err(Error::LhsNotAPointer { lhs, ty }),
                }
            }
            ast::LhsExpression::AddressOf(inner) => {
                let ty = self.lhs(inner)?;
                match typifier::unary(ast::UnaryOperator::AddressOf, &ty) {
                    Some(ty) => ty,
                    None => return Err(Error::NotAReference { lhs, ty }),
                }
            }
        };
        self.env.record_lhs(lhs, ty.clone())?;
        Ok(ty)
    }

    /// Whether `lhs` is a member or index access, looking through parentheses.
    fn accessed(&self, lhs: Handle<ast::LhsExpression>) -> bool {
        match self.tu.lhs_expressions[lhs] {
            ast::LhsExpression::Member { .. } | ast::LhsExpression::Index { .. } => true,
            ast::LhsExpression::Paren(inner) => self.accessed(inner),
            _ => false,
        }
    }

    /// Resolve a type annotation.
    fn ty(&mut self, handle: Handle<ast::TypeDecl>) -> Result<Type, Error> {
        let tu = self.tu;
        Ok(match tu.types[handle] {
            ast::TypeDecl::Scalar(scalar) => {
                if scalar.is_abstract() {
                    return Err(Error::InvalidTypeAnnotation(handle));
                }
                if scalar == Scalar::F16 {
                    self.require(Capabilities::F16)?;
                }
                Type::Scalar(scalar)
            }
            ast::TypeDecl::Vector { size, component } => match self.ty(component)? {
                Type::Scalar(scalar) => Type::vector(size, scalar),
                other => {
                    return Err(Error::InvalidComponentType {
                        ty: handle,
                        component: other,
                    })
                }
            },
            ast::TypeDecl::Matrix {
                columns,
                rows,
                component,
            } => match self.ty(component)? {
                Type::Scalar(scalar) if scalar.is_float() => Type::Matrix {
                    columns,
                    rows,
                    scalar,
                },
                other => {
                    return Err(Error::InvalidComponentType {
                        ty: handle,
                        component: other,
                    })
                }
            },
            ast::TypeDecl::Array { base, size } => {
                let base = self.ty(base)?;
                let size = match size {
                    Some(size) => Some(self.array_length(handle, size)?),
                    None => None,
                };
                Type::array(base, size)
            }
            ast::TypeDecl::Atomic(component) => match self.ty(component)? {
                Type::Scalar(scalar @ Scalar::I32) | Type::Scalar(scalar @ Scalar::U32) => {
                    Type::Atomic(scalar)
                }
                other => {
                    return Err(Error::InvalidComponentType {
                        ty: handle,
                        component: other,
                    })
                }
            },
            ast::TypeDecl::Pointer {
                space,
                base,
                access,
            } => {
                let base = self.ty(base)?;
                Type::pointer(base, space, access.unwrap_or_else(|| space.default_access()))
            }
            ast::TypeDecl::Texture(kind) => Type::Texture(kind),
            ast::TypeDecl::Sampler { comparison } => Type::Sampler { comparison },
            ast::TypeDecl::Named(ref name) => match self.scope.lookup(name) {
                Some(entry) => match entry.declared_type() {
                    Some(ty) => ty.clone(),
                    None => {
                        return Err(Error::NotAType {
                            name: name.clone(),
                            kind: entry.kind(),
                        })
                    }
                },
                None => return Err(Error::UnknownType(name.clone())),
            },
        })
    }

    /// Evaluate the element count of a fixed-size array type.
    fn array_length(
        &mut self,
        ty: Handle<ast::TypeDecl>,
        size: Handle<ast::Expression>,
    ) -> Result<u32, Error> {
        self.expression(size)?;
        let length = ConstantEvaluator::new(self.tu, &self.scope).eval_int(size)?;
        match u32::try_from(length) {
            Ok(length) if length > 0 => Ok(length),
            _ => Err(Error::InvalidArrayLength { ty, length }),
        }
    }
}

/// The store type of an assignment target, which must be a writable
/// reference. Member and index accesses through a pointer keep the pointer
/// type, so for those (`accessed`) a writable pointer is accepted as well.
fn writable(
    lhs: Handle<ast::LhsExpression>,
    ty: &Type,
    accessed: bool,
) -> Result<&Type, Error> {
    match *ty {
        Type::Reference {
            ref base, access, ..
        } if access.can_write() => Ok(base),
        Type::Pointer {
            ref base, access, ..
        } if accessed && access.can_write() => Ok(base),
        Type::Reference { .. } => Err(Error::NotWritable {
            lhs,
            ty: ty.clone(),
        }),
        Type::Pointer { .. } if accessed => Err(Error::NotWritable {
            lhs,
            ty: ty.clone(),
        }),
        _ => Err(Error::NotAReference {
            lhs,
            ty: ty.clone(),
        }),
    }
}
