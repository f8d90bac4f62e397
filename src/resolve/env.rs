use std::ops;

use super::{Error, Scope, ScopeEntry};
use crate::arena::{Handle, HandleVec};
use crate::ast;
use crate::types::Type;
use crate::{FastHashMap, ResourceBinding};

/// Everything the resolver learned about a program tree.
///
/// Frozen once built: every accessor takes `&self`, so an environment can be
/// shared freely between readers, across threads too.
#[derive(Debug)]
pub struct ResolvedEnvironment {
    expressions: HandleVec<ast::Expression, Type>,
    lhs_expressions: HandleVec<ast::LhsExpression, Type>,
    statement_scopes: HandleVec<ast::Statement, Scope>,
    block_scopes: HandleVec<ast::Block, Scope>,
    global_scope: Scope,
    bindings: FastHashMap<ResourceBinding, String>,
}

impl ResolvedEnvironment {
    /// The type of a resolved expression.
    pub fn expression_type(&self, expr: Handle<ast::Expression>) -> Option<&Type> {
        self.expressions.get(expr)
    }

    /// The type of a resolved left-hand-side expression.
    pub fn lhs_type(&self, lhs: Handle<ast::LhsExpression>) -> Option<&Type> {
        self.lhs_expressions.get(lhs)
    }

    /// The scope visible immediately before `stmt` executes.
    pub fn scope_before(&self, stmt: Handle<ast::Statement>) -> Option<&Scope> {
        self.statement_scopes.get(stmt)
    }

    /// The scope visible at the end of `block`, after its last statement.
    pub fn scope_at_end(&self, block: Handle<ast::Block>) -> Option<&Scope> {
        self.block_scopes.get(block)
    }

    /// The module scope, with every module-scope declaration in it.
    pub const fn global_scope(&self) -> &Scope {
        &self.global_scope
    }

    pub fn lookup_global(&self, name: &str) -> Option<&ScopeEntry> {
        self.global_scope.lookup(name)
    }

    /// The resource variable bound at `binding`, with its store type.
    pub fn binding(&self, binding: ResourceBinding) -> Option<(&str, &Type)> {
        let name = self.bindings.get(&binding)?;
        let ty = self
            .global_scope
            .lookup(name)
            .and_then(ScopeEntry::value_type)?;
        Some((name.as_str(), ty.store_type()))
    }

    /// All resource bindings, in no particular order.
    pub fn bindings(&self) -> impl Iterator<Item = (ResourceBinding, &str)> {
        self.bindings
            .iter()
            .map(|(&binding, name)| (binding, name.as_str()))
    }

    /// Number of expressions that received a type.
    pub fn expression_count(&self) -> usize {
        self.expressions.count()
    }

    pub fn statement_count(&self) -> usize {
        self.statement_scopes.count()
    }
}

impl ops::Index<Handle<ast::Expression>> for ResolvedEnvironment {
    type Output = Type;
    fn index(&self, handle: Handle<ast::Expression>) -> &Type {
        &self.expressions[handle]
    }
}

impl ops::Index<Handle<ast::LhsExpression>> for ResolvedEnvironment {
    type Output = Type;
    fn index(&self, handle: Handle<ast::LhsExpression>) -> &Type {
        &self.lhs_expressions[handle]
    }
}

/// Write-once tables filled in during resolution.
///
/// Recording a node twice means the walk reached it along two paths, which a
/// well-formed tree never allows.
#[derive(Default)]
pub(super) struct EnvironmentBuilder {
    expressions: HandleVec<ast::Expression, Type>,
    lhs_expressions: HandleVec<ast::LhsExpression, Type>,
    statement_scopes: HandleVec<ast::Statement, Scope>,
    block_scopes: HandleVec<ast::Block, Scope>,
    bindings: FastHashMap<ResourceBinding, String>,
}

impl EnvironmentBuilder {
    pub fn new(tu: &ast::TranslationUnit) -> Self {
        Self {
            expressions: HandleVec::with_capacity(tu.expressions.len()),
            lhs_expressions: HandleVec::with_capacity(tu.lhs_expressions.len()),
            statement_scopes: HandleVec::with_capacity(tu.statements.len()),
            block_scopes: HandleVec::with_capacity(tu.blocks.len()),
            bindings: FastHashMap::default(),
        }
    }

    pub fn record_expression(
        &mut self,
        expr: Handle<ast::Expression>,
        ty: Type,
    ) -> Result<(), Error> {
        log::trace!("Expression {:?} resolved to `{}`", expr, ty);
        match self.expressions.insert(expr, ty) {
            Some(_) => Err(Error::NodeRevisited(format!("expression {:?}", expr))),
            None => Ok(()),
        }
    }

    pub fn record_lhs(&mut self, lhs: Handle<ast::LhsExpression>, ty: Type) -> Result<(), Error> {
        log::trace!("Left-hand side {:?} resolved to `{}`", lhs, ty);
        match self.lhs_expressions.insert(lhs, ty) {
            Some(_) => Err(Error::NodeRevisited(format!("left-hand side {:?}", lhs))),
            None => Ok(()),
        }
    }

    pub fn record_statement(
        &mut self,
        stmt: Handle<ast::Statement>,
        scope: Scope,
    ) -> Result<(), Error> {
        match self.statement_scopes.insert(stmt, scope) {
            Some(_) => Err(Error::NodeRevisited(format!("statement {:?}", stmt))),
            None => Ok(()),
        }
    }

    pub fn record_block(&mut self, block: Handle<ast::Block>, scope: Scope) -> Result<(), Error> {
        match self.block_scopes.insert(block, scope) {
            Some(_) => Err(Error::NodeRevisited(format!("block {:?}", block))),
            None => Ok(()),
        }
    }

    pub fn record_binding(&mut self, binding: ResourceBinding, name: &str) -> Result<(), Error> {
        if let Some(other) = self.bindings.get(&binding) {
            return Err(Error::DuplicateBinding {
                name: name.to_string(),
                other: other.clone(),
                group: binding.group,
                binding: binding.binding,
            });
        }
        self.bindings.insert(binding, name.to_string());
        Ok(())
    }

    pub fn finish(self, global_scope: Scope) -> ResolvedEnvironment {
        ResolvedEnvironment {
            expressions: self.expressions,
            lhs_expressions: self.lhs_expressions,
            statement_scopes: self.statement_scopes,
            block_scopes: self.block_scopes,
            global_scope,
            bindings: self.bindings,
        }
    }
}
