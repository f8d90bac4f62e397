//! Lexical scopes.
//!
//! A [`Scope`] is a persistent structure: local bindings form a chain of
//! reference-counted links that are shared, never mutated, so cloning a
//! scope is cheap and a clone is unaffected by later changes to the
//! original. The resolver clones the current scope before every statement
//! and at the end of every block.

use std::sync::Arc;

use super::Error;
use crate::arena::Handle;
use crate::ast;
use crate::types::Type;
use crate::FastIndexMap;

/// Parameter and result types of a user-defined function.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSignature {
    pub parameters: Vec<Type>,
    pub result: Option<Type>,
}

/// What a name in scope refers to.
#[derive(Clone, Debug)]
pub enum ScopeEntry {
    Function {
        decl: Handle<ast::GlobalDecl>,
        signature: FunctionSignature,
    },
    Parameter {
        function: Handle<ast::GlobalDecl>,
        index: usize,
        ty: Type,
    },
    /// A function-scope `var`. `ty` is a reference type.
    LocalVariable {
        decl: Handle<ast::Statement>,
        ty: Type,
    },
    /// A `let` or function-scope `const`.
    LocalValue {
        decl: Handle<ast::Statement>,
        ty: Type,
    },
    /// A module-scope `var`. `ty` is a reference type.
    GlobalVariable {
        decl: Handle<ast::GlobalDecl>,
        ty: Type,
    },
    GlobalConstant {
        decl: Handle<ast::GlobalDecl>,
        ty: Type,
    },
    GlobalOverride {
        decl: Handle<ast::GlobalDecl>,
        ty: Type,
    },
    Struct {
        decl: Handle<ast::GlobalDecl>,
        ty: Type,
    },
    TypeAlias {
        decl: Handle<ast::GlobalDecl>,
        ty: Type,
    },
}

impl ScopeEntry {
    /// The type of an identifier expression naming this entry, if it names
    /// a value at all.
    pub const fn value_type(&self) -> Option<&Type> {
        match *self {
            ScopeEntry::Parameter { ref ty, .. }
            | ScopeEntry::LocalVariable { ref ty, .. }
            | ScopeEntry::LocalValue { ref ty, .. }
            | ScopeEntry::GlobalVariable { ref ty, .. }
            | ScopeEntry::GlobalConstant { ref ty, .. }
            | ScopeEntry::GlobalOverride { ref ty, .. } => Some(ty),
            ScopeEntry::Function { .. } | ScopeEntry::Struct { .. } | ScopeEntry::TypeAlias { .. } => {
                None
            }
        }
    }

    /// The type this entry declares, if it names a type.
    pub const fn declared_type(&self) -> Option<&Type> {
        match *self {
            ScopeEntry::Struct { ref ty, .. } | ScopeEntry::TypeAlias { ref ty, .. } => Some(ty),
            _ => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match *self {
            ScopeEntry::Function { .. } => "function",
            ScopeEntry::Parameter { .. } => "parameter",
            ScopeEntry::LocalVariable { .. } | ScopeEntry::GlobalVariable { .. } => "variable",
            ScopeEntry::LocalValue { .. } => "value",
            ScopeEntry::GlobalConstant { .. } => "constant",
            ScopeEntry::GlobalOverride { .. } => "override",
            ScopeEntry::Struct { .. } => "struct",
            ScopeEntry::TypeAlias { .. } => "type alias",
        }
    }
}

#[derive(Debug)]
struct Local {
    name: String,
    entry: Arc<ScopeEntry>,
    depth: u32,
    outer: Option<Arc<Local>>,
}

impl Drop for Local {
    fn drop(&mut self) {
        // Unlink iteratively so long chains do not recurse.
        let mut next = self.outer.take();
        while let Some(local) = next {
            match Arc::try_unwrap(local) {
                Ok(mut local) => next = local.outer.take(),
                Err(_) => break,
            }
        }
    }
}

/// The names visible at some point of a program, and what they refer to.
///
/// Depth 0 is module scope. Every nested level may shadow names from the
/// levels around it, but a name may be declared only once per level.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    globals: Arc<FastIndexMap<String, Arc<ScopeEntry>>>,
    locals: Option<Arc<Local>>,
    depth: u32,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nesting depth: 0 at module scope.
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    pub fn push_level(&mut self) {
        self.depth += 1;
    }

    /// Leave the innermost level, forgetting the names declared in it.
    pub fn pop_level(&mut self) {
        if self.depth == 0 {
            log::error!("Popping a level off a module scope");
            return;
        }
        while let Some(local) = self.locals.clone() {
            if local.depth < self.depth {
                break;
            }
            self.locals = local.outer.clone();
        }
        self.depth -= 1;
    }

    /// Declare `name` at the innermost level.
    pub fn add_entry(&mut self, name: &str, entry: ScopeEntry) -> Result<(), Error> {
        log::trace!("Declaring {} `{}` at depth {}", entry.kind(), name, self.depth);
        if self.depth == 0 {
            let globals = Arc::make_mut(&mut self.globals);
            if globals.contains_key(name) {
                return Err(Error::Redefinition {
                    name: name.to_string(),
                });
            }
            globals.insert(name.to_string(), Arc::new(entry));
            return Ok(());
        }

        let mut cursor = self.locals.as_deref();
        while let Some(local) = cursor {
            if local.depth < self.depth {
                break;
            }
            if local.name == name {
                return Err(Error::Redefinition {
                    name: name.to_string(),
                });
            }
            cursor = local.outer.as_deref();
        }
        self.locals = Some(Arc::new(Local {
            name: name.to_string(),
            entry: Arc::new(entry),
            depth: self.depth,
            outer: self.locals.take(),
        }));
        Ok(())
    }

    /// Find the innermost declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&ScopeEntry> {
        let mut cursor = self.locals.as_deref();
        while let Some(local) = cursor {
            if local.name == name {
                return Some(&*local.entry);
            }
            cursor = local.outer.as_deref();
        }
        self.globals.get(name).map(|entry| &**entry)
    }

    /// Module-scope entries, in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &ScopeEntry)> {
        self.globals
            .iter()
            .map(|(name, entry)| (name.as_str(), &**entry))
    }

    /// Names declared inside functions that are visible here, innermost
    /// first. Shadowed names are included.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        let mut cursor = self.locals.as_deref();
        std::iter::from_fn(move || {
            let local = cursor?;
            cursor = local.outer.as_deref();
            Some(local.name.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    fn value(statements: &mut Arena<ast::Statement>, ty: Type) -> ScopeEntry {
        ScopeEntry::LocalValue {
            decl: statements.append(ast::Statement::Empty),
            ty,
        }
    }

    #[test]
    fn inner_levels_shadow_and_pop() {
        let mut statements = Arena::new();
        let mut scope = Scope::new();
        scope.push_level();
        scope
            .add_entry("x", value(&mut statements, Type::I32))
            .unwrap();
        scope.push_level();
        scope
            .add_entry("x", value(&mut statements, Type::F32))
            .unwrap();
        assert_eq!(scope.lookup("x").and_then(ScopeEntry::value_type), Some(&Type::F32));
        scope.pop_level();
        assert_eq!(scope.lookup("x").and_then(ScopeEntry::value_type), Some(&Type::I32));
        scope.pop_level();
        assert!(scope.lookup("x").is_none());
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn duplicate_in_same_level() {
        let mut statements = Arena::new();
        let mut scope = Scope::new();
        scope.push_level();
        scope
            .add_entry("y", value(&mut statements, Type::I32))
            .unwrap();
        let error = scope
            .add_entry("y", value(&mut statements, Type::U32))
            .unwrap_err();
        assert!(matches!(error, Error::Redefinition { ref name } if name == "y"));
    }

    #[test]
    fn snapshots_are_isolated() {
        let mut statements = Arena::new();
        let mut scope = Scope::new();
        scope.push_level();
        let before = scope.clone();
        scope
            .add_entry("z", value(&mut statements, Type::BOOL))
            .unwrap();
        let after = scope.clone();
        scope.pop_level();

        assert!(before.lookup("z").is_none());
        assert!(after.lookup("z").is_some());
        assert!(scope.lookup("z").is_none());
        assert_eq!(after.local_names().collect::<Vec<_>>(), vec!["z"]);
    }

    #[test]
    fn globals_are_copied_on_write() {
        let mut expressions = Arena::new();
        let condition = expressions.append(ast::Expression::Literal(ast::Literal::Bool(true)));
        let mut decls = Arena::new();
        let decl = decls.append(ast::GlobalDecl::ConstAssert(condition));
        let mut scope = Scope::new();
        scope
            .add_entry(
                "a",
                ScopeEntry::GlobalConstant {
                    decl,
                    ty: Type::I32,
                },
            )
            .unwrap();
        let snapshot = scope.clone();
        scope
            .add_entry(
                "b",
                ScopeEntry::GlobalConstant {
                    decl,
                    ty: Type::U32,
                },
            )
            .unwrap();
        assert!(snapshot.lookup("b").is_none());
        assert_eq!(
            scope.globals().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(matches!(
            scope.add_entry("a", ScopeEntry::GlobalConstant { decl, ty: Type::I32 }),
            Err(Error::Redefinition { .. })
        ));
    }
}
