use super::Error;
use crate::arena::Handle;
use crate::ast;
use crate::{FastHashMap, FastIndexSet};

/// A `GlobalDecl` list in which each definition occurs before all its uses.
pub struct Index {
    dependency_order: Vec<Handle<ast::GlobalDecl>>,
}

impl Index {
    /// Generate an `Index` for the given translation unit.
    ///
    /// Perform a topological sort on `tu`'s global declarations, placing
    /// referents before the definitions that refer to them.
    ///
    /// Return an error if two declarations share a name, or if the graph of
    /// references between declarations contains any cycles.
    pub fn generate(tu: &ast::TranslationUnit) -> Result<Self, Error> {
        // Produce a map from global definitions' names to their `Handle<GlobalDecl>`s.
        // While doing so, reject conflicting definitions.
        let mut globals = FastHashMap::with_capacity_and_hasher(tu.decls.len(), Default::default());
        for (handle, decl) in tu.decls.iter() {
            if let Some(name) = decl.name() {
                if globals.insert(name, handle).is_some() {
                    return Err(Error::Redefinition {
                        name: name.to_string(),
                    });
                }
            }
        }

        let len = tu.decls.len();
        let solver = DependencySolver {
            globals: &globals,
            tu,
            visited: vec![false; len],
            temp_visited: vec![false; len],
            path: Vec::new(),
            out: Vec::with_capacity(len),
        };
        let dependency_order = solver.solve()?;

        Ok(Self { dependency_order })
    }

    /// Iterate over `GlobalDecl`s, visiting each definition before all its uses.
    pub fn visit_ordered(&self) -> impl Iterator<Item = Handle<ast::GlobalDecl>> + '_ {
        self.dependency_order.iter().copied()
    }
}

/// Local state for ordering a `TranslationUnit`'s module-scope declarations.
///
/// A depth-first sort keeps the current path around, which is exactly what
/// a cycle error needs to report.
struct DependencySolver<'source, 'temp> {
    /// A map from module-scope definitions' names to their handles.
    globals: &'temp FastHashMap<&'source str, Handle<ast::GlobalDecl>>,

    /// The translation unit whose declarations we're ordering.
    tu: &'source ast::TranslationUnit,

    /// For each handle, whether we have pushed it onto `out` yet.
    visited: Vec<bool>,

    /// For each handle, whether it is on the current depth-first path.
    temp_visited: Vec<bool>,

    /// The declarations on the current depth-first path, outermost first.
    path: Vec<Handle<ast::GlobalDecl>>,

    /// The list of declaration handles, with declarations before uses.
    out: Vec<Handle<ast::GlobalDecl>>,
}

impl<'source> DependencySolver<'source, '_> {
    /// Produce the sorted list of declaration handles, and check for cycles.
    fn solve(mut self) -> Result<Vec<Handle<ast::GlobalDecl>>, Error> {
        for (id, _) in self.tu.decls.iter() {
            if self.visited[id.index()] {
                continue;
            }

            self.dfs(id)?;
        }

        Ok(self.out)
    }

    fn decl_name(&self, id: Handle<ast::GlobalDecl>) -> String {
        self.tu.decls[id].name().unwrap_or("const_assert").to_string()
    }

    /// Ensure that all declarations used by `id` have been added to the
    /// ordering, and then append `id` itself.
    fn dfs(&mut self, id: Handle<ast::GlobalDecl>) -> Result<(), Error> {
        let id_usize = id.index();
        self.temp_visited[id_usize] = true;
        self.path.push(id);

        let dependencies = Dependencies::of(self.tu, &self.tu.decls[id]);
        for dep in dependencies.iter() {
            let dep_id = match self.globals.get(dep) {
                Some(&dep_id) => dep_id,
                // Ignore unresolved identifiers; they may be builtins.
                None => continue,
            };
            let dep_id_usize = dep_id.index();

            if self.temp_visited[dep_id_usize] {
                return Err(if dep_id == id {
                    Error::RecursiveDeclaration {
                        name: self.decl_name(id),
                    }
                } else {
                    let start_at = self
                        .path
                        .iter()
                        .position(|&on_path| on_path == dep_id)
                        .unwrap_or(0);
                    let mut path: Vec<_> = self.path[start_at..]
                        .iter()
                        .map(|&on_path| self.decl_name(on_path))
                        .collect();
                    path.push(self.decl_name(dep_id));
                    Error::CyclicDeclaration { path }
                });
            } else if !self.visited[dep_id_usize] {
                self.dfs(dep_id)?;
            }
        }

        // Remove this node from the current path.
        self.path.pop();
        self.temp_visited[id_usize] = false;

        // Everything this declaration uses is already in `out`.
        self.out.push(id);
        self.visited[id_usize] = true;

        Ok(())
    }
}

/// Names of module-scope objects a declaration refers to.
///
/// Function bodies are not visited: a function only depends on what its
/// signature and attributes mention, so bodies may refer to declarations
/// in any order.
struct Dependencies<'a> {
    tu: &'a ast::TranslationUnit,
    names: FastIndexSet<&'a str>,
}

impl<'a> Dependencies<'a> {
    fn of(tu: &'a ast::TranslationUnit, decl: &'a ast::GlobalDecl) -> FastIndexSet<&'a str> {
        let mut deps = Dependencies {
            tu,
            names: FastIndexSet::default(),
        };
        match *decl {
            ast::GlobalDecl::Function(ref f) => {
                deps.attributes(&f.attributes);
                for param in f.parameters.iter() {
                    deps.attributes(&param.attributes);
                    deps.ty(param.ty);
                }
                if let Some(ref result) = f.result {
                    deps.attributes(&result.attributes);
                    deps.ty(result.ty);
                }
            }
            ast::GlobalDecl::Variable(ref v) => {
                deps.attributes(&v.attributes);
                deps.optional_ty(v.ty);
                deps.optional_expression(v.init);
            }
            ast::GlobalDecl::Constant(ref c) => {
                deps.optional_ty(c.ty);
                deps.expression(c.init);
            }
            ast::GlobalDecl::Override(ref o) => {
                deps.attributes(&o.attributes);
                deps.optional_ty(o.ty);
                deps.optional_expression(o.init);
            }
            ast::GlobalDecl::Struct(ref s) => {
                for member in s.members.iter() {
                    deps.attributes(&member.attributes);
                    deps.ty(member.ty);
                }
            }
            ast::GlobalDecl::TypeAlias(ref a) => deps.ty(a.ty),
            ast::GlobalDecl::ConstAssert(condition) => deps.expression(condition),
        }
        deps.names
    }

    fn attributes(&mut self, attributes: &[ast::Attribute]) {
        for attribute in attributes {
            for expr in attribute.expressions() {
                self.expression(expr);
            }
        }
    }

    fn optional_ty(&mut self, ty: Option<Handle<ast::TypeDecl>>) {
        if let Some(ty) = ty {
            self.ty(ty);
        }
    }

    fn optional_expression(&mut self, expr: Option<Handle<ast::Expression>>) {
        if let Some(expr) = expr {
            self.expression(expr);
        }
    }

    fn ty(&mut self, ty: Handle<ast::TypeDecl>) {
        let tu = self.tu;
        match tu.types[ty] {
            ast::TypeDecl::Named(ref name) => {
                self.names.insert(name.as_str());
            }
            ast::TypeDecl::Vector { component, .. }
            | ast::TypeDecl::Matrix { component, .. }
            | ast::TypeDecl::Atomic(component) => self.ty(component),
            ast::TypeDecl::Pointer { base, .. } => self.ty(base),
            ast::TypeDecl::Array { base, size } => {
                self.ty(base);
                self.optional_expression(size);
            }
            ast::TypeDecl::Scalar(_)
            | ast::TypeDecl::Texture(_)
            | ast::TypeDecl::Sampler { .. } => {}
        }
    }

    fn expression(&mut self, expr: Handle<ast::Expression>) {
        let tu = self.tu;
        match tu.expressions[expr] {
            ast::Expression::Literal(_) => {}
            ast::Expression::Identifier(ref name) => {
                self.names.insert(name.as_str());
            }
            ast::Expression::Paren(inner) | ast::Expression::Unary { expr: inner, .. } => {
                self.expression(inner)
            }
            ast::Expression::Binary { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            ast::Expression::Index { base, index } => {
                self.expression(base);
                self.expression(index);
            }
            ast::Expression::Member { base, .. } => self.expression(base),
            ast::Expression::Construct { ref ty, ref args } => {
                match *ty {
                    ast::ConstructorType::Scalar(_) => {}
                    ast::ConstructorType::Vector { component, .. }
                    | ast::ConstructorType::Matrix { component, .. } => {
                        self.optional_ty(component)
                    }
                    ast::ConstructorType::Array { base, size } => {
                        self.optional_ty(base);
                        self.optional_expression(size);
                    }
                }
                for &arg in args.iter() {
                    self.expression(arg);
                }
            }
            ast::Expression::Call {
                ref callee,
                template,
                ref args,
            } => {
                self.names.insert(callee.as_str());
                self.optional_ty(template);
                for &arg in args.iter() {
                    self.expression(arg);
                }
            }
            ast::Expression::Augmented(ref augmented) => match *augmented {
                ast::AugmentedExpression::KnownValue {
                    known_value,
                    expression,
                } => {
                    self.expression(known_value);
                    self.expression(expression);
                }
                ast::AugmentedExpression::AddZero { original, zero, .. } => {
                    self.expression(original);
                    self.expression(zero);
                }
                ast::AugmentedExpression::MulOne { original, one, .. } => {
                    self.expression(original);
                    self.expression(one);
                }
                ast::AugmentedExpression::FalseByConstruction(inner)
                | ast::AugmentedExpression::TrueByConstruction(inner) => self.expression(inner),
            },
        }
    }
}
