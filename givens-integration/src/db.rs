//! `FixtureOracle`: a small in-memory `Oracle` implementation, used by
//! `givens-cli` and `givens-tests`. Grounded on `chalk-integration`'s role
//! as the concrete database chalk's own tests and REPL drive the solver
//! with -- never the solver's own representation.

use std::collections::HashMap;

use givens_ir::{AdaptError, Oracle, ShadowProbe, Symbol, TypeShape};

/// An interned type handle. Equality is by handle, which is exactly
/// type-equivalence since `FixtureOracle` hash-conses every `TypeData` it
/// builds.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ty(u32);

impl std::fmt::Debug for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ty({})", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum TypeData {
    /// An applied class type, e.g. `List[Int]`.
    Class { class: Symbol, args: Vec<Ty> },
    /// A singleton type `x.type`.
    Singleton { base: Ty },
    /// A by-name parameter type `=> T`.
    ByName(Ty),
    Method {
        implicit: bool,
        params: Vec<Ty>,
        result: Ty,
    },
    Poly { result: Ty },
    Function { param: Ty, result: Ty },
    /// The type of a bare (possibly overloaded) term reference.
    TermRefTy(Symbol),
    /// The synthesized `Not[_]` coherence prototype.
    NotProto(Ty),
    /// A coherence-tagged equality witness prototype.
    CoherenceTagged(Ty),
    /// An unresolved/placeholder type, used in place of real
    /// type-variable machinery (see [`Oracle::wildcard_approximate`]'s
    /// doc comment on this fixture).
    Wildcard,
    /// An opaque type alias, with its underlying type.
    Opaque { alias: Symbol, underlying: Ty },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    Class,
    Companion,
    Given,
    Field,
    Param,
    Witness,
}

#[derive(Clone, Debug)]
struct SymbolData {
    name: String,
    owner: Option<Symbol>,
    kind: SymbolKind,
    /// The symbol's own declared type, for `type_of_symbol`. Absent for
    /// classes, whose "type" is instead their applied `Ty::Class` (see
    /// `class_type`).
    ty: Option<Ty>,
    parents: Vec<Symbol>,
    companions: Vec<Symbol>,
    is_opaque_alias: bool,
    /// If `Some(owner)`, this symbol is private and only accessible from
    /// prefixes rooted at `owner`.
    accessible_privately_from: Option<Symbol>,
}

/// A constructed term, in the spirit of chalk-ir's own `Ty`/`GenericArg`
/// tree shapes but with no interning: trees are short-lived and built
/// once per trial, so hash-consing them buys nothing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TreeData {
    Ident(Symbol),
    Select(Box<TreeData>, Symbol),
    Apply(Box<TreeData>, Vec<TreeData>),
    New(Symbol),
    Block(Vec<TreeData>, Box<TreeData>),
    ValDef(Symbol, Box<TreeData>),
    ClassDef(Symbol, Vec<Symbol>, Vec<TreeData>),
}

/// The disposable per-trial state a real type checker would thread through
/// `try_adapt`/`commit`. The fixture has no persistent typer state to roll
/// back or apply, so `Commit` carries nothing -- a deliberate
/// simplification, not an oversight: every `try_*` method below already
/// decides success/failure structurally, with nothing left to commit.
pub type Commit = ();

#[derive(Default, Debug)]
pub struct FixtureOracle {
    types: Vec<TypeData>,
    type_index: HashMap<TypeData, Ty>,
    symbols: Vec<SymbolData>,
    /// `(receiver class, method name) -> extension method symbol`.
    extensions: HashMap<(Symbol, String), Symbol>,
    /// Bare names currently in scope at the (single, fixed) use site probed
    /// by `probe_bare_name`, populated by lowering's `shadow` bindings.
    shadow: HashMap<String, Symbol>,
    /// Lazily-declared marker classes handed out as
    /// `dictionary_class_parents`, so every fixture gets the same two
    /// symbols rather than allocating a fresh pair per dictionary.
    object_root: Option<Symbol>,
    serializable_marker: Option<Symbol>,
}

impl FixtureOracle {
    pub fn new() -> Self {
        FixtureOracle::default()
    }

    fn intern(&mut self, data: TypeData) -> Ty {
        if let Some(ty) = self.type_index.get(&data) {
            return *ty;
        }
        let ty = Ty(self.types.len() as u32);
        self.types.push(data.clone());
        self.type_index.insert(data, ty);
        ty
    }

    fn data(&self, ty: Ty) -> &TypeData {
        &self.types[ty.0 as usize]
    }

    fn sym(&self, symbol: Symbol) -> &SymbolData {
        &self.symbols[symbol.index() as usize]
    }

    // -- Fixture construction, used by `lowering.rs` --------------------

    pub fn declare_symbol(
        &mut self,
        name: &str,
        owner: Option<Symbol>,
        kind: SymbolKind,
    ) -> Symbol {
        let symbol = Symbol::new(self.symbols.len() as u32);
        self.symbols.push(SymbolData {
            name: name.to_string(),
            owner,
            kind,
            ty: None,
            parents: Vec::new(),
            companions: Vec::new(),
            is_opaque_alias: false,
            accessible_privately_from: None,
        });
        symbol
    }

    pub fn set_type(&mut self, symbol: Symbol, ty: Ty) {
        self.symbols[symbol.index() as usize].ty = Some(ty);
    }

    pub fn add_parent(&mut self, class: Symbol, parent: Symbol) {
        self.symbols[class.index() as usize].parents.push(parent);
    }

    pub fn add_companion(&mut self, class: Symbol, companion: Symbol) {
        self.symbols[class.index() as usize].companions.push(companion);
    }

    pub fn mark_opaque_alias(&mut self, symbol: Symbol) {
        self.symbols[symbol.index() as usize].is_opaque_alias = true;
    }

    pub fn mark_private_to(&mut self, symbol: Symbol, owner: Symbol) {
        self.symbols[symbol.index() as usize].accessible_privately_from = Some(owner);
    }

    pub fn register_extension(&mut self, receiver_class: Symbol, name: &str, method: Symbol) {
        self.extensions
            .insert((receiver_class, name.to_string()), method);
    }

    pub fn bind_shadow(&mut self, name: &str, symbol: Symbol) {
        self.shadow.insert(name.to_string(), symbol);
    }

    /// The single `AnyRef`-equivalent root class, declared the first time
    /// anything asks for it.
    fn well_known_object_root(&mut self) -> Symbol {
        if let Some(sym) = self.object_root {
            return sym;
        }
        let sym = self.declare_symbol("AnyRef", None, SymbolKind::Class);
        self.object_root = Some(sym);
        sym
    }

    /// The single `Serializable`-equivalent marker class, declared the
    /// first time anything asks for it.
    fn well_known_serializable_marker(&mut self) -> Symbol {
        if let Some(sym) = self.serializable_marker {
            return sym;
        }
        let sym = self.declare_symbol("Serializable", None, SymbolKind::Class);
        self.serializable_marker = Some(sym);
        sym
    }

    pub fn class_ty(&mut self, class: Symbol, args: Vec<Ty>) -> Ty {
        self.intern(TypeData::Class { class, args })
    }

    pub fn singleton_ty(&mut self, base: Ty) -> Ty {
        self.intern(TypeData::Singleton { base })
    }

    pub fn by_name_ty(&mut self, inner: Ty) -> Ty {
        self.intern(TypeData::ByName(inner))
    }

    pub fn method_ty(&mut self, implicit: bool, params: Vec<Ty>, result: Ty) -> Ty {
        self.intern(TypeData::Method {
            implicit,
            params,
            result,
        })
    }

    pub fn poly_ty(&mut self, result: Ty) -> Ty {
        self.intern(TypeData::Poly { result })
    }

    pub fn function_ty(&mut self, param: Ty, result: Ty) -> Ty {
        self.intern(TypeData::Function { param, result })
    }

    pub fn term_ref_ty(&mut self, symbol: Symbol) -> Ty {
        self.intern(TypeData::TermRefTy(symbol))
    }

    pub fn not_proto_ty(&mut self, inner: Ty) -> Ty {
        self.intern(TypeData::NotProto(inner))
    }

    pub fn coherence_tagged_ty(&mut self, inner: Ty) -> Ty {
        self.intern(TypeData::CoherenceTagged(inner))
    }

    pub fn wildcard_ty(&mut self) -> Ty {
        self.intern(TypeData::Wildcard)
    }

    pub fn opaque_ty(&mut self, alias: Symbol, underlying: Ty) -> Ty {
        self.intern(TypeData::Opaque { alias, underlying })
    }

    /// Whether `class` is reachable from `start` by following `parents`
    /// edges (reflexively) -- the fixture's entire notion of subtyping.
    fn class_reaches(&self, start: Symbol, target: Symbol) -> bool {
        if start == target {
            return true;
        }
        self.sym(start)
            .parents
            .iter()
            .any(|&p| self.class_reaches(p, target))
    }

    fn ancestors_closure(&self, class: Symbol) -> std::collections::HashSet<Symbol> {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![class];
        while let Some(c) = stack.pop() {
            if seen.insert(c) {
                stack.extend(self.sym(c).parents.iter().copied());
            }
        }
        seen
    }
}

impl Oracle for FixtureOracle {
    type Type = Ty;
    type Tree = TreeData;

    fn is_subtype(&self, sub: &Ty, sup: &Ty) -> bool {
        if sub == sup {
            return true;
        }
        match (self.data(*sub), self.data(*sup)) {
            (TypeData::Class { class: c1, .. }, TypeData::Class { class: c2, .. }) => {
                self.class_reaches(*c1, *c2)
            }
            (TypeData::Singleton { base }, _) => self.is_subtype(base, sup),
            (TypeData::Opaque { underlying, .. }, _) => self.is_subtype(underlying, sup),
            (_, TypeData::Opaque { underlying, .. }) => self.is_subtype(sub, underlying),
            // A by-name type `=> T` is transparent to subtyping: anything
            // that conforms to `T` satisfies a `=> T` prototype and vice
            // versa, matching a by-name implicit parameter accepting any
            // eligible `T`-typed candidate including a `=> T` one.
            (TypeData::ByName(inner), _) => self.is_subtype(inner, sup),
            (_, TypeData::ByName(inner)) => self.is_subtype(sub, inner),
            (TypeData::Wildcard, _) | (_, TypeData::Wildcard) => true,
            _ => false,
        }
    }

    fn widen(&self, ty: &Ty) -> Ty {
        match self.data(*ty) {
            TypeData::Singleton { base } => *base,
            _ => *ty,
        }
    }

    fn widen_singleton(&self, ty: &Ty) -> Ty {
        self.widen(ty)
    }

    fn dealias(&self, ty: &Ty) -> Ty {
        match self.data(*ty) {
            TypeData::Opaque { underlying, .. } => self.dealias(underlying),
            _ => *ty,
        }
    }

    fn normalize(&self, ty: &Ty) -> Ty {
        self.widen(&self.dealias(ty))
    }

    /// No bounded type-variable machinery exists in this fixture, so
    /// approximation is the identity -- every type here is already
    /// ground, except the explicit `Wildcard` marker, which is its own
    /// approximation.
    fn wildcard_approximate(&self, ty: &Ty) -> Ty {
        *ty
    }

    fn shape(&self, ty: &Ty) -> TypeShape<Ty> {
        match self.data(*ty) {
            TypeData::Method {
                implicit,
                params,
                result,
            } => TypeShape::Method {
                implicit: *implicit,
                params: params.clone(),
                result: *result,
            },
            TypeData::Poly { result } => TypeShape::Poly { result: *result },
            TypeData::Function { param, result } => TypeShape::Function {
                param: *param,
                result: *result,
            },
            TypeData::TermRefTy(sym) => TypeShape::TermRef(*sym),
            _ => TypeShape::Other,
        }
    }

    fn structural_parts(&self, ty: &Ty) -> Vec<Ty> {
        match self.data(*ty) {
            TypeData::Class { class, args } => {
                let mut parts = args.clone();
                parts.extend(self.sym(*class).parents.iter().map(|&p| self.class_type(p)));
                parts
            }
            TypeData::Singleton { base } => vec![*base],
            TypeData::ByName(inner)
            | TypeData::NotProto(inner)
            | TypeData::CoherenceTagged(inner) => vec![*inner],
            TypeData::Opaque { underlying, .. } => vec![*underlying],
            _ => Vec::new(),
        }
    }

    fn class_symbols(&self, ty: &Ty) -> Vec<Symbol> {
        match self.data(*ty) {
            TypeData::Class { class, .. } => self.ancestors_closure(*class).into_iter().collect(),
            TypeData::Singleton { base } => self.class_symbols(base),
            TypeData::Opaque { underlying, .. } => self.class_symbols(underlying),
            _ => Vec::new(),
        }
    }

    fn is_value_type(&self, ty: &Ty) -> bool {
        !matches!(self.data(*ty), TypeData::Method { .. } | TypeData::Poly { .. })
    }

    fn is_by_name_type(&self, ty: &Ty) -> bool {
        matches!(self.data(*ty), TypeData::ByName(_))
    }

    fn resolve_extension_method(&self, receiver: &Ty, name: &str) -> Option<Symbol> {
        let receiver_class = self.symbol_of(&self.widen(receiver))?;
        self.ancestors_closure(receiver_class)
            .into_iter()
            .find_map(|c| self.extensions.get(&(c, name.to_string())).copied())
    }

    fn derives_from_conversion_class(&self, ty: &Ty) -> bool {
        self.symbol_of(ty)
            .map(|s| self.sym(s).kind == SymbolKind::Witness)
            .unwrap_or(false)
    }

    fn derives_from_subtype_witness(&self, ty: &Ty) -> bool {
        self.derives_from_conversion_class(ty)
    }

    fn derives_from_single_arg_function(&self, ty: &Ty) -> bool {
        matches!(self.data(*ty), TypeData::Function { .. })
    }

    fn is_not_prototype(&self, ty: &Ty) -> bool {
        matches!(self.data(*ty), TypeData::NotProto(_))
    }

    fn is_coherence_tagged(&self, ty: &Ty) -> bool {
        matches!(self.data(*ty), TypeData::CoherenceTagged(_))
    }

    fn type_size(&self, ty: &Ty) -> u32 {
        1 + self
            .structural_parts(ty)
            .iter()
            .map(|p| self.type_size(p))
            .sum::<u32>()
    }

    fn covering_set(&self, ty: &Ty) -> Vec<Symbol> {
        self.class_symbols(ty)
    }

    /// Every type in this fixture is ground and hash-stable by
    /// construction (interning guarantees it); there is no provisional
    /// state to exclude from the cache.
    fn is_cacheable(&self, _ty: &Ty) -> bool {
        true
    }

    fn is_class(&self, sym: Symbol) -> bool {
        self.sym(sym).kind == SymbolKind::Class
    }

    fn is_opaque_alias(&self, sym: Symbol) -> bool {
        self.sym(sym).is_opaque_alias
    }

    fn companions_of_class(&self, class: Symbol) -> Vec<Symbol> {
        self.sym(class).companions.clone()
    }

    fn companions_of_opaque_alias(&self, alias: Symbol) -> Vec<Symbol> {
        self.sym(alias).companions.clone()
    }

    // Lowering interns a zero-arg `Class`/bare `TermRefTy` for every class
    // and companion it declares, so these lookups always hit; they don't
    // fall back to `intern` only because this method takes `&self`.
    fn companion_prefix(&self, companion: Symbol) -> Ty {
        self.type_index
            .get(&TypeData::TermRefTy(companion))
            .copied()
            .unwrap_or(Ty(u32::MAX))
    }

    fn class_type(&self, class: Symbol) -> Ty {
        self.type_index
            .get(&TypeData::Class {
                class,
                args: Vec::new(),
            })
            .copied()
            .unwrap_or(Ty(u32::MAX))
    }

    fn parents(&self, class: Symbol) -> Vec<Symbol> {
        self.sym(class).parents.clone()
    }

    fn type_of_symbol(&self, sym: Symbol) -> Ty {
        self.sym(sym).ty.unwrap_or_else(|| self.class_type(sym))
    }

    fn name_of(&self, sym: Symbol) -> String {
        self.sym(sym).name.clone()
    }

    fn prefix_of(&self, _ty: &Ty) -> Option<Ty> {
        // This fixture models prefixes only as `TermRef::prefix`, never
        // as part of a named type's own shape.
        None
    }

    fn symbol_of(&self, ty: &Ty) -> Option<Symbol> {
        match self.data(*ty) {
            TypeData::Class { class, .. } => Some(*class),
            TypeData::TermRefTy(sym) => Some(*sym),
            TypeData::Opaque { alias, .. } => Some(*alias),
            _ => None,
        }
    }

    fn accessible(&self, symbol: Symbol, prefix: &Ty) -> bool {
        match self.sym(symbol).accessible_privately_from {
            None => true,
            Some(owner) => self.symbol_of(prefix) == Some(owner),
        }
    }

    /// No type-parameter substitution machinery exists in this fixture;
    /// every `Ty` handle already denotes a fully applied type, so
    /// re-expressing it from a prefix is the identity.
    fn as_seen_from(&self, ty: &Ty, _prefix: &Ty) -> Ty {
        *ty
    }

    fn compare(&self, a: Symbol, b: Symbol, level_a: u32, level_b: u32) -> std::cmp::Ordering {
        level_a
            .cmp(&level_b)
            .then_with(|| {
                let owner_a = self.sym(a).owner;
                let owner_b = self.sym(b).owner;
                match (owner_a, owner_b) {
                    (Some(oa), Some(ob)) if oa != ob => {
                        if self.class_reaches(oa, ob) {
                            std::cmp::Ordering::Greater
                        } else if self.class_reaches(ob, oa) {
                            std::cmp::Ordering::Less
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    }
                    _ => std::cmp::Ordering::Equal,
                }
            })
            .then_with(|| arity_of(self, a).cmp(&arity_of(self, b)).reverse())
    }

    fn fresh_symbol(&mut self, owner: Symbol, name: &str) -> Symbol {
        let unique = format!("{}${}", name, self.symbols.len());
        self.declare_symbol(&unique, Some(owner), SymbolKind::Witness)
    }

    fn dictionary_class_parents(&mut self) -> Vec<Symbol> {
        vec![self.well_known_object_root(), self.well_known_serializable_marker()]
    }

    fn tree_ident(&self, sym: Symbol) -> TreeData {
        TreeData::Ident(sym)
    }

    fn tree_select(&self, base: TreeData, member: Symbol) -> TreeData {
        TreeData::Select(Box::new(base), member)
    }

    fn tree_apply(&self, func: TreeData, args: Vec<TreeData>) -> TreeData {
        TreeData::Apply(Box::new(func), args)
    }

    fn tree_new(&self, class: Symbol) -> TreeData {
        TreeData::New(class)
    }

    fn tree_block(&self, stmts: Vec<TreeData>, result: TreeData) -> TreeData {
        TreeData::Block(stmts, Box::new(result))
    }

    fn tree_val_def(&self, sym: Symbol, rhs: TreeData) -> TreeData {
        TreeData::ValDef(sym, Box::new(rhs))
    }

    fn tree_class_def(&self, sym: Symbol, parents: Vec<Symbol>, fields: Vec<TreeData>) -> TreeData {
        TreeData::ClassDef(sym, parents, fields)
    }

    fn tree_type(&self, tree: &TreeData) -> Ty {
        match tree {
            TreeData::Ident(sym) => self.type_of_symbol(*sym),
            TreeData::Select(_, member) => self.type_of_symbol(*member),
            TreeData::Apply(func, _) => match self.data(self.tree_type(func)) {
                TypeData::Method { result, .. } => *result,
                TypeData::Poly { result } => *result,
                _ => self.tree_type(func),
            },
            TreeData::New(class) => self.class_type(*class),
            TreeData::Block(_, result) => self.tree_type(result),
            // Never queried in practice: a `ValDef`/`ClassDef`'s type is
            // not a value type participants ever need, only its symbol.
            TreeData::ValDef(sym, _) | TreeData::ClassDef(sym, _, _) => self.type_of_symbol(*sym),
        }
    }

    fn identifiers_of(&self, tree: &TreeData) -> Vec<Symbol> {
        let mut out = Vec::new();
        collect_identifiers(tree, &mut out);
        out
    }

    fn substitute_idents(
        &self,
        tree: &TreeData,
        subst: &HashMap<Symbol, TreeData>,
    ) -> TreeData {
        match tree {
            TreeData::Ident(sym) => subst.get(sym).cloned().unwrap_or_else(|| tree.clone()),
            TreeData::Select(base, member) => {
                TreeData::Select(Box::new(self.substitute_idents(base, subst)), *member)
            }
            TreeData::Apply(func, args) => TreeData::Apply(
                Box::new(self.substitute_idents(func, subst)),
                args.iter().map(|a| self.substitute_idents(a, subst)).collect(),
            ),
            TreeData::New(_) => tree.clone(),
            TreeData::Block(stmts, result) => TreeData::Block(
                stmts.iter().map(|s| self.substitute_idents(s, subst)).collect(),
                Box::new(self.substitute_idents(result, subst)),
            ),
            TreeData::ValDef(sym, rhs) => {
                TreeData::ValDef(*sym, Box::new(self.substitute_idents(rhs, subst)))
            }
            TreeData::ClassDef(sym, parents, fields) => TreeData::ClassDef(
                *sym,
                parents.clone(),
                fields.iter().map(|f| self.substitute_idents(f, subst)).collect(),
            ),
        }
    }

    type Commit = Commit;

    fn try_adapt(&mut self, tree: TreeData, pt: &Ty) -> Result<(TreeData, Commit), AdaptError> {
        let actual = self.tree_type(&tree);
        if self.is_subtype(&actual, pt) {
            Ok((tree, ()))
        } else {
            Err(AdaptError)
        }
    }

    fn try_extension_apply(
        &mut self,
        receiver: TreeData,
        name: &str,
        argument: TreeData,
    ) -> Result<(TreeData, Commit), AdaptError> {
        let receiver_ty = self.tree_type(&receiver);
        let method = self
            .resolve_extension_method(&receiver_ty, name)
            .ok_or(AdaptError)?;
        let call = TreeData::Apply(
            Box::new(TreeData::Select(Box::new(receiver), method)),
            vec![argument],
        );
        Ok((call, ()))
    }

    fn try_conversion_apply(
        &mut self,
        conversion: TreeData,
        argument: TreeData,
    ) -> Result<(TreeData, Commit), AdaptError> {
        Ok((TreeData::Apply(Box::new(conversion), vec![argument]), ()))
    }

    fn commit(&mut self, _commit: Commit) {}

    fn trivial_commit(&self) -> Commit {}

    fn probe_bare_name(&mut self, name: &str, expected: Symbol) -> ShadowProbe {
        match self.shadow.get(name) {
            Some(&found) if found == expected => ShadowProbe::SameOrCompatible,
            Some(&found) => {
                let same_owner = self.sym(found).owner == self.sym(expected).owner;
                if same_owner {
                    ShadowProbe::SameOrCompatible
                } else {
                    ShadowProbe::ShadowedBy(found)
                }
            }
            None => ShadowProbe::SameOrCompatible,
        }
    }
}

fn arity_of(oracle: &FixtureOracle, sym: Symbol) -> usize {
    match oracle.sym(sym).ty {
        Some(ty) => match oracle.data(ty) {
            TypeData::Method { implicit: true, params, .. } => params.len(),
            _ => 0,
        },
        None => 0,
    }
}

fn collect_identifiers(tree: &TreeData, out: &mut Vec<Symbol>) {
    match tree {
        TreeData::Ident(sym) => out.push(*sym),
        TreeData::Select(base, _) => collect_identifiers(base, out),
        TreeData::Apply(func, args) => {
            collect_identifiers(func, out);
            for a in args {
                collect_identifiers(a, out);
            }
        }
        TreeData::New(_) => {}
        TreeData::Block(stmts, result) => {
            for s in stmts {
                collect_identifiers(s, out);
            }
            collect_identifiers(result, out);
        }
        TreeData::ValDef(_, rhs) => collect_identifiers(rhs, out),
        TreeData::ClassDef(_, _, fields) => {
            for f in fields {
                collect_identifiers(f, out);
            }
        }
    }
}
