//! A minimal textual program description, lowered into [`FixtureOracle`]
//! facts. Not meant to cover general-purpose syntax -- just enough to
//! describe class hierarchies, companions, given instances, extension
//! methods, and shadowing for `givens-tests` fixtures and the CLI's
//! `:load` command. Line-oriented, one declaration per line, grounded on
//! `rljacobson-mod2`'s hand-rolled small-grammar parsing style rather than
//! a parser-generator.
//!
//! Grammar (one directive per line, blank lines and `#`-comments ignored):
//!
//! ```text
//! class Name [: Parent1, Parent2]
//! opaque Name : Underlying
//! companion Owner Name
//! given Name : OwnerClass.Type [implicit Param1, Param2] -> Result
//! field Name : Owner.Type
//! extension Receiver.method -> MethodSymbol
//! shadow name -> Symbol
//! private Name to Owner
//! ```

use std::collections::HashMap;

use givens_ir::Symbol;

use crate::db::{FixtureOracle, SymbolKind, Ty};
use crate::error::LoweringError;

/// Lowers `source` into a fresh [`FixtureOracle`], returning the oracle
/// plus a name -> symbol table for the test/CLI caller to look candidates
/// up by name afterward.
pub fn lower(source: &str) -> Result<(FixtureOracle, HashMap<String, Symbol>), LoweringError> {
    let mut oracle = FixtureOracle::new();
    let mut names: HashMap<String, Symbol> = HashMap::new();
    let mut class_ty_of: HashMap<String, Ty> = HashMap::new();

    for (lineno, raw_line) in source.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let lineno = lineno + 1;
        let mut words = line.split_whitespace();
        let directive = words.next().unwrap();
        let rest: Vec<&str> = words.collect();

        match directive {
            "class" => {
                let (name, parents) = parse_class_header(&rest, lineno)?;
                let sym = oracle.declare_symbol(&name, None, SymbolKind::Class);
                names.insert(name.clone(), sym);
                for parent_name in parents {
                    let parent = lookup(&names, &parent_name, lineno)?;
                    oracle.add_parent(sym, parent);
                }
                let ty = oracle.class_ty(sym, Vec::new());
                class_ty_of.insert(name, ty);
            }
            "opaque" => {
                let (alias, underlying_name) = parse_colon_pair(&rest, lineno, "opaque")?;
                let alias_sym = oracle.declare_symbol(&alias, None, SymbolKind::Class);
                oracle.mark_opaque_alias(alias_sym);
                names.insert(alias.clone(), alias_sym);
                let underlying = *class_ty_of
                    .get(&underlying_name)
                    .ok_or_else(|| LoweringError::unknown(&underlying_name, lineno))?;
                let ty = oracle.opaque_ty(alias_sym, underlying);
                class_ty_of.insert(alias, ty);
            }
            "companion" => {
                if rest.len() != 2 {
                    return Err(LoweringError::syntax("companion Owner Name", lineno));
                }
                let owner = lookup(&names, rest[0], lineno)?;
                let companion = oracle.declare_symbol(rest[1], Some(owner), SymbolKind::Companion);
                names.insert(rest[1].to_string(), companion);
                oracle.add_companion(owner, companion);
                oracle.term_ref_ty(companion);
            }
            "given" => lower_given(&mut oracle, &mut names, &class_ty_of, &rest, lineno)?,
            "field" => lower_field(&mut oracle, &mut names, &class_ty_of, &rest, lineno)?,
            "extension" => {
                if rest.len() != 3 || rest[1] != "->" {
                    return Err(LoweringError::syntax(
                        "extension Receiver.method -> MethodSymbol",
                        lineno,
                    ));
                }
                let (receiver_name, method_name) = rest[0]
                    .split_once('.')
                    .ok_or_else(|| LoweringError::syntax("Receiver.method", lineno))?;
                let receiver = lookup(&names, receiver_name, lineno)?;
                let method = lookup(&names, rest[2], lineno)?;
                oracle.register_extension(receiver, method_name, method);
            }
            "shadow" => {
                if rest.len() != 3 || rest[1] != "->" {
                    return Err(LoweringError::syntax("shadow name -> Symbol", lineno));
                }
                let target = lookup(&names, rest[2], lineno)?;
                oracle.bind_shadow(rest[0], target);
            }
            "private" => {
                if rest.len() != 3 || rest[1] != "to" {
                    return Err(LoweringError::syntax("private Name to Owner", lineno));
                }
                let sym = lookup(&names, rest[0], lineno)?;
                let owner = lookup(&names, rest[2], lineno)?;
                oracle.mark_private_to(sym, owner);
            }
            other => return Err(LoweringError::unknown_directive(other, lineno)),
        }
    }

    Ok((oracle, names))
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_class_header(rest: &[&str], lineno: usize) -> Result<(String, Vec<String>), LoweringError> {
    if rest.is_empty() {
        return Err(LoweringError::syntax("class Name [: Parent, ...]", lineno));
    }
    let name = rest[0].to_string();
    let parents = if rest.len() > 1 {
        if rest[1] != ":" {
            return Err(LoweringError::syntax("class Name : Parent, ...", lineno));
        }
        rest[2..]
            .join(" ")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        Vec::new()
    };
    Ok((name, parents))
}

fn parse_colon_pair(rest: &[&str], lineno: usize, keyword: &str) -> Result<(String, String), LoweringError> {
    if rest.len() != 3 || rest[1] != ":" {
        return Err(LoweringError::syntax(&format!("{keyword} Name : Type"), lineno));
    }
    Ok((rest[0].to_string(), rest[2].to_string()))
}

/// `given Name : Owner.ClassName [implicit Param1, Param2] -> ResultClass`
fn lower_given(
    oracle: &mut FixtureOracle,
    names: &mut HashMap<String, Symbol>,
    class_ty_of: &HashMap<String, Ty>,
    rest: &[&str],
    lineno: usize,
) -> Result<(), LoweringError> {
    if rest.len() < 3 || rest[1] != ":" {
        return Err(LoweringError::syntax(
            "given Name : Owner.ClassName [implicit P1, P2] -> ResultClass",
            lineno,
        ));
    }
    let given_name = rest[0].to_string();
    let (owner_name, _given_class) = rest[2]
        .split_once('.')
        .ok_or_else(|| LoweringError::syntax("Owner.ClassName", lineno))?;
    let owner = lookup(names, owner_name, lineno)?;

    let remainder = &rest[3..];
    let (implicit_params, result_name) = if remainder.first() == Some(&"implicit") {
        let arrow_pos = remainder
            .iter()
            .position(|w| *w == "->")
            .ok_or_else(|| LoweringError::syntax("... -> ResultClass", lineno))?;
        let params: Vec<String> = remainder[1..arrow_pos]
            .join(" ")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let result = remainder
            .get(arrow_pos + 1)
            .ok_or_else(|| LoweringError::syntax("... -> ResultClass", lineno))?
            .to_string();
        (params, result)
    } else if remainder.first() == Some(&"->") {
        let result = remainder
            .get(1)
            .ok_or_else(|| LoweringError::syntax("-> ResultClass", lineno))?
            .to_string();
        (Vec::new(), result)
    } else {
        return Err(LoweringError::syntax("... -> ResultClass", lineno));
    };

    let result_ty = *class_ty_of
        .get(&result_name)
        .ok_or_else(|| LoweringError::unknown(&result_name, lineno))?;
    let mut param_tys = Vec::new();
    for p in &implicit_params {
        let ty = *class_ty_of
            .get(p)
            .ok_or_else(|| LoweringError::unknown(p, lineno))?;
        param_tys.push(ty);
    }

    let given = oracle.declare_symbol(&given_name, Some(owner), SymbolKind::Given);
    let declared_ty = if param_tys.is_empty() {
        result_ty
    } else {
        oracle.method_ty(true, param_tys, result_ty)
    };
    oracle.set_type(given, declared_ty);
    oracle.term_ref_ty(given);
    names.insert(given_name, given);
    Ok(())
}

/// `field Name : Owner.ClassName`
fn lower_field(
    oracle: &mut FixtureOracle,
    names: &mut HashMap<String, Symbol>,
    class_ty_of: &HashMap<String, Ty>,
    rest: &[&str],
    lineno: usize,
) -> Result<(), LoweringError> {
    let (field_name, owner_dotted) = parse_colon_pair(rest, lineno, "field")?;
    let (owner_name, class_name) = owner_dotted
        .split_once('.')
        .ok_or_else(|| LoweringError::syntax("Owner.ClassName", lineno))?;
    let owner = lookup(names, owner_name, lineno)?;
    let ty = *class_ty_of
        .get(class_name)
        .ok_or_else(|| LoweringError::unknown(class_name, lineno))?;
    let field = oracle.declare_symbol(&field_name, Some(owner), SymbolKind::Field);
    oracle.set_type(field, ty);
    names.insert(field_name, field);
    Ok(())
}

fn lookup(names: &HashMap<String, Symbol>, name: &str, lineno: usize) -> Result<Symbol, LoweringError> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| LoweringError::unknown(name, lineno))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_a_simple_hierarchy_with_a_given() {
        let src = "
            class Show
            class IntShow : Show
            companion IntShow IntShowCompanion
            given showInt : IntShowCompanion.IntShow -> Show
        ";
        let (_oracle, names) = lower(src).expect("valid fixture source");
        assert!(names.contains_key("Show"));
        assert!(names.contains_key("IntShow"));
        assert!(names.contains_key("showInt"));
    }

    #[test]
    fn rejects_an_unknown_directive() {
        let err = lower("frobnicate Foo").unwrap_err();
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn rejects_a_reference_to_an_undeclared_class() {
        let err = lower("class Foo : Bar").unwrap_err();
        assert_eq!(err.line(), 1);
    }
}
