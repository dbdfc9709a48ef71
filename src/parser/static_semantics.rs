use std::rc::Rc;

use crate::parser::ast::{
    ForBinding, ForInit, FunctionData, StatementType, VariableDeclarationData,
    VariableDeclarationKind,
};

/// Names declared with `var` in `body`, looking into nested blocks and loops
/// but not into nested functions. Duplicates are removed.
pub(crate) fn collect_var_names(body: &[StatementType]) -> Vec<String> {
    let mut names = vec![];
    for statement in body {
        var_names_of_statement(statement, &mut names);
    }
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

fn var_names_of_declaration(decl: &VariableDeclarationData, names: &mut Vec<String>) {
    if decl.kind == VariableDeclarationKind::Var {
        for declarator in &decl.declarations {
            names.append(&mut declarator.id.bound_names());
        }
    }
}

fn var_names_of_statement(statement: &StatementType, names: &mut Vec<String>) {
    match statement {
        StatementType::VariableDeclaration(decl) => var_names_of_declaration(decl, names),
        StatementType::BlockStatement(block) => {
            for s in &block.body {
                var_names_of_statement(s, names);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            var_names_of_statement(consequent, names);
            if let Some(alternate) = alternate {
                var_names_of_statement(alternate, names);
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::DoWhileStatement { body, .. } => {
            var_names_of_statement(body, names)
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(ForInit::VariableDeclaration(decl)) = init {
                var_names_of_declaration(decl, names);
            }
            var_names_of_statement(body, names);
        }
        StatementType::ForInStatement(data) | StatementType::ForOfStatement(data) => {
            if let ForBinding::Declaration(VariableDeclarationKind::Var, pattern) = &data.left {
                names.append(&mut pattern.bound_names());
            }
            var_names_of_statement(&data.body, names);
        }
        StatementType::SwitchStatement { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    var_names_of_statement(s, names);
                }
            }
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
        } => {
            for s in &block.body {
                var_names_of_statement(s, names);
            }
            if let Some(handler) = handler {
                for s in &handler.body.body {
                    var_names_of_statement(s, names);
                }
            }
            if let Some(finalizer) = finalizer {
                for s in &finalizer.body {
                    var_names_of_statement(s, names);
                }
            }
        }
        _ => {}
    }
}

/// A `let`/`const` binding declared directly in a statement list.
pub struct LexicalDeclaration {
    pub name: String,
    pub is_const: bool,
}

/// `let` and `const` names declared directly in `body`. These bindings are
/// created uninitialized when the enclosing scope is entered.
pub fn lexically_declared_names(body: &[StatementType]) -> Vec<LexicalDeclaration> {
    let mut declarations = vec![];
    for statement in body {
        if let StatementType::VariableDeclaration(decl) = statement {
            if decl.kind == VariableDeclarationKind::Var {
                continue;
            }
            for declarator in &decl.declarations {
                for name in declarator.id.bound_names() {
                    declarations.push(LexicalDeclaration {
                        name,
                        is_const: decl.kind == VariableDeclarationKind::Const,
                    });
                }
            }
        }
    }
    declarations
}

/// Function declarations directly in `body`, which are hoisted to the top of
/// their scope.
pub fn function_declarations(body: &[StatementType]) -> Vec<Rc<FunctionData>> {
    body.iter()
        .filter_map(|s| match s {
            StatementType::FunctionDeclaration(f) => Some(f.clone()),
            _ => None,
        })
        .collect()
}

/// Kind of scope a statement list forms, for the redeclaration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationScope {
    /// Top level of a function body: function declarations act like `var`.
    Function,
    /// Block, `switch` body or `catch` body: function declarations are lexical.
    Block,
}

/// The first name in `body` that a `let`, `const` or block-level function
/// declaration binds twice, or that clashes with a `var` hoisted through the
/// same scope or with one of `parameters`. Returns the name and the index of
/// the statement where the clash is detected.
pub fn find_redeclaration<'a>(
    body: impl IntoIterator<Item = &'a StatementType>,
    scope: DeclarationScope,
    parameters: &[String],
) -> Option<(String, usize)> {
    let mut lexical: Vec<String> = vec![];
    let mut var_like: Vec<String> = vec![];
    for (index, statement) in body.into_iter().enumerate() {
        let clashes_lexically = |name: &String, lexical: &[String], var_like: &[String]| {
            lexical.contains(name) || var_like.contains(name) || parameters.contains(name)
        };
        match statement {
            StatementType::VariableDeclaration(decl) if decl.kind != VariableDeclarationKind::Var => {
                for declarator in &decl.declarations {
                    for name in declarator.id.bound_names() {
                        if clashes_lexically(&name, &lexical, &var_like) {
                            return Some((name, index));
                        }
                        lexical.push(name);
                    }
                }
            }
            StatementType::FunctionDeclaration(f) => {
                let name = match &f.id {
                    Some(name) => name.clone(),
                    None => continue,
                };
                match scope {
                    DeclarationScope::Block => {
                        if clashes_lexically(&name, &lexical, &var_like) {
                            return Some((name, index));
                        }
                        lexical.push(name);
                    }
                    DeclarationScope::Function => {
                        if lexical.contains(&name) {
                            return Some((name, index));
                        }
                        var_like.push(name);
                    }
                }
            }
            other => {
                let mut names = vec![];
                var_names_of_statement(other, &mut names);
                for name in names {
                    if lexical.contains(&name) {
                        return Some((name, index));
                    }
                    var_like.push(name);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::parser::JsParser;

    use super::*;

    #[test]
    fn test_var_names_are_collected_from_nested_blocks_only() {
        let program = JsParser::parse_to_ast_from_str(
            "var a = 1; if (a) { var b; } for (var i = 0; i < 1; i++) {} function f() { var hidden; } var a;",
        )
        .unwrap();
        assert_eq!(program.var_names, vec!["a", "b", "i"]);
    }

    #[test]
    fn test_lexical_names_skip_var() {
        let program =
            JsParser::parse_to_ast_from_str("let x = 1; const { y, z: [w] } = o; var v;").unwrap();
        let names: Vec<(String, bool)> = lexically_declared_names(&program.body)
            .into_iter()
            .map(|d| (d.name, d.is_const))
            .collect();
        assert_eq!(
            names,
            vec![
                ("x".to_string(), false),
                ("y".to_string(), true),
                ("w".to_string(), true)
            ]
        );
    }

    fn redeclared(code: &str) -> Option<String> {
        let program = JsParser::parse_to_ast_from_str(code);
        match program {
            Ok(_) => None,
            Err(e) => Some(e.message),
        }
    }

    #[test]
    fn test_let_and_const_cannot_be_redeclared() {
        assert_eq!(
            redeclared("let a = 1; let a = 2;").as_deref(),
            Some("Identifier 'a' has already been declared")
        );
        assert!(redeclared("var name = 'x'; const name = 'y';").is_some());
        assert!(redeclared("let f; function f() {}").is_some());
        assert!(redeclared("let a; { var a; }").is_some());
        assert!(redeclared("{ let b; function b() {} }").is_some());
    }

    #[test]
    fn test_compatible_declarations_are_accepted() {
        assert_eq!(redeclared("var a; var a;"), None);
        assert_eq!(redeclared("var f; function f() {}"), None);
        assert_eq!(redeclared("let a; { let a; }"), None);
        assert_eq!(redeclared("let i; for (let i = 0; i < 1; i++) { let i; }"), None);
        assert_eq!(redeclared("function g(a) { var a; }"), None);
    }

    #[test]
    fn test_parameters_clash_with_lexical_declarations() {
        assert!(redeclared("function g(a) { let a; }").is_some());
        assert!(redeclared("const h = (x) => { const x = 1; };").is_some());
        assert!(redeclared("try {} catch (e) { let e; }").is_some());
    }

    #[test]
    fn test_switch_cases_share_one_scope() {
        assert!(redeclared("switch (1) { case 1: let x; break; default: let x; }").is_some());
    }
}
