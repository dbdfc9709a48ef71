use std::rc::Rc;
use std::time::Instant;

use pest::error::{Error, InputLocation, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::ast::*;
use super::static_semantics::{collect_var_names, find_redeclaration, DeclarationScope};
use super::util::{
    ensure_stack, format_number, spaces, string_to_number, unescape_string, TAB_WIDTH,
};

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

/// Deepest nesting of brackets and template substitutions accepted.
pub const MAX_NESTING_DEPTH: usize = 256;

/// The generated parser recurses once per grammar rule, so it runs on a
/// dedicated stack sized from the script length.
const PARSE_STACK_BASE: usize = 32 * 1024 * 1024;
const PARSE_STACK_PER_BYTE: usize = 4 * 1024;
const PARSE_STACK_MAX: usize = 1024 * 1024 * 1024;

/// A syntax error with the 1-based position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn at(pair: &Pair<Rule>, message: impl Into<String>) -> Self {
        let (line, column) = pair.as_span().start_pos().line_col();
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    fn at_offset(script: &str, offset: usize, message: impl Into<String>) -> Self {
        let before = &script[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    fn malformed() -> Self {
        ParseError {
            message: "Malformed syntax tree".to_string(),
            line: 1,
            column: 1,
        }
    }

    fn from_pest(error: Error<Rule>, script: &str) -> Self {
        let (line, column) = match error.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        let offset = match error.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let message = match script.get(offset..).and_then(|rest| rest.chars().next()) {
            Some(c) => format!("Unexpected token '{}'", c),
            None => "Unexpected end of input".to_string(),
        };
        ParseError {
            message,
            line,
            column,
        }
    }
}

type BuildResult<T> = Result<T, ParseError>;

impl JsParser {
    /// Parse a whole script.
    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, ParseError> {
        let start = Instant::now();
        check_nesting_depth(script)?;
        let pairs = parse_script(script)?;
        for pair in pairs.clone() {
            check_await_placement(&pair, false)?;
        }
        let body = build_statement_list(script_items(pairs), DeclarationScope::Function, &[])?;
        let var_names = collect_var_names(&body);
        tracing::trace!(
            elapsed_us = start.elapsed().as_micros() as u64,
            statements = body.len(),
            "parsed script"
        );
        Ok(ProgramData { body, var_names })
    }

    /// Parse `script` as the body of an anonymous, parameterless function.
    ///
    /// `return` is allowed at the top level and `var` declarations stay local to
    /// the function, exactly as if the text had been placed between
    /// `(function() {` and `})()`.
    pub fn parse_function_body(script: &str) -> Result<Rc<FunctionData>, ParseError> {
        let program = Self::parse_to_ast_from_str(script)?;
        Ok(Rc::new(FunctionData {
            meta: Meta {
                start_index: 0,
                end_index: script.len(),
            },
            id: None,
            params: vec![],
            rest: None,
            body: FunctionBodyOrExpression::FunctionBody(program.body),
            is_arrow: false,
            is_async: false,
            is_declaration: false,
            var_names: program.var_names,
            source_text: format!("function() {{\n{}\n}}", script),
        }))
    }

    /// Numeric value of a string, as `Number(s)` computes it.
    pub fn parse_numeric_string(s: &str) -> f64 {
        string_to_number(s)
    }

    /// Render the raw pest token tree, one rule per line. Handy when working on the grammar.
    pub fn parse_to_token_tree(script: &str) -> Result<String, ParseError> {
        check_nesting_depth(script)?;
        let pairs = parse_script(script)?;
        let mut tree = vec![];
        for pair in pairs {
            tree.push(pair_to_string(pair, 0).join("\n"));
        }
        Ok(tree.join("\n"))
    }
}

fn parse_script(script: &str) -> Result<Pairs<'_, Rule>, ParseError> {
    let stack_size = PARSE_STACK_BASE
        .saturating_add(script.len().saturating_mul(PARSE_STACK_PER_BYTE))
        .min(PARSE_STACK_MAX);
    stacker::grow(stack_size, || JsParser::parse(Rule::script, script))
        .map_err(|e| ParseError::from_pest(e, script))
}

/// Reject scripts nesting brackets deeper than [`MAX_NESTING_DEPTH`]. Strings,
/// comments and template text are skipped; `${` opens a level of its own.
fn check_nesting_depth(script: &str) -> Result<(), ParseError> {
    #[derive(PartialEq)]
    enum Open {
        Bracket,
        Template,
        Substitution,
    }
    let mut open: Vec<Open> = vec![];
    let mut chars = script.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        if open.last() == Some(&Open::Template) {
            match c {
                '\\' => {
                    chars.next();
                }
                '`' => {
                    open.pop();
                }
                '$' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    open.push(Open::Substitution);
                }
                _ => {}
            }
        } else {
            match c {
                '\'' | '"' => {
                    while let Some((_, next)) = chars.next() {
                        match next {
                            '\\' => {
                                chars.next();
                            }
                            '\n' => break,
                            _ if next == c => break,
                            _ => {}
                        }
                    }
                }
                '/' if matches!(chars.peek(), Some((_, '/'))) => {
                    for (_, next) in chars.by_ref() {
                        if next == '\n' {
                            break;
                        }
                    }
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    let mut star = false;
                    for (_, next) in chars.by_ref() {
                        if star && next == '/' {
                            break;
                        }
                        star = next == '*';
                    }
                }
                '`' => open.push(Open::Template),
                '(' | '[' | '{' => open.push(Open::Bracket),
                ')' | ']' | '}' => {
                    open.pop();
                }
                _ => {}
            }
        }
        if open.len() > MAX_NESTING_DEPTH {
            return Err(ParseError::at_offset(
                script,
                offset,
                "Maximum nesting depth exceeded",
            ));
        }
    }
    Ok(())
}

/// `await` is an operator only inside async functions; anywhere else it is
/// a syntax error, as in a classic script.
fn check_await_placement(pair: &Pair<Rule>, in_async: bool) -> BuildResult<()> {
    ensure_stack(|| {
        let in_async = match pair.as_rule() {
            Rule::function_declaration
            | Rule::function_expression
            | Rule::arrow_function
            | Rule::method_definition => pair
                .clone()
                .into_inner()
                .any(|p| p.as_rule() == Rule::async_marker),
            Rule::unary_operator if pair.as_str() == "await" && !in_async => {
                return Err(ParseError::at(
                    pair,
                    "await is only valid in async functions and the top level bodies of modules",
                ));
            }
            _ => in_async,
        };
        for child in pair.clone().into_inner() {
            check_await_placement(&child, in_async)?;
        }
        Ok(())
    })
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    tree.push(format!(
        "{}{:?} => ({},{}) #{:?}",
        spaces(level * TAB_WIDTH),
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    ));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

fn script_items(mut pairs: Pairs<Rule>) -> Pairs<Rule> {
    match pairs.next() {
        Some(script) => script.into_inner(),
        None => pairs,
    }
}

fn expect_next<'i>(inner: &mut Pairs<'i, Rule>) -> BuildResult<Pair<'i, Rule>> {
    inner.next().ok_or_else(ParseError::malformed)
}

fn first_inner(pair: Pair<Rule>) -> BuildResult<Pair<Rule>> {
    pair.into_inner().next().ok_or_else(ParseError::malformed)
}

// ============================================================================
// Statements
// ============================================================================

/// Build the statements of one scope and reject conflicting declarations.
/// `parameters` are the names already bound by the enclosing function or
/// `catch` clause.
fn build_statement_list(
    pairs: Pairs<Rule>,
    scope: DeclarationScope,
    parameters: &[String],
) -> BuildResult<Vec<StatementType>> {
    let pairs: Vec<Pair<Rule>> = pairs.filter(|p| p.as_rule() != Rule::EOI).collect();
    let body = pairs
        .iter()
        .cloned()
        .map(build_statement)
        .collect::<BuildResult<Vec<_>>>()?;
    if let Some((name, index)) = find_redeclaration(&body, scope, parameters) {
        let at = pairs.get(index).ok_or_else(ParseError::malformed)?;
        return Err(redeclaration_error(at, &name));
    }
    Ok(body)
}

fn redeclaration_error(pair: &Pair<Rule>, name: &str) -> ParseError {
    ParseError::at(pair, format!("Identifier '{}' has already been declared", name))
}

fn build_block(pair: Pair<Rule>, parameters: &[String]) -> BuildResult<BlockStatementData> {
    Ok(BlockStatementData {
        body: build_statement_list(pair.into_inner(), DeclarationScope::Block, parameters)?,
    })
}

fn build_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    ensure_stack(|| build_statement_kind(pair))
}

fn build_statement_kind(pair: Pair<Rule>) -> BuildResult<StatementType> {
    Ok(match pair.as_rule() {
        Rule::empty_statement => StatementType::EmptyStatement,
        Rule::block_statement => StatementType::BlockStatement(build_block(pair, &[])?),
        Rule::expression_statement => StatementType::ExpressionStatement {
            expression: build_expression(first_inner(pair)?)?,
        },
        Rule::variable_statement => {
            StatementType::VariableDeclaration(build_variable_declaration(first_inner(pair)?)?)
        }
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(Rc::new(build_function(pair, true)?))
        }
        Rule::if_statement => {
            let mut inner = pair.into_inner();
            let test = build_expression(expect_next(&mut inner)?)?;
            let consequent = Box::new(build_statement(expect_next(&mut inner)?)?);
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                test,
                consequent,
                alternate,
            }
        }
        Rule::for_statement => {
            let mut inner = pair.into_inner();
            let init = match expect_next(&mut inner)?.into_inner().next() {
                Some(p) if p.as_rule() == Rule::variable_declaration => {
                    Some(ForInit::VariableDeclaration(build_variable_declaration(p)?))
                }
                Some(p) => Some(ForInit::Expression(build_expression(p)?)),
                None => None,
            };
            let test = build_optional_expression(expect_next(&mut inner)?)?;
            let update = build_optional_expression(expect_next(&mut inner)?)?;
            let body = Box::new(build_statement(expect_next(&mut inner)?)?);
            StatementType::ForStatement {
                init,
                test,
                update,
                body,
            }
        }
        Rule::for_of_statement | Rule::for_in_statement => {
            let is_of = pair.as_rule() == Rule::for_of_statement;
            let mut inner = pair.into_inner();
            let left = build_for_binding(expect_next(&mut inner)?)?;
            let right = build_expression(expect_next(&mut inner)?)?;
            let body = Box::new(build_statement(expect_next(&mut inner)?)?);
            let data = ForIteratorData { left, right, body };
            if is_of {
                StatementType::ForOfStatement(data)
            } else {
                StatementType::ForInStatement(data)
            }
        }
        Rule::while_statement => {
            let mut inner = pair.into_inner();
            let test = build_expression(expect_next(&mut inner)?)?;
            let body = Box::new(build_statement(expect_next(&mut inner)?)?);
            StatementType::WhileStatement { test, body }
        }
        Rule::do_while_statement => {
            let mut inner = pair.into_inner();
            let body = Box::new(build_statement(expect_next(&mut inner)?)?);
            let test = build_expression(expect_next(&mut inner)?)?;
            StatementType::DoWhileStatement { body, test }
        }
        Rule::switch_statement => {
            let switch_pair = pair.clone();
            let mut inner = pair.into_inner();
            let discriminant = build_expression(expect_next(&mut inner)?)?;
            let mut cases = vec![];
            let mut seen_default = false;
            for clause in inner {
                if clause.as_rule() == Rule::default_clause {
                    if seen_default {
                        return Err(ParseError::at(
                            &clause,
                            "More than one default clause in switch statement",
                        ));
                    }
                    seen_default = true;
                    cases.push(SwitchCaseData {
                        test: None,
                        consequent: build_statements(clause.into_inner())?,
                    });
                } else {
                    let mut clause_inner = clause.into_inner();
                    let test = build_expression(expect_next(&mut clause_inner)?)?;
                    cases.push(SwitchCaseData {
                        test: Some(test),
                        consequent: build_statements(clause_inner)?,
                    });
                }
            }
            let case_body = cases.iter().flat_map(|c| c.consequent.iter());
            if let Some((name, _)) = find_redeclaration(case_body, DeclarationScope::Block, &[]) {
                return Err(redeclaration_error(&switch_pair, &name));
            }
            StatementType::SwitchStatement {
                discriminant,
                cases,
            }
        }
        Rule::try_statement => {
            let mut inner = pair.into_inner();
            let block = build_block(expect_next(&mut inner)?, &[])?;
            let mut handler = None;
            let mut finalizer = None;
            for clause in inner {
                match clause.as_rule() {
                    Rule::catch_clause => {
                        let mut param = None;
                        let mut body = None;
                        for p in clause.into_inner() {
                            if p.as_rule() == Rule::block_statement {
                                let names = param
                                    .as_ref()
                                    .map(PatternType::bound_names)
                                    .unwrap_or_default();
                                body = Some(build_block(p, &names)?);
                            } else {
                                param = Some(build_binding_target(p)?);
                            }
                        }
                        handler = Some(CatchClauseData {
                            param,
                            body: body.ok_or_else(ParseError::malformed)?,
                        });
                    }
                    Rule::finally_clause => {
                        finalizer = Some(build_block(first_inner(clause)?, &[])?);
                    }
                    _ => return Err(ParseError::at(&clause, "Unexpected token")),
                }
            }
            StatementType::TryStatement {
                block,
                handler,
                finalizer,
            }
        }
        Rule::return_statement => StatementType::ReturnStatement {
            argument: match pair.into_inner().next() {
                Some(p) => Some(build_expression(p)?),
                None => None,
            },
        },
        Rule::throw_statement => StatementType::ThrowStatement {
            argument: build_expression(first_inner(pair)?)?,
        },
        Rule::break_statement => StatementType::BreakStatement,
        Rule::continue_statement => StatementType::ContinueStatement,
        _ => return Err(ParseError::at(&pair, "Unexpected token")),
    })
}

/// Statements of a `case` clause; the whole `switch` body is checked as one scope.
fn build_statements(pairs: Pairs<Rule>) -> BuildResult<Vec<StatementType>> {
    pairs.map(build_statement).collect()
}

fn build_optional_expression(pair: Pair<Rule>) -> BuildResult<Option<ExpressionType>> {
    match pair.into_inner().next() {
        Some(p) => Ok(Some(build_expression(p)?)),
        None => Ok(None),
    }
}

fn declaration_kind(pair: &Pair<Rule>) -> VariableDeclarationKind {
    match pair.as_str() {
        "let" => VariableDeclarationKind::Let,
        "const" => VariableDeclarationKind::Const,
        _ => VariableDeclarationKind::Var,
    }
}

fn build_variable_declaration(pair: Pair<Rule>) -> BuildResult<VariableDeclarationData> {
    let mut inner = pair.into_inner();
    let kind = declaration_kind(&expect_next(&mut inner)?);
    let mut declarations = vec![];
    for declarator in inner {
        let declarator_pair = declarator.clone();
        let mut declarator_inner = declarator.into_inner();
        let id = build_binding_target(expect_next(&mut declarator_inner)?)?;
        let init = match declarator_inner.next() {
            Some(p) => Some(build_expression(p)?),
            None => None,
        };
        if init.is_none() {
            if kind == VariableDeclarationKind::Const {
                return Err(ParseError::at(
                    &declarator_pair,
                    "Missing initializer in const declaration",
                ));
            }
            if !matches!(id, PatternType::Identifier(_)) {
                return Err(ParseError::at(
                    &declarator_pair,
                    "Missing initializer in destructuring declaration",
                ));
            }
        }
        declarations.push(VariableDeclaratorData { id, init });
    }
    Ok(VariableDeclarationData { kind, declarations })
}

fn build_for_binding(pair: Pair<Rule>) -> BuildResult<ForBinding> {
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner)?;
    if first.as_rule() == Rule::var_kind {
        let kind = declaration_kind(&first);
        let target = build_binding_target(expect_next(&mut inner)?)?;
        Ok(ForBinding::Declaration(kind, target))
    } else {
        Ok(ForBinding::Identifier(first.as_str().to_string()))
    }
}

// ============================================================================
// Patterns and functions
// ============================================================================

fn build_binding_target(pair: Pair<Rule>) -> BuildResult<PatternType> {
    match pair.as_rule() {
        Rule::identifier => Ok(PatternType::Identifier(pair.as_str().to_string())),
        Rule::array_pattern => {
            let items: Vec<Pair<Rule>> = pair.into_inner().collect();
            let count = items.len();
            let mut elements = vec![];
            let mut rest = None;
            for (index, item) in items.into_iter().enumerate() {
                let is_last = index + 1 == count;
                match item.clone().into_inner().next() {
                    None => {
                        // A trailing comma does not add a hole.
                        if !is_last {
                            elements.push(None);
                        }
                    }
                    Some(p) if p.as_rule() == Rule::rest_element => {
                        if !is_last {
                            return Err(ParseError::at(&item, "Rest element must be last element"));
                        }
                        rest = Some(Box::new(build_binding_target(first_inner(p)?)?));
                    }
                    Some(p) => elements.push(Some(build_pattern_element(p)?)),
                }
            }
            Ok(PatternType::ArrayPattern { elements, rest })
        }
        Rule::object_pattern => {
            let mut properties = vec![];
            let mut rest = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::rest_element => {
                        rest = Some(Box::new(build_binding_target(first_inner(p)?)?));
                    }
                    Rule::keyed_pattern => {
                        let mut inner = p.into_inner();
                        let key = build_property_key(expect_next(&mut inner)?)?;
                        let value = build_pattern_element(expect_next(&mut inner)?)?;
                        properties.push(ObjectPatternProperty { key, value });
                    }
                    Rule::shorthand_pattern => {
                        let mut inner = p.into_inner();
                        let name = expect_next(&mut inner)?.as_str().to_string();
                        let default = match inner.next() {
                            Some(d) => Some(build_expression(d)?),
                            None => None,
                        };
                        properties.push(ObjectPatternProperty {
                            key: PropertyKey::Static(name.clone()),
                            value: PatternElement {
                                target: PatternType::Identifier(name),
                                default,
                            },
                        });
                    }
                    _ => return Err(ParseError::at(&p, "Unexpected token")),
                }
            }
            Ok(PatternType::ObjectPattern { properties, rest })
        }
        _ => Err(ParseError::at(&pair, "Invalid destructuring target")),
    }
}

fn build_pattern_element(pair: Pair<Rule>) -> BuildResult<PatternElement> {
    let mut inner = pair.into_inner();
    let target = build_binding_target(expect_next(&mut inner)?)?;
    let default = match inner.next() {
        Some(p) => Some(build_expression(p)?),
        None => None,
    };
    Ok(PatternElement { target, default })
}

fn build_formal_parameters(
    pair: Pair<Rule>,
) -> BuildResult<(Vec<PatternElement>, Option<PatternType>)> {
    let items: Vec<Pair<Rule>> = pair.into_inner().collect();
    let count = items.len();
    let mut params = vec![];
    let mut rest = None;
    for (index, p) in items.into_iter().enumerate() {
        if p.as_rule() == Rule::rest_element {
            if index + 1 != count {
                return Err(ParseError::at(&p, "Rest parameter must be last formal parameter"));
            }
            rest = Some(build_binding_target(first_inner(p)?)?);
        } else {
            params.push(build_pattern_element(p)?);
        }
    }
    Ok((params, rest))
}

fn build_function(pair: Pair<Rule>, is_declaration: bool) -> BuildResult<FunctionData> {
    let span = pair.as_span();
    let meta = Meta {
        start_index: span.start(),
        end_index: span.end(),
    };
    let source_text = span.as_str().to_string();
    let mut id = None;
    let mut params = vec![];
    let mut rest = None;
    let mut body = vec![];
    let mut is_async = false;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::async_marker => is_async = true,
            Rule::identifier => id = Some(p.as_str().to_string()),
            Rule::property_name => {
                if let PropertyKey::Static(name) = build_property_key(p)? {
                    id = Some(name);
                }
            }
            Rule::formal_parameters => {
                let (p_list, p_rest) = build_formal_parameters(p)?;
                params = p_list;
                rest = p_rest;
            }
            Rule::function_body => {
                let names = parameter_names(&params, &rest);
                body = build_statement_list(p.into_inner(), DeclarationScope::Function, &names)?;
            }
            _ => return Err(ParseError::at(&p, "Unexpected token")),
        }
    }
    let var_names = collect_var_names(&body);
    Ok(FunctionData {
        meta,
        id,
        params,
        rest,
        body: FunctionBodyOrExpression::FunctionBody(body),
        is_arrow: false,
        is_async,
        is_declaration,
        var_names,
        source_text,
    })
}

fn build_arrow_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let span = pair.as_span();
    let meta = Meta {
        start_index: span.start(),
        end_index: span.end(),
    };
    let source_text = span.as_str().to_string();
    let mut inner = pair.into_inner();
    let mut params_holder = expect_next(&mut inner)?;
    let is_async = params_holder.as_rule() == Rule::async_marker;
    if is_async {
        params_holder = expect_next(&mut inner)?;
    }
    let params_pair = first_inner(params_holder)?;
    let (params, rest) = if params_pair.as_rule() == Rule::identifier {
        (
            vec![PatternElement {
                target: PatternType::Identifier(params_pair.as_str().to_string()),
                default: None,
            }],
            None,
        )
    } else {
        build_formal_parameters(params_pair)?
    };
    let body_pair = expect_next(&mut inner)?;
    let (body, var_names) = if body_pair.as_rule() == Rule::function_body {
        let names = parameter_names(&params, &rest);
        let statements =
            build_statement_list(body_pair.into_inner(), DeclarationScope::Function, &names)?;
        let var_names = collect_var_names(&statements);
        (FunctionBodyOrExpression::FunctionBody(statements), var_names)
    } else {
        (
            FunctionBodyOrExpression::Expression(Box::new(build_expression(body_pair)?)),
            vec![],
        )
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        rest,
        body,
        is_arrow: true,
        is_async,
        is_declaration: false,
        var_names,
        source_text,
    })
}

fn parameter_names(params: &[PatternElement], rest: &Option<PatternType>) -> Vec<String> {
    let mut names: Vec<String> = params.iter().flat_map(|p| p.target.bound_names()).collect();
    if let Some(rest) = rest {
        names.extend(rest.bound_names());
    }
    names
}

fn build_property_key(pair: Pair<Rule>) -> BuildResult<PropertyKey> {
    let inner = first_inner(pair)?;
    Ok(match inner.as_rule() {
        Rule::identifier_name => PropertyKey::Static(inner.as_str().to_string()),
        Rule::string_literal => PropertyKey::Static(string_literal_value(inner)?),
        Rule::numeric_literal => {
            PropertyKey::Static(format_number(parse_numeric_literal(inner.as_str())))
        }
        Rule::computed_property_name => {
            PropertyKey::Computed(Box::new(build_expression(first_inner(inner)?)?))
        }
        _ => return Err(ParseError::at(&inner, "Unexpected token")),
    })
}

// ============================================================================
// Expressions
// ============================================================================

fn build_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    ensure_stack(|| build_expression_kind(pair))
}

fn build_expression_kind(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    Ok(match pair.as_rule() {
        Rule::expression => {
            let mut expressions = pair
                .into_inner()
                .map(build_expression)
                .collect::<BuildResult<Vec<_>>>()?;
            if expressions.len() == 1 {
                expressions.pop().ok_or_else(ParseError::malformed)?
            } else {
                ExpressionType::SequenceExpression(expressions)
            }
        }
        Rule::arrow_function => ExpressionType::FunctionExpression(Rc::new(build_arrow_function(pair)?)),
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_function(pair, false)?))
        }
        Rule::assignment => build_assignment(pair)?,
        Rule::conditional_expression => {
            let mut inner = pair.into_inner();
            let test = build_expression(expect_next(&mut inner)?)?;
            match inner.next() {
                Some(consequent) => ExpressionType::ConditionalExpression {
                    test: Box::new(test),
                    consequent: Box::new(build_expression(consequent)?),
                    alternate: Box::new(build_expression(expect_next(&mut inner)?)?),
                },
                None => test,
            }
        }
        Rule::nullish_expression
        | Rule::logical_or_expression
        | Rule::logical_and_expression
        | Rule::equality_expression
        | Rule::relational_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_binary_chain(pair)?,
        Rule::exponentiation_expression => {
            let mut inner = pair.into_inner();
            let base = build_expression(expect_next(&mut inner)?)?;
            match inner.next() {
                Some(_operator) => ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Exponent,
                    left: Box::new(base),
                    right: Box::new(build_expression(expect_next(&mut inner)?)?),
                },
                None => base,
            }
        }
        Rule::unary_expression => {
            let mut inner = pair.into_inner();
            let first = expect_next(&mut inner)?;
            if first.as_rule() == Rule::unary_operator {
                let argument = Box::new(build_expression(expect_next(&mut inner)?)?);
                let operator = match first.as_str() {
                    "-" => UnaryOperator::Minus,
                    "+" => UnaryOperator::Plus,
                    "!" => UnaryOperator::LogicalNot,
                    "typeof" => UnaryOperator::TypeOf,
                    "void" => UnaryOperator::Void,
                    "delete" => UnaryOperator::Delete,
                    "await" => return Ok(ExpressionType::AwaitExpression(argument)),
                    _ => return Err(ParseError::at(&first, "Unexpected token")),
                };
                ExpressionType::UnaryExpression { operator, argument }
            } else {
                build_expression(first)?
            }
        }
        Rule::update_expression => build_update_expression(pair)?,
        Rule::left_hand_side_expression => build_left_hand_side(pair)?,
        Rule::new_expression => {
            let mut inner = pair.into_inner();
            let callee = build_new_callee(expect_next(&mut inner)?)?;
            let arguments = match inner.next() {
                Some(args) => build_arguments(args)?,
                None => vec![],
            };
            ExpressionType::NewExpression {
                callee: Box::new(callee),
                arguments,
            }
        }
        Rule::parenthesized_expression => build_expression(first_inner(pair)?)?,
        Rule::this_exp => ExpressionType::ThisExpression,
        Rule::identifier => ExpressionType::Identifier(pair.as_str().to_string()),
        Rule::null_literal => ExpressionType::Literal(LiteralType::NullLiteral),
        Rule::boolean_literal => {
            ExpressionType::Literal(LiteralType::BooleanLiteral(pair.as_str() == "true"))
        }
        Rule::numeric_literal => ExpressionType::Literal(LiteralType::NumberLiteral(
            parse_numeric_literal(pair.as_str()),
        )),
        Rule::bigint_literal => {
            ExpressionType::Literal(LiteralType::BigIntLiteral(parse_bigint_literal(&pair)?))
        }
        Rule::string_literal => {
            ExpressionType::Literal(LiteralType::StringLiteral(string_literal_value(pair)?))
        }
        Rule::template_literal => {
            let mut quasis = vec![];
            let mut expressions = vec![];
            let mut current = String::new();
            for part in pair.into_inner() {
                if part.as_rule() == Rule::template_substitution {
                    quasis.push(std::mem::take(&mut current));
                    expressions.push(build_expression(first_inner(part)?)?);
                } else {
                    current.push_str(&unescape_string(part.as_str()));
                }
            }
            quasis.push(current);
            ExpressionType::TemplateLiteral {
                quasis,
                expressions,
            }
        }
        Rule::array_literal => {
            let items: Vec<Pair<Rule>> = pair.into_inner().collect();
            let count = items.len();
            let mut elements = vec![];
            for (index, item) in items.into_iter().enumerate() {
                match item.into_inner().next() {
                    None => {
                        if index + 1 != count {
                            elements.push(None);
                        }
                    }
                    Some(p) if p.as_rule() == Rule::spread_element => elements.push(Some(
                        ExpressionOrSpreadElement::SpreadElement(build_expression(first_inner(p)?)?),
                    )),
                    Some(p) => elements.push(Some(ExpressionOrSpreadElement::Expression(
                        build_expression(p)?,
                    ))),
                }
            }
            ExpressionType::ArrayExpression(elements)
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for p in pair.into_inner() {
                properties.push(match p.as_rule() {
                    Rule::spread_element => PropertyData::Spread(build_expression(first_inner(p)?)?),
                    Rule::shorthand_property => PropertyData::Shorthand(p.as_str().to_string()),
                    Rule::property_assignment => {
                        let mut inner = p.into_inner();
                        let key = build_property_key(expect_next(&mut inner)?)?;
                        let value = build_expression(expect_next(&mut inner)?)?;
                        PropertyData::KeyValue { key, value }
                    }
                    Rule::method_definition => {
                        let key_pair = p
                            .clone()
                            .into_inner()
                            .find(|c| c.as_rule() == Rule::property_name)
                            .ok_or_else(ParseError::malformed)?;
                        let key = build_property_key(key_pair)?;
                        PropertyData::Method {
                            key,
                            function: Rc::new(build_function(p, false)?),
                        }
                    }
                    _ => return Err(ParseError::at(&p, "Unexpected token")),
                });
            }
            ExpressionType::ObjectExpression(properties)
        }
        _ => return Err(ParseError::at(&pair, "Unexpected token")),
    })
}

fn build_binary_chain(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut inner = pair.into_inner();
    let mut left = build_expression(expect_next(&mut inner)?)?;
    while let Some(operator) = inner.next() {
        let right = Box::new(build_expression(expect_next(&mut inner)?)?);
        let left_box = Box::new(left);
        left = match operator.as_rule() {
            Rule::nullish_op => ExpressionType::LogicalExpression {
                operator: LogicalOperator::NullishCoalescing,
                left: left_box,
                right,
            },
            Rule::or_op => ExpressionType::LogicalExpression {
                operator: LogicalOperator::Or,
                left: left_box,
                right,
            },
            Rule::and_op => ExpressionType::LogicalExpression {
                operator: LogicalOperator::And,
                left: left_box,
                right,
            },
            _ => ExpressionType::BinaryExpression {
                operator: binary_operator(&operator)?,
                left: left_box,
                right,
            },
        };
    }
    Ok(left)
}

fn binary_operator(pair: &Pair<Rule>) -> BuildResult<BinaryOperator> {
    Ok(match pair.as_str() {
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        "in" => BinaryOperator::In,
        "instanceof" => BinaryOperator::InstanceOf,
        _ => return Err(ParseError::at(pair, "Unexpected token")),
    })
}

fn build_update_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span_pair = pair.clone();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner)?;
    let (operator_pair, argument, prefix) = if first.as_rule() == Rule::update_op {
        (Some(first), build_expression(expect_next(&mut inner)?)?, true)
    } else {
        (inner.next(), build_expression(first)?, false)
    };
    let operator_pair = match operator_pair {
        Some(op) => op,
        None => return Ok(argument),
    };
    if !matches!(
        argument,
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression { .. }
    ) {
        let position = if prefix { "prefix" } else { "postfix" };
        return Err(ParseError::at(
            &span_pair,
            format!("Invalid left-hand side expression in {} operation", position),
        ));
    }
    let operator = if operator_pair.as_str() == "++" {
        UpdateOperator::PlusPlus
    } else {
        UpdateOperator::MinusMinus
    };
    Ok(ExpressionType::UpdateExpression {
        operator,
        argument: Box::new(argument),
        prefix,
    })
}

fn build_member_suffix(
    object: ExpressionType,
    suffix: Pair<Rule>,
) -> BuildResult<(ExpressionType, bool)> {
    Ok(match suffix.as_rule() {
        Rule::arguments => (
            ExpressionType::CallExpression {
                callee: Box::new(object),
                arguments: build_arguments(suffix)?,
                optional: false,
            },
            false,
        ),
        Rule::optional_call => (
            ExpressionType::CallExpression {
                callee: Box::new(object),
                arguments: build_arguments(first_inner(suffix)?)?,
                optional: true,
            },
            true,
        ),
        Rule::dot_member | Rule::optional_member => {
            let optional = suffix.as_rule() == Rule::optional_member;
            (
                ExpressionType::MemberExpression {
                    object: Box::new(object),
                    property: MemberProperty::Static(first_inner(suffix)?.as_str().to_string()),
                    optional,
                },
                optional,
            )
        }
        Rule::computed_member | Rule::optional_computed => {
            let optional = suffix.as_rule() == Rule::optional_computed;
            (
                ExpressionType::MemberExpression {
                    object: Box::new(object),
                    property: MemberProperty::Computed(Box::new(build_expression(first_inner(
                        suffix,
                    )?)?)),
                    optional,
                },
                optional,
            )
        }
        _ => return Err(ParseError::at(&suffix, "Unexpected token")),
    })
}

fn build_left_hand_side(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut inner = pair.into_inner();
    let mut expression = build_expression(expect_next(&mut inner)?)?;
    let mut has_optional = false;
    for suffix in inner {
        let (next, optional) = build_member_suffix(expression, suffix)?;
        expression = next;
        has_optional |= optional;
    }
    Ok(if has_optional {
        ExpressionType::ChainExpression(Box::new(expression))
    } else {
        expression
    })
}

fn build_new_callee(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut inner = pair.into_inner();
    let mut expression = build_expression(expect_next(&mut inner)?)?;
    for suffix in inner {
        expression = build_member_suffix(expression, suffix)?.0;
    }
    Ok(expression)
}

fn build_arguments(pair: Pair<Rule>) -> BuildResult<Vec<ExpressionOrSpreadElement>> {
    pair.into_inner()
        .map(|p| {
            if p.as_rule() == Rule::spread_element {
                Ok(ExpressionOrSpreadElement::SpreadElement(build_expression(
                    first_inner(p)?,
                )?))
            } else {
                Ok(ExpressionOrSpreadElement::Expression(build_expression(p)?))
            }
        })
        .collect()
}

fn build_assignment(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut inner = pair.into_inner();
    let target_pair = expect_next(&mut inner)?;
    let operator_pair = expect_next(&mut inner)?;
    let right = Box::new(build_expression(expect_next(&mut inner)?)?);
    let operator = match operator_pair.as_str() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        "**=" => AssignmentOperator::ExponentEquals,
        "??=" => AssignmentOperator::NullishEquals,
        "||=" => AssignmentOperator::OrEquals,
        "&&=" => AssignmentOperator::AndEquals,
        _ => return Err(ParseError::at(&operator_pair, "Unexpected token")),
    };
    let left = match target_pair.as_rule() {
        Rule::array_pattern | Rule::object_pattern => {
            if operator != AssignmentOperator::Equals {
                return Err(ParseError::at(&target_pair, "Invalid left-hand side in assignment"));
            }
            AssignmentTarget::Pattern(build_binding_target(target_pair)?)
        }
        _ => build_simple_target(target_pair)?,
    };
    Ok(ExpressionType::AssignmentExpression {
        operator,
        left,
        right,
    })
}

fn build_simple_target(pair: Pair<Rule>) -> BuildResult<AssignmentTarget> {
    let span_pair = pair.clone();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner)?;
    let mut suffixes: Vec<Pair<Rule>> = inner.collect();
    let last = match suffixes.pop() {
        Some(last) => last,
        None => {
            return if first.as_rule() == Rule::identifier {
                Ok(AssignmentTarget::Identifier(first.as_str().to_string()))
            } else {
                Err(ParseError::at(&span_pair, "Invalid left-hand side in assignment"))
            };
        }
    };
    let mut object = build_expression(first)?;
    for suffix in suffixes {
        object = build_member_suffix(object, suffix)?.0;
    }
    let property = if last.as_rule() == Rule::dot_member {
        MemberProperty::Static(first_inner(last)?.as_str().to_string())
    } else {
        MemberProperty::Computed(Box::new(build_expression(first_inner(last)?)?))
    };
    Ok(AssignmentTarget::Member {
        object: Box::new(object),
        property,
    })
}

// ============================================================================
// Literal helpers
// ============================================================================

fn string_literal_value(pair: Pair<Rule>) -> BuildResult<String> {
    Ok(unescape_string(first_inner(pair)?.as_str()))
}

/// Value of a BigInt literal token (`10n`, `0xFFn`). Values beyond `i128` are rejected.
fn parse_bigint_literal(pair: &Pair<Rule>) -> BuildResult<i128> {
    let text = pair.as_str();
    let cleaned: String = text
        .strip_suffix('n')
        .unwrap_or(text)
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let (digits, radix) = match cleaned.get(..2) {
        Some("0x" | "0X") => (&cleaned[2..], 16),
        Some("0b" | "0B") => (&cleaned[2..], 2),
        Some("0o" | "0O") => (&cleaned[2..], 8),
        _ => (cleaned.as_str(), 10),
    };
    i128::from_str_radix(digits, radix)
        .map_err(|_| ParseError::at(pair, "Maximum BigInt size exceeded"))
}

/// Value of a numeric literal token (`0x1F`, `1_000`, `.5e3`, ...).
pub fn parse_numeric_literal(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let radix_digits = |prefixes: [&str; 2]| {
        prefixes
            .iter()
            .find_map(|prefix| cleaned.strip_prefix(prefix))
            .map(|digits| digits.to_string())
    };
    let fold_radix = |digits: &str, radix: u32| {
        digits.chars().fold(0f64, |acc, c| {
            acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
        })
    };
    if let Some(digits) = radix_digits(["0x", "0X"]) {
        fold_radix(&digits, 16)
    } else if let Some(digits) = radix_digits(["0b", "0B"]) {
        fold_radix(&digits, 2)
    } else if let Some(digits) = radix_digits(["0o", "0O"]) {
        fold_radix(&digits, 8)
    } else {
        cleaned.parse::<f64>().unwrap_or(f64::NAN)
    }
}
