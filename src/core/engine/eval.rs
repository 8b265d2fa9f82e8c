//! The expression evaluator.
//!
//! Evaluation is textual rewriting: each pass finds the innermost
//! parenthesized group, applies its highest-precedence operator to the two
//! neighbouring atoms and splices the result literal back into the text.
//! The loop ends when no operator or parenthesis is left.

use fxhash::FxHashMap;

use super::ops;
use super::parse::classify_literal;
use super::value::{quote_str, EvalError, EvalResult, Expression, SourceSpan, Value};
use crate::core::syntax::bracket::{BracketTree, Entry};
use crate::core::syntax::lexer::{fold_unary_minus, tokenize, unrecognized_symbols};
use crate::core::syntax::token::{
    boolean_literal, Bracket, Delimiter, Operator, Symbol, Token, TokenKind,
};
use crate::core::syntax::utils::group_quotes;

/// Maximum number of reduction passes (runaway protection).
const MAX_PASSES: usize = 10_000;

/// Configuration shared by the parser and the evaluator.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// If false, operator chains over unknown identifiers fail with
    /// `UnrecognizedSymbols` instead of becoming expression values.
    pub allow_expressions: bool,
    /// Maximum reduction passes for a single evaluation.
    pub max_passes: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            allow_expressions: true,
            max_passes: MAX_PASSES,
        }
    }
}

impl EvalConfig {
    /// Reject identifiers: every operator chain must reduce to a literal.
    pub fn strict() -> Self {
        Self {
            allow_expressions: false,
            ..Default::default()
        }
    }

    /// Keep identifier chains as unevaluated expressions.
    pub fn lenient() -> Self {
        Self {
            allow_expressions: true,
            ..Default::default()
        }
    }
}

/// Reduces operator text to a single literal.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate `text` to the text of a single literal.
    pub fn evaluate(&self, text: &str) -> EvalResult<String> {
        let atoms = preprocess(text)?;
        if atoms.is_empty() {
            return Err(EvalError::parse("empty expression"));
        }
        let mut working = join_atoms(&atoms);
        let mut passes = 0usize;

        loop {
            let tokens = spaced(atoms_of(&working));
            if !needs_reduction(&tokens) {
                return finish(tokens, &working);
            }

            passes += 1;
            if passes > self.config.max_passes {
                return Err(EvalError::non_convergence(working));
            }

            let next = reduce_once(tokens)?;
            log::trace!("pass {}: `{}` -> `{}`", passes, working, next);
            if next == working {
                return Err(EvalError::non_convergence(working));
            }
            working = next;
        }
    }

    /// Evaluate `text` and classify the resulting literal.
    pub fn evaluate_value(&self, text: &str) -> EvalResult<Value> {
        self.evaluate(text).map(|literal| classify_literal(&literal))
    }
}

/// Evaluate with the default configuration.
pub fn evaluate(text: &str) -> EvalResult<String> {
    Evaluator::new().evaluate(text)
}

/// Evaluate with the default configuration and classify the result.
pub fn evaluate_value(text: &str) -> EvalResult<Value> {
    Evaluator::new().evaluate_value(text)
}

// ============================================================================
// Preprocessing
// ============================================================================

/// Non-space atoms of `text`: quoted runs grouped, unary minus fused,
/// boolean spellings normalized and `!` folded into following booleans.
fn atoms_of(text: &str) -> Vec<Token> {
    let atoms: Vec<Token> = group_quotes(tokenize(text))
        .into_iter()
        .filter(|t| !t.is_space())
        .collect();
    fold_negations(normalize_booleans(fold_unary_minus(atoms)))
}

/// Atoms separated by single spaces, so rebuilding never glues two atoms.
fn spaced(atoms: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(atoms.len() * 2);
    for (i, atom) in atoms.into_iter().enumerate() {
        if i > 0 {
            out.push(Token::symbol(Symbol::Space, " ", atom.offset));
        }
        out.push(atom);
    }
    out
}

fn join_atoms(atoms: &[Token]) -> String {
    atoms
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn preprocess(text: &str) -> EvalResult<Vec<Token>> {
    let atoms = insert_implicit_products(atoms_of(text));
    check_atoms(&atoms)?;
    Ok(atoms)
}

fn normalize_booleans(atoms: Vec<Token>) -> Vec<Token> {
    atoms
        .into_iter()
        .map(|t| match (t.is_span() && !t.is_quoted(), boolean_literal(&t.text)) {
            (true, Some(b)) => Token::span(b.to_string(), t.offset),
            _ => t,
        })
        .collect()
}

/// Apply `!` to a directly following boolean, right to left so `!!true`
/// folds completely.
fn fold_negations(atoms: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(atoms.len());
    for token in atoms.into_iter().rev() {
        let operand = out
            .last()
            .filter(|t| t.is_span())
            .and_then(|t| boolean_literal(&t.text));
        match (token.operator(), operand) {
            (Some(Operator::Not), Some(b)) => {
                out.pop();
                out.push(Token::span((!b).to_string(), token.offset));
            }
            _ => out.push(token),
        }
    }
    out.reverse();
    out
}

fn insert_implicit_products(atoms: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(atoms.len());
    for token in atoms {
        if let Some(prev) = out.last() {
            let prev_closes = prev.is_close(Delimiter::Paren);
            let juxtaposed = (token.is_open(Delimiter::Paren) && (prev.is_number() || prev_closes))
                || (token.is_number() && prev_closes);
            if juxtaposed {
                out.push(Token::symbol(
                    Symbol::Operator(Operator::Mul),
                    "*",
                    token.offset,
                ));
            }
        }
        out.push(token);
    }
    out
}

fn check_atoms(atoms: &[Token]) -> EvalResult<()> {
    let unknown = unrecognized_symbols(atoms);
    if !unknown.is_empty() {
        return Err(EvalError::unrecognized(unknown));
    }
    for token in atoms {
        let allowed = match token.kind {
            TokenKind::Span => true,
            TokenKind::Symbol(Symbol::Operator(_)) | TokenKind::Symbol(Symbol::Null) => true,
            TokenKind::Symbol(Symbol::Bracket(b)) => b.delimiter() == Delimiter::Paren,
            _ => false,
        };
        if !allowed {
            return Err(EvalError::parse(format!("unexpected `{}` in expression", token.text))
                .with_span(SourceSpan::new(token.offset, token.offset + token.text.len())));
        }
    }
    Ok(())
}

// ============================================================================
// Reduction
// ============================================================================

fn needs_reduction(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| {
        t.is_operator() || matches!(t.bracket(), Some(Bracket::Open(_)) | Some(Bracket::Close(_)))
    })
}

fn finish(tokens: Vec<Token>, working: &str) -> EvalResult<String> {
    let atoms: Vec<&Token> = tokens.iter().filter(|t| !t.is_space()).collect();
    match atoms.as_slice() {
        [single] => Ok(single.text.clone()),
        [] => Err(EvalError::parse("empty expression")),
        _ => Err(EvalError::parse(format!(
            "no operator between the atoms of `{}`",
            working
        ))),
    }
}

/// Index of the operator to apply: the leftmost of the tightest tier.
fn select_operator(atoms: &[&Token]) -> Option<(usize, Operator)> {
    (1..=4).find_map(|tier| {
        atoms.iter().enumerate().find_map(|(i, t)| match t.operator() {
            Some(op) if op.tier() == tier => Some((i, op)),
            _ => None,
        })
    })
}

fn operand<'a>(atoms: &[&'a Token], index: Option<usize>) -> Option<&'a Token> {
    index
        .and_then(|i| atoms.get(i))
        .copied()
        .filter(|t| !t.is_operator())
}

/// Literal text for a result, strings re-quoted. A string holding both
/// quote characters has no literal form.
fn literal_text(value: &Value) -> EvalResult<String> {
    match value {
        Value::Str(s) if s.contains('"') && s.contains('\'') => Err(EvalError::wrong_execution(
            "String without both quote characters",
            format!("`{}`", s),
        )),
        Value::Str(s) => Ok(quote_str(s)),
        other => Ok(other.to_notation()),
    }
}

fn reduce_once(tokens: Vec<Token>) -> EvalResult<String> {
    let tree = BracketTree::parentheses(tokens);
    if let Some(mismatch) = tree.error() {
        return Err(EvalError::parse(mismatch.description.clone())
            .with_span(SourceSpan::at(mismatch.offset)));
    }

    let Some(&leaf_id) = tree.top_leaves().first() else {
        return Err(EvalError::parse("nothing to evaluate"));
    };
    let leaf = tree.leaf(leaf_id);
    let atoms: Vec<&Token> = leaf
        .entries
        .iter()
        .filter_map(Entry::token)
        .filter(|t| !t.is_space())
        .collect();

    if !leaf.is_root() {
        match atoms.as_slice() {
            [] => return Err(EvalError::missing_operand("()")),
            [single] if !single.is_operator() => {
                return Ok(tree.rebuild_with(leaf_id, &single.text));
            }
            _ => {}
        }
    }

    let Some((at, op)) = select_operator(&atoms) else {
        return Err(EvalError::parse(format!(
            "no operator between the atoms of `{}`",
            tree.rebuild_string(leaf_id)
        )));
    };

    let rhs = operand(&atoms, Some(at + 1))
        .ok_or_else(|| EvalError::missing_operand(op.as_str()))?;
    let (start, result) = if op.is_prefix() {
        (at, ops::not(&classify_literal(&rhs.text))?)
    } else {
        let lhs = operand(&atoms, at.checked_sub(1))
            .ok_or_else(|| EvalError::missing_operand(op.as_str()))?;
        let result = ops::binary(op, &classify_literal(&lhs.text), &classify_literal(&rhs.text))?;
        (at - 1, result)
    };

    let literal = literal_text(&result)?;
    let mut payload: Vec<&str> = atoms[..start].iter().map(|t| t.text.as_str()).collect();
    payload.push(&literal);
    payload.extend(atoms[at + 2..].iter().map(|t| t.text.as_str()));
    let payload = payload.join(" ");

    if leaf.is_root() {
        Ok(payload)
    } else {
        Ok(tree.rebuild_with(leaf_id, &format!("({})", payload)))
    }
}

// ============================================================================
// Expressions
// ============================================================================

impl Expression {
    /// Substitute the assigned variables and evaluate.
    pub fn evaluate(&self) -> EvalResult<Value> {
        self.evaluate_with(&Evaluator::new())
    }

    pub fn evaluate_with(&self, evaluator: &Evaluator) -> EvalResult<Value> {
        let substituted = self.substitute()?;
        let remaining = unrecognized_symbols(&tokenize(&substituted));
        if let Some(name) = remaining.into_iter().next() {
            return Err(EvalError::unassigned(name));
        }
        log::debug!("expression `{}` -> `{}`", self.text(), substituted);
        evaluator.evaluate_value(&substituted)
    }

    /// The expression text with every assigned variable replaced by its
    /// notation. Quoted text is left alone.
    fn substitute(&self) -> EvalResult<String> {
        let mut out = String::with_capacity(self.text().len());
        let mut literals: FxHashMap<String, String> = FxHashMap::default();
        let mut quote: Option<Delimiter> = None;

        for token in tokenize(self.text()) {
            if let Some(Bracket::Quote(d)) = token.bracket() {
                quote = match quote {
                    Some(open) if open == d => None,
                    None => Some(d),
                    still_open => still_open,
                };
            }
            let bound = match quote {
                None if token.is_word() => self.variables().get(&token.text),
                _ => None,
            };
            match bound {
                Some(value) if !value.is_scalar() => {
                    return Err(EvalError::wrong_input(
                        "Null, Boolean, number or String",
                        value.type_name(),
                    ));
                }
                Some(value) => {
                    if !literals.contains_key(&token.text) {
                        literals.insert(token.text.clone(), literal_text(value)?);
                    }
                    out.push_str(&literals[&token.text]);
                }
                None => out.push_str(&token.text),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::value::EvalErrorKind;

    fn eval(text: &str) -> String {
        evaluate(text).unwrap()
    }

    fn eval_err(text: &str) -> EvalErrorKind {
        evaluate(text).unwrap_err().kind
    }

    #[test]
    fn test_precedence_tiers() {
        assert_eq!(eval("5 + 3 * 2"), "11");
        assert_eq!(eval("2 * 3 ^ 2"), "18");
        assert_eq!(eval("10 - 4 - 3"), "3");
        assert_eq!(eval("7 % 4 * 2"), "6");
        assert_eq!(eval("1 + 2 < 4"), "true");
    }

    #[test]
    fn test_parentheses_group_first() {
        assert_eq!(eval("(5 + 3) * 2"), "16");
        assert_eq!(eval("((2))"), "2");
        assert_eq!(eval("2 * (3 + (4 - 1))"), "12");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(eval("2(3 + 1)"), "8");
        assert_eq!(eval("(1 + 1)(2 + 2)"), "8");
        assert_eq!(eval("(2 + 1)4"), "12");
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-5 + 2"), "-3");
        assert_eq!(eval("5 - -2"), "7");
        assert_eq!(eval("3 * -(2)"), "-6");
        assert_eq!(eval("2 * - 3"), "-6");
        assert_eq!(eval("- -2"), "2");
        assert_eq!(eval("--2 + 1"), "3");
        assert_eq!(eval("1 - - - 2"), "-1");
    }

    #[test]
    fn test_division_widths() {
        assert_eq!(eval("7 / 2"), "3.5");
        assert_eq!(eval("8 / 2"), "4");
        assert_eq!(eval_err("10 / 0"), EvalErrorKind::DivisionByZero);
        assert_eq!(eval_err("1 % 0"), EvalErrorKind::DivisionByZero);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(eval("!true"), "false");
        assert_eq!(eval("!!yes"), "true");
        assert_eq!(eval("true && !(1 > 2)"), "true");
        assert_eq!(eval("No || False"), "false");
        assert_eq!(eval("1 < 2 == true"), "true");
    }

    #[test]
    fn test_strings() {
        assert_eq!(eval("\"ab\" + \"cd\""), "\"abcd\"");
        assert_eq!(eval("'n' + 1"), "\"n1\"");
        assert_eq!(eval("\"a + b\""), "\"a + b\"");
        assert_eq!(eval("\"abc\" < \"abd\""), "true");
        assert_eq!(eval("'say \"' + \"hi\""), "'say \"hi'");
        assert!(matches!(
            eval_err("'a\"' + \"'b\""),
            EvalErrorKind::WrongExecutionType { .. }
        ));
    }

    #[test]
    fn test_non_finite_results_fail() {
        assert_eq!(eval_err("1e308 * 10"), EvalErrorKind::NonFiniteResult);
        assert_eq!(eval_err("1e308 * 10 + 1"), EvalErrorKind::NonFiniteResult);
        assert_eq!(eval_err("(0 - 1) ^ 0.5"), EvalErrorKind::NonFiniteResult);
    }

    #[test]
    fn test_failures() {
        assert_eq!(eval_err("5 +"), EvalErrorKind::MissingOperand("+".to_string()));
        assert_eq!(eval_err("* 2"), EvalErrorKind::MissingOperand("*".to_string()));
        assert_eq!(eval_err("()"), EvalErrorKind::MissingOperand("()".to_string()));
        assert!(matches!(eval_err("1 2 + 3"), EvalErrorKind::ParseError(_)));
        assert!(matches!(eval_err("[1] + 2"), EvalErrorKind::ParseError(_)));
        assert!(matches!(eval_err("(1 + 2"), EvalErrorKind::ParseError(_)));
        assert_eq!(
            eval_err("x + 1"),
            EvalErrorKind::UnrecognizedSymbols(vec!["x".to_string()])
        );
        assert!(matches!(eval_err("true + 1"), EvalErrorKind::WrongInputType { .. }));
    }

    #[test]
    fn test_pass_limit() {
        let evaluator = Evaluator::with_config(EvalConfig {
            max_passes: 1,
            ..Default::default()
        });
        assert_eq!(evaluator.evaluate("1 + 1").unwrap(), "2");
        assert!(matches!(
            evaluator.evaluate("1 + 1 + 1").unwrap_err().kind,
            EvalErrorKind::NonConvergence(_)
        ));
    }

    #[test]
    fn test_expression_evaluation() {
        let mut expr = Expression::new("temp.a + temp.b * 2", ["temp.a", "temp.b"]);
        assert_eq!(
            expr.evaluate().unwrap_err().kind,
            EvalErrorKind::UnassignedVariable("temp.a".to_string())
        );

        expr.assign("temp.a", Value::from(1i8)).unwrap();
        expr.assign("temp.b", Value::from(-3i8)).unwrap();
        assert_eq!(expr.evaluate().unwrap(), Value::from(-5i8));

        expr.assign("temp.b", Value::from("x")).unwrap();
        assert_eq!(expr.evaluate().unwrap_err().kind, EvalErrorKind::WrongInputType {
            expected: "number".to_string(),
            got: "String and Byte".to_string(),
        });

        let mut greeting = Expression::new("name + ' says name'", ["name"]);
        greeting.assign("name", Value::from("bob")).unwrap();
        assert_eq!(greeting.evaluate().unwrap(), Value::from("bob says name"));
    }
}
