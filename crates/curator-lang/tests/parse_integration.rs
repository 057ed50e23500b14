use curator_lang::{
    parse, parse_postfix, tokenize, Expr, FunctionCall, QueryFunction, Span, Token,
};
use pretty_assertions::assert_eq;

const MIXED: &str = r#"name:M33 and pos:"12h 30m 49.32s +12d 23' 33.2''""#;

fn name(value: &str) -> Token {
    Token::Function(FunctionCall::new(QueryFunction::Name, value))
}

fn pos(value: &str) -> Token {
    Token::Function(FunctionCall::new(QueryFunction::Pos, value))
}

#[test]
fn tokenizes_name_and_quoted_position() {
    let tokens: Vec<Token> = tokenize(MIXED).unwrap().into_iter().map(|t| t.token).collect();
    assert_eq!(
        tokens,
        vec![name("M33"), Token::And, pos("12h 30m 49.32s +12d 23' 33.2''")]
    );
}

#[test]
fn postfix_places_operator_last() {
    let postfix: Vec<Token> = parse_postfix(MIXED)
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect();
    assert_eq!(
        postfix,
        vec![name("M33"), pos("12h 30m 49.32s +12d 23' 33.2''"), Token::And]
    );
}

#[test]
fn unclosed_paren_is_reported() {
    let err = parse_postfix("(name:M33").unwrap_err();
    assert_eq!(err.message, "unclosed '('");
    assert_eq!(err.span, Span::new(0, 1));
}

#[test]
fn closing_paren_first_fails_at_start() {
    let err = parse_postfix(")name:M33(").unwrap_err();
    assert_eq!(err.position(), 0);
    assert_eq!(err.message, "unmatched ')'");
}

#[test]
fn mixed_case_operators_and_nesting() {
    let expr = parse("(pgc:1 Or pgc:2) AND (name:\"NGC 598\" oR name:M33)").unwrap();
    assert_eq!(
        expr,
        Expr::and(
            Expr::or(
                Expr::function(QueryFunction::Pgc, "1"),
                Expr::function(QueryFunction::Pgc, "2"),
            ),
            Expr::or(
                Expr::function(QueryFunction::Name, "NGC 598"),
                Expr::function(QueryFunction::Name, "M33"),
            ),
        )
    );
}

#[test]
fn evaluation_against_an_object() {
    let expr = parse(MIXED).unwrap();
    let object_names = ["M33", "NGC 598", "Triangulum"];
    let matches_name = |function: QueryFunction, value: &str| match function {
        QueryFunction::Name => object_names.iter().any(|known| *known == value),
        QueryFunction::Pos => value.starts_with("12h"),
        QueryFunction::Pgc => false,
    };
    assert!(expr.evaluate(&matches_name));

    let expr = parse("pgc:5818 or name:Triangulum").unwrap();
    assert!(expr.evaluate(&matches_name));

    let expr = parse("pgc:5818 and name:Triangulum").unwrap();
    assert!(!expr.evaluate(&matches_name));
}

#[test]
fn errors_render_with_source_context() {
    let source = "name:M33 and dist:10";
    let err = parse(source).unwrap_err();
    assert_eq!(err.position(), 13);
    let rendered = err.render(source);
    assert!(rendered.contains("column 14"));
    assert!(rendered.contains("hint:"));
}
