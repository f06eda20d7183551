extern crate rlox_lang;

use rlox_lang::token::{Token, Type};

#[test]
fn create_token() {
    let token = Token::new(
        Type::LeftParen,
        "(".to_string(),
        None,
        1,
    );

    assert_eq!(token.r#type, Type::LeftParen);
    assert_eq!(token.lexeme, "(");
    assert_eq!(token.literal, None);
    assert_eq!(token.line, 1);
}

#[test]
fn create_token_from_str() {
    let token = Token::from("init");

    assert_eq!(token.r#type, Type::Identifier);
    assert_eq!(token.lexeme, "init");
    assert_eq!(token.literal, None);
    assert_eq!(token.line, 0);
}

#[test]
fn display_token() {
    let token = Token::new(
        Type::LeftParen,
        "(".to_string(),
        None,
        3,
    );

    assert_eq!(format!("{}", token), "LeftParen ( None @ 3");
}
