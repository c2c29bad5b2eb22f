// Conversions from decoded ABI tokens into concrete values.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};

use crate::infrastructure::contracts::types::ContractError;

fn mismatch(field: &str, expected: &str, token: &Token) -> ContractError {
    ContractError::DecodeError(format!("{}: expected {}, got {:?}", field, expected, token))
}

fn next(tokens: &mut impl Iterator<Item = Token>, field: &str) -> Result<Token, ContractError> {
    tokens
        .next()
        .ok_or_else(|| ContractError::DecodeError(format!("{}: missing value", field)))
}

pub fn into_uint(token: Token, field: &str) -> Result<U256, ContractError> {
    match token {
        Token::Uint(value) => Ok(value),
        other => Err(mismatch(field, "uint", &other)),
    }
}

pub fn into_address(token: Token, field: &str) -> Result<Address, ContractError> {
    match token {
        Token::Address(value) => Ok(value),
        other => Err(mismatch(field, "address", &other)),
    }
}

pub fn into_bool(token: Token, field: &str) -> Result<bool, ContractError> {
    match token {
        Token::Bool(value) => Ok(value),
        other => Err(mismatch(field, "bool", &other)),
    }
}

pub fn into_bytes(token: Token, field: &str) -> Result<Bytes, ContractError> {
    match token {
        Token::Bytes(value) => Ok(Bytes::from(value)),
        other => Err(mismatch(field, "bytes", &other)),
    }
}

pub fn into_bytes32(token: Token, field: &str) -> Result<H256, ContractError> {
    match token {
        Token::FixedBytes(value) if value.len() == 32 => Ok(H256::from_slice(&value)),
        other => Err(mismatch(field, "bytes32", &other)),
    }
}

pub fn into_bytes32_array(token: Token, field: &str) -> Result<Vec<H256>, ContractError> {
    match token {
        Token::Array(items) => items.into_iter().map(|item| into_bytes32(item, field)).collect(),
        other => Err(mismatch(field, "bytes32[]", &other)),
    }
}

pub fn next_uint(tokens: &mut impl Iterator<Item = Token>, field: &str) -> Result<U256, ContractError> {
    into_uint(next(tokens, field)?, field)
}

pub fn next_address(tokens: &mut impl Iterator<Item = Token>, field: &str) -> Result<Address, ContractError> {
    into_address(next(tokens, field)?, field)
}

pub fn next_bool(tokens: &mut impl Iterator<Item = Token>, field: &str) -> Result<bool, ContractError> {
    into_bool(next(tokens, field)?, field)
}

pub fn next_bytes(tokens: &mut impl Iterator<Item = Token>, field: &str) -> Result<Bytes, ContractError> {
    into_bytes(next(tokens, field)?, field)
}

/// The only output of a single-return method
pub fn single(tokens: Vec<Token>, method: &str) -> Result<Token, ContractError> {
    let mut tokens = tokens.into_iter();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Ok(token),
        _ => Err(ContractError::DecodeError(format!("{}: expected exactly one output", method))),
    }
}
