use ethers::abi::{Abi, Event, Function, ParamType, StateMutability, Token};
use ethers::types::{Bytes, U256};

use crate::infrastructure::contracts::types::ContractError;

/// A contract interface validated once, at construction.
///
/// All encoding and decoding goes through here, so callers never handle raw
/// ABI bytes themselves.
#[derive(Debug, Clone)]
pub struct ContractSchema {
    name: String,
    abi: Abi,
}

impl ContractSchema {
    /// Parses a JSON ABI and checks every method in `required` is declared.
    pub fn from_json(name: &str, json: &str, required: &[&str]) -> Result<Self, ContractError> {
        let abi: Abi = serde_json::from_str(json)
            .map_err(|e| ContractError::AbiError(format!("Failed to parse ABI for {}: {}", name, e)))?;
        Self::from_abi(name, abi, required)
    }

    pub fn from_abi(name: &str, abi: Abi, required: &[&str]) -> Result<Self, ContractError> {
        for method in required {
            if abi.function(method).is_err() {
                return Err(ContractError::InvalidMethod(format!(
                    "{} schema does not declare {}",
                    name, method
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            abi,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn function(&self, method: &str) -> Result<&Function, ContractError> {
        self.abi
            .function(method)
            .map_err(|_| ContractError::InvalidMethod(format!("{}.{} is not declared", self.name, method)))
    }

    pub fn event(&self, event: &str) -> Result<&Event, ContractError> {
        self.abi
            .event(event)
            .map_err(|_| ContractError::InvalidMethod(format!("{}.{} is not a declared event", self.name, event)))
    }

    pub fn is_read_only(function: &Function) -> bool {
        matches!(function.state_mutability, StateMutability::View | StateMutability::Pure)
    }

    /// Selector plus ABI-encoded arguments. Pure: same inputs, same bytes.
    pub fn encode_call_data(&self, method: &str, args: &[Token]) -> Result<Bytes, ContractError> {
        let function = self.function(method)?;
        let expected: Vec<_> = function.inputs.iter().map(|p| p.kind.clone()).collect();

        if !Token::types_check(args, &expected) {
            return Err(ContractError::EncodeError(format!(
                "{}.{} expects ({}), got {} argument(s) of a different shape",
                self.name,
                method,
                expected.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(","),
                args.len()
            )));
        }

        for (index, (arg, param)) in args.iter().zip(&function.inputs).enumerate() {
            let field = if param.name.is_empty() {
                format!("arg{}", index)
            } else {
                param.name.clone()
            };
            check_width(arg, &param.kind, &field)
                .map_err(|e| ContractError::EncodeError(format!("{}.{}: {}", self.name, method, e)))?;
        }

        function
            .encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ContractError::EncodeError(e.to_string()))
    }

    /// Inverse of `encode_call_data`; the selector must match `method`.
    pub fn decode_call_data(&self, method: &str, data: &[u8]) -> Result<Vec<Token>, ContractError> {
        let function = self.function(method)?;
        if data.len() < 4 || data[..4] != function.short_signature() {
            return Err(ContractError::DecodeError(format!(
                "Calldata does not start with the {}.{} selector",
                self.name, method
            )));
        }

        function
            .decode_input(&data[4..])
            .map_err(|e| ContractError::DecodeError(e.to_string()))
    }

    pub fn decode_output(&self, method: &str, data: &[u8]) -> Result<Vec<Token>, ContractError> {
        self.function(method)?
            .decode_output(data)
            .map_err(|e| ContractError::DecodeError(format!("{}.{}: {}", self.name, method, e)))
    }
}

/// Sized integers must fit their declared width; `types_check` only compares
/// token kinds.
fn check_width(token: &Token, kind: &ParamType, field: &str) -> Result<(), String> {
    match (token, kind) {
        (Token::Uint(value), ParamType::Uint(bits)) if *bits < 256 => {
            if value.bits() > *bits {
                return Err(format!("{} = {} does not fit uint{}", field, value, bits));
            }
            Ok(())
        }
        (Token::Int(value), ParamType::Int(bits)) if *bits > 0 && *bits < 256 => {
            // Two's complement: everything above the sign bit repeats it
            let high = *value >> (*bits - 1);
            if !high.is_zero() && high != U256::MAX >> (*bits - 1) {
                return Err(format!("{} does not fit int{}", field, bits));
            }
            Ok(())
        }
        (Token::Tuple(items), ParamType::Tuple(kinds)) => items
            .iter()
            .zip(kinds)
            .enumerate()
            .try_for_each(|(i, (item, kind))| check_width(item, kind, &format!("{}.{}", field, i))),
        (Token::Array(items), ParamType::Array(inner)) | (Token::FixedArray(items), ParamType::FixedArray(inner, _)) => {
            items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| check_width(item, inner, &format!("{}[{}]", field, i)))
        }
        _ => Ok(()),
    }
}
