use super::FunctionTool;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    pub fn from_symbol(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" => Ok(Operator::Mul),
            "/" => Ok(Operator::Div),
            _ => Err(crate::string_error!("invalid operator: {}", s)),
        }
    }

    /// Apply the operator. Division truncates toward zero.
    pub fn apply(self, a: i64, b: i64) -> Result<i64> {
        match self {
            Operator::Add => a.checked_add(b).ok_or_else(|| crate::string_error!("integer overflow")),
            Operator::Sub => a.checked_sub(b).ok_or_else(|| crate::string_error!("integer overflow")),
            Operator::Mul => a.checked_mul(b).ok_or_else(|| crate::string_error!("integer overflow")),
            Operator::Div => {
                if b == 0 {
                    return Err(crate::string_error!("division by zero"));
                }
                a.checked_div(b).ok_or_else(|| crate::string_error!("integer overflow"))
            }
        }
    }
}

/// Calculator with positional arguments: {"a": .., "b": .., "operator": ".."}.
#[derive(Debug, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self { Self }
}

impl FunctionTool for CalculatorTool {
    fn name(&self) -> &str { "calculator" }

    fn description(&self) -> &str { "A simple calculator" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer", "description": "The first number" },
                "b": { "type": "integer", "description": "The second number" },
                "operator": { "type": "string", "enum": ["+","-","*","/"], "description": "The operator" }
            },
            "required": ["a","b","operator"],
            "additionalProperties": false
        })
    }

    fn call(&self, arguments: Value) -> Result<Value> {
        let a = arguments.get("a").and_then(|v| v.as_i64()).ok_or_else(|| crate::string_error!("missing integer 'a'"))?;
        let b = arguments.get("b").and_then(|v| v.as_i64()).ok_or_else(|| crate::string_error!("missing integer 'b'"))?;
        let op = arguments.get("operator").and_then(|v| v.as_str()).ok_or_else(|| crate::string_error!("missing string 'operator'"))?;

        let result = Operator::from_symbol(op)?.apply(a, b)?;
        Ok(json!(result))
    }
}

/// Input record for the nested-argument calculator variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorInput {
    pub a: i64,
    pub b: i64,
    pub operator: Operator,
}

/// Calculator taking a single structured argument: {"input": {"a": .., "b": .., "operator": ".."}}.
///
/// Produces the same results as [`CalculatorTool`] for equivalent field values.
#[derive(Debug, Default)]
pub struct NestedCalculatorTool;

impl NestedCalculatorTool {
    pub fn new() -> Self { Self }
}

impl FunctionTool for NestedCalculatorTool {
    fn name(&self) -> &str { "calculator" }

    fn description(&self) -> &str {
        "A calculator tool that accepts nested expression as input"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "object",
                    "description": "Input to the calculator",
                    "properties": {
                        "a": { "type": "integer", "description": "The first number" },
                        "b": { "type": "integer", "description": "The second number" },
                        "operator": { "type": "string", "enum": ["+","-","*","/"], "description": "The operator" }
                    },
                    "required": ["a","b","operator"]
                }
            },
            "required": ["input"],
            "additionalProperties": false
        })
    }

    fn call(&self, arguments: Value) -> Result<Value> {
        let input = arguments.get("input").ok_or_else(|| crate::string_error!("missing required parameter: input"))?;
        let input: CalculatorInput = serde_json::from_value(input.clone())?;

        let result = input.operator.apply(input.a, input.b)?;
        Ok(json!(result))
    }
}
