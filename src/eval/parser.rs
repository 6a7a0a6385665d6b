use super::{
    EvalContext, EvalError, MAX_DEPTH, Value,
    lexer::{Spanned, Token},
};

/// Recursive descent evaluator over a token stream, producing values as it parses
pub struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    context: &'a EvalContext,
}

impl<'a> Parser<'a> {
    pub const fn new(tokens: &'a [Spanned], context: &'a EvalContext) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            context,
        }
    }

    /// Evaluates the whole token stream as one expression with an optional trailing `;`
    pub fn program(mut self) -> Result<Value, EvalError> {
        let value = self.expression()?;
        self.eat(';');
        match self.tokens.get(self.pos) {
            None => Ok(value),
            Some(t) => Err(unexpected(t)),
        }
    }

    fn expression(&mut self) -> Result<Value, EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        let value = self.additive();
        self.depth -= 1;
        value
    }

    fn additive(&mut self) -> Result<Value, EvalError> {
        let mut lhs = self.unary()?;
        while self.eat('+') {
            let rhs = self.unary()?;
            lhs = add(&lhs, &rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Value, EvalError> {
        if self.eat('-') {
            return Ok(Value::Number(-self.nested_unary()?.to_number()));
        }
        if self.eat('+') {
            return Ok(Value::Number(self.nested_unary()?.to_number()));
        }
        if self.eat('!') {
            return Ok(Value::Bool(!self.nested_unary()?.is_truthy()));
        }
        self.postfix()
    }

    fn nested_unary(&mut self) -> Result<Value, EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        let value = self.unary();
        self.depth -= 1;
        value
    }

    fn postfix(&mut self) -> Result<Value, EvalError> {
        let mut value = self.primary()?;
        loop {
            if self.eat('.') {
                let property = match self.next()? {
                    Spanned {
                        token: Token::Ident(name),
                        ..
                    } => name.clone(),
                    other => return Err(unexpected(other)),
                };
                value = member(&value, &property)?;
            } else if self.eat('[') {
                let key = self.expression()?;
                self.expect(']')?;
                value = member(&value, &key.to_js_string())?;
            } else {
                return Ok(value);
            }
        }
    }

    fn primary(&mut self) -> Result<Value, EvalError> {
        let spanned = self.next()?;
        match &spanned.token {
            Token::Str(s) => Ok(Value::String(s.clone())),
            Token::Num(n) => Ok(Value::Number(*n)),
            Token::Ident(name) => self.identifier(name),
            Token::Punct('(') => {
                let value = self.expression()?;
                self.expect(')')?;
                Ok(value)
            }
            Token::Punct('[') => self.array(),
            Token::Punct(_) => Err(unexpected(spanned)),
        }
    }

    fn array(&mut self) -> Result<Value, EvalError> {
        let mut items = Vec::new();
        loop {
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            // Elisions like `[1,,2]` leave holes
            if self.eat(',') {
                items.push(Value::Undefined);
                continue;
            }
            items.push(self.expression()?);
            if !self.eat(',') {
                self.expect(']')?;
                return Ok(Value::Array(items));
            }
        }
    }

    fn identifier(&self, name: &str) -> Result<Value, EvalError> {
        match name {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            "undefined" => Ok(Value::Undefined),
            "NaN" => Ok(Value::Number(f64::NAN)),
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            _ => self
                .context
                .global(name)
                .ok_or_else(|| EvalError::UndefinedIdentifier(name.to_string())),
        }
    }

    fn next(&mut self) -> Result<&'a Spanned, EvalError> {
        let tokens = self.tokens;
        let spanned = tokens.get(self.pos).ok_or(EvalError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(spanned)
    }

    fn eat(&mut self, punct: char) -> bool {
        let matched = self
            .tokens
            .get(self.pos)
            .is_some_and(|s| s.token == Token::Punct(punct));
        if matched {
            self.pos += 1;
        }
        matched
    }

    fn expect(&mut self, punct: char) -> Result<(), EvalError> {
        if self.eat(punct) {
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some(t) => Err(unexpected(t)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

fn unexpected(spanned: &Spanned) -> EvalError {
    EvalError::UnexpectedToken {
        token: spanned.token.to_string(),
        pos: spanned.pos,
    }
}

fn add(lhs: &Value, rhs: &Value) -> Value {
    let concatenates = |v: &Value| matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_));
    if concatenates(lhs) || concatenates(rhs) {
        return Value::String(lhs.to_js_string() + &rhs.to_js_string());
    }
    Value::Number(lhs.to_number() + rhs.to_number())
}

fn member(target: &Value, property: &str) -> Result<Value, EvalError> {
    match target {
        Value::Undefined | Value::Null => Err(EvalError::NullAccess {
            target: target.to_js_string(),
            property: property.to_string(),
        }),
        Value::String(s) if property == "length" => Ok(Value::Number(utf16_len(s))),
        Value::String(s) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(|i| s.encode_utf16().nth(i))
            .map_or(Value::Undefined, |unit| {
                Value::String(String::from_utf16_lossy(&[unit]))
            })),
        #[allow(clippy::cast_precision_loss)]
        Value::Array(items) if property == "length" => Ok(Value::Number(items.len() as f64)),
        Value::Array(items) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Undefined)),
        Value::Object(entries) => Ok(entries.get(property).cloned().unwrap_or(Value::Undefined)),
        Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
    }
}

#[allow(clippy::cast_precision_loss)]
fn utf16_len(s: &str) -> f64 {
    s.encode_utf16().count() as f64
}
