//! A tiny evaluator for generated marshalling statements.
//!
//! It understands the statement shapes the marshallers emit: declarations with and
//! without an initializer, plain assignments, pointer declarations, reference aliases
//! (`T& d = *s;` and `var ref d = ref *s;`) and `fixed(..)` headers. Expressions are
//! integer arithmetic with `&name` and `*name`.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Ptr(String),
}

#[derive(Debug, Clone)]
enum Slot {
    Value(Value),
    Alias(String),
}

#[derive(Debug, Default)]
pub struct Machine {
    slots: HashMap<String, Slot>,
}

impl Machine {
    pub fn set(&mut self, name: &str, value: i64) {
        self.slots.insert(name.to_string(), Slot::Value(Value::Int(value)));
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.slots.get(&self.resolve(name))? {
            Slot::Value(value) => Some(value.clone()),
            Slot::Alias(_) => None,
        }
    }

    fn resolve(&self, name: &str) -> String {
        let mut current = name.to_string();
        for _ in 0..32 {
            match self.slots.get(&current) {
                Some(Slot::Alias(target)) => current = target.clone(),
                _ => break,
            }
        }
        current
    }

    pub fn run(&mut self, code: &str) {
        for line in code.lines() {
            self.exec(line.trim());
        }
    }

    fn exec(&mut self, line: &str) {
        if line.is_empty() || line == "{" || line == "}" {
            return;
        }
        let line = match line.strip_prefix("fixed(") {
            Some(inner) => inner.strip_suffix(')').expect("fixed header"),
            None => line.strip_suffix(';').expect("statement ends with ';'"),
        };

        match line.split_once(" = ") {
            Some((lhs, rhs)) => match lhs.trim().rsplit_once(' ') {
                Some((ty, name)) if ty.ends_with('&') || rhs.starts_with("ref ") => {
                    let src = rhs
                        .trim_start_matches("ref ")
                        .trim()
                        .strip_prefix('*')
                        .expect("alias of a dereference");
                    let Some(Value::Ptr(target)) = self.get(src) else {
                        panic!("'{src}' is not a pointer");
                    };
                    let target = self.resolve(&target);
                    if target != name {
                        self.slots.insert(name.to_string(), Slot::Alias(target));
                    }
                }
                Some((_, name)) => {
                    let value = self.eval(rhs);
                    self.slots.insert(name.to_string(), Slot::Value(value));
                }
                None => {
                    let target = self.resolve(lhs.trim());
                    let value = self.eval(rhs);
                    self.slots.insert(target, Slot::Value(value));
                }
            },
            None => {
                let (_, name) = line.rsplit_once(' ').expect("declaration");
                self.slots.insert(name.to_string(), Slot::Value(Value::Int(0)));
            }
        }
    }

    fn eval(&self, expr: &str) -> Value {
        let tokens = tokenize(expr);
        let mut pos = 0;
        let value = self.expr(&tokens, &mut pos);
        assert_eq!(pos, tokens.len(), "trailing tokens in '{expr}'");
        value
    }

    fn expr(&self, tokens: &[String], pos: &mut usize) -> Value {
        let mut acc = self.term(tokens, pos);
        while let Some(op) = tokens.get(*pos).filter(|t| *t == "+" || *t == "-") {
            *pos += 1;
            let rhs = int(self.term(tokens, pos));
            acc = Value::Int(if op == "+" { int(acc) + rhs } else { int(acc) - rhs });
        }
        acc
    }

    fn term(&self, tokens: &[String], pos: &mut usize) -> Value {
        let mut acc = self.unary(tokens, pos);
        while let Some(op) = tokens.get(*pos).filter(|t| *t == "*" || *t == "/") {
            *pos += 1;
            let rhs = int(self.unary(tokens, pos));
            acc = Value::Int(if op == "*" { int(acc) * rhs } else { int(acc) / rhs });
        }
        acc
    }

    fn unary(&self, tokens: &[String], pos: &mut usize) -> Value {
        match tokens.get(*pos).map(String::as_str) {
            Some("&") => {
                *pos += 1;
                let name = &tokens[*pos];
                *pos += 1;
                Value::Ptr(self.resolve(name))
            }
            Some("*") => {
                *pos += 1;
                match self.unary(tokens, pos) {
                    Value::Ptr(target) => self.get(&target).expect("dangling pointer"),
                    Value::Int(_) => panic!("dereference of an integer"),
                }
            }
            Some("-") => {
                *pos += 1;
                Value::Int(-int(self.unary(tokens, pos)))
            }
            _ => self.primary(tokens, pos),
        }
    }

    fn primary(&self, tokens: &[String], pos: &mut usize) -> Value {
        let token = &tokens[*pos];
        *pos += 1;
        if token == "(" {
            let value = self.expr(tokens, pos);
            assert_eq!(tokens[*pos], ")");
            *pos += 1;
            return value;
        }
        if let Ok(n) = token.parse::<i64>() {
            return Value::Int(n);
        }
        self.get(token)
            .unwrap_or_else(|| panic!("unknown variable '{token}'"))
    }
}

fn int(value: Value) -> i64 {
    match value {
        Value::Int(n) => n,
        Value::Ptr(p) => panic!("pointer to '{p}' used as integer"),
    }
}

fn tokenize(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphanumeric() || c == '_' {
            let mut word = String::new();
            while let Some(&c) = chars.peek().filter(|c| c.is_ascii_alphanumeric() || **c == '_') {
                word.push(c);
                chars.next();
            }
            tokens.push(word);
        } else {
            tokens.push(c.to_string());
            chars.next();
        }
    }
    tokens
}

#[test]
fn evaluates_arithmetic_and_pointers() {
    let mut m = Machine::default();
    m.set("x", 5);
    m.run("int a = (x + 3) * 2;\nint* p = &a;\nint32& r = *p;\nr = r - 1;\nint b;\n");
    assert_eq!(m.get("a"), Some(Value::Int(15)));
    assert_eq!(m.get("r"), Some(Value::Int(15)));
    assert_eq!(m.get("b"), Some(Value::Int(0)));
}
