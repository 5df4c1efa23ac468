//! Parser for the surface-algebra expression language.
//!
//! Expressions reference surfaces by signed number, combine them by
//! juxtaposition (intersection) and `:` (union), group with parentheses,
//! and complement with `#`: `#n` complements a named object, `#(...)`
//! complements a whole group.
//!
//! Parsing is two-stage: a tokenizer producing a flat token stream, then
//! an innermost-bracket reducer that repeatedly combines adjacent rule
//! nodes pairwise. Union binds wherever a `:` appears between the two
//! nodes being combined; otherwise the pair intersects. Combination is
//! strictly left-to-right, so there is no operator precedence beyond
//! bracketing.

use crate::error::{CsgError, Result};
use crate::rule::Rule;

#[derive(Debug)]
enum Item {
    Node(Rule),
    Colon,
    Open,
    Close,
    Comp,
}

fn tokenize(expr: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                items.push(Item::Open);
            }
            ')' => {
                chars.next();
                items.push(Item::Close);
            }
            ':' => {
                chars.next();
                items.push(Item::Colon);
            }
            '#' => {
                chars.next();
                // `#` adjacent to a number complements that object;
                // anything else leaves a group-complement marker.
                if chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    let key = read_number(&mut chars)?;
                    items.push(Item::Node(Rule::comp_obj(key)));
                } else {
                    items.push(Item::Comp);
                }
            }
            '-' | '+' => {
                let sign: i8 = if c == '-' { -1 } else { 1 };
                chars.next();
                if !chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    return Err(CsgError::MalformedExpression(format!(
                        "dangling sign '{c}'"
                    )));
                }
                let key = read_number(&mut chars)?;
                items.push(Item::Node(Rule::surf(key, sign)));
            }
            d if d.is_ascii_digit() => {
                let key = read_number(&mut chars)?;
                items.push(Item::Node(Rule::surf(key, 1)));
            }
            other => {
                return Err(CsgError::MalformedExpression(format!(
                    "unexpected character '{other}'"
                )));
            }
        }
    }
    Ok(items)
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<i32> {
    let mut digits = String::new();
    while let Some(&d) = chars.peek() {
        if d.is_ascii_digit() {
            digits.push(d);
            chars.next();
        } else {
            break;
        }
    }
    digits
        .parse::<i32>()
        .map_err(|_| CsgError::MalformedExpression(format!("bad surface number '{digits}'")))
}

/// Repeatedly combine adjacent rule nodes left-to-right within a
/// bracket-free span. Union wins if any `:` separates the pair.
fn reduce_pairs(mut items: Vec<Item>) -> Result<Vec<Item>> {
    loop {
        let Some(i) = items.iter().position(|it| matches!(it, Item::Node(_))) else {
            break;
        };
        let Some(j) = items[i + 1..]
            .iter()
            .position(|it| matches!(it, Item::Node(_)))
            .map(|k| k + i + 1)
        else {
            break;
        };
        if items[i + 1..j].iter().any(|it| matches!(it, Item::Comp)) {
            return Err(CsgError::MalformedExpression(
                "stray '#' between operands".to_string(),
            ));
        }
        let union = items[i + 1..j].iter().any(|it| matches!(it, Item::Colon));
        let Item::Node(b) = items.remove(j) else {
            unreachable!()
        };
        let Item::Node(a) = std::mem::replace(&mut items[i], Item::Colon) else {
            unreachable!()
        };
        let combined = if union {
            Rule::Union(Box::new(a), Box::new(b))
        } else {
            Rule::Intersection(Box::new(a), Box::new(b))
        };
        // Drop the separators the pair consumed
        items.drain(i..j);
        items.insert(i, Item::Node(combined));
    }
    Ok(items)
}

/// Parse an algebra expression into a rule tree.
///
/// Fails with [`CsgError::MalformedExpression`] when a bracket is
/// unmatched, a token is unparseable, or the expression does not reduce
/// to exactly one rule.
pub fn parse_expression(expr: &str) -> Result<Rule> {
    let mut items = tokenize(expr)?;

    // Reduce innermost brackets first: find the first `)`, match it to
    // the nearest `(` before it, reduce the span between them, then
    // splice the result back (wrapping in a complement group when the
    // bracket is preceded by `#`).
    while let Some(close) = items.iter().position(|it| matches!(it, Item::Close)) {
        let Some(open) = items[..close]
            .iter()
            .rposition(|it| matches!(it, Item::Open))
        else {
            return Err(CsgError::MalformedExpression(format!(
                "unmatched ')' in '{expr}'"
            )));
        };
        let inner: Vec<Item> = items.drain(open..=close).skip(1).collect();
        let inner = {
            let mut v = inner;
            v.pop(); // trailing Close
            reduce_pairs(v)?
        };
        let complemented = open > 0 && matches!(items[open - 1], Item::Comp);
        if complemented {
            let mut inner = inner;
            if inner.len() != 1 || !matches!(inner[0], Item::Node(_)) {
                return Err(CsgError::MalformedExpression(format!(
                    "complement of unreducible group in '{expr}'"
                )));
            }
            let Some(Item::Node(node)) = inner.pop() else {
                unreachable!()
            };
            items[open - 1] = Item::Node(Rule::CompGrp(Box::new(node)));
        } else {
            let mut at = open;
            for it in inner {
                items.insert(at, it);
                at += 1;
            }
        }
    }
    if items.iter().any(|it| matches!(it, Item::Open)) {
        return Err(CsgError::MalformedExpression(format!(
            "unmatched '(' in '{expr}'"
        )));
    }

    let mut items = reduce_pairs(items)?;
    let nodes = items
        .iter()
        .filter(|it| matches!(it, Item::Node(_)))
        .count();
    if nodes != 1 {
        return Err(CsgError::MalformedExpression(format!(
            "expression '{expr}' reduces to {nodes} rules, expected 1"
        )));
    }
    if items
        .iter()
        .any(|it| matches!(it, Item::Comp | Item::Colon))
    {
        return Err(CsgError::MalformedExpression(format!(
            "dangling operator in '{expr}'"
        )));
    }
    let Some(Item::Node(root)) = items.pop() else {
        unreachable!()
    };
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_surface() {
        let tree = parse_expression("5").unwrap();
        assert!(matches!(&tree, Rule::Surf(leaf) if leaf.key == 5 && leaf.sign == 1));
        assert_eq!(tree.display(), "5");
    }

    #[test]
    fn test_negative_surface() {
        let tree = parse_expression("-41").unwrap();
        assert!(matches!(&tree, Rule::Surf(leaf) if leaf.key == 41 && leaf.sign == -1));
    }

    #[test]
    fn test_simple_union() {
        let tree = parse_expression("10 : 11").unwrap();
        assert_eq!(tree.display(), "10 : 11");
        assert!(matches!(tree, Rule::Union(_, _)));
    }

    #[test]
    fn test_implicit_intersection() {
        let tree = parse_expression("-31 -32 33").unwrap();
        assert_eq!(tree.display(), "-31 -32 33");
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn test_left_to_right_no_precedence() {
        // Combination is positional: (1 : 2) then intersect 3
        let tree = parse_expression("1 : 2 3").unwrap();
        assert_eq!(tree.display(), "(1 : 2) 3");
    }

    #[test]
    fn test_brackets_override_order() {
        let tree = parse_expression("1 (2 : 3)").unwrap();
        assert_eq!(tree.display(), "1 (2 : 3)");
    }

    #[test]
    fn test_nested_brackets() {
        let tree = parse_expression("((1 2) : (3 4)) -5").unwrap();
        assert_eq!(tree.display(), "((1 2) : (3 4)) -5");
        assert_eq!(tree.leaf_count(), 5);
    }

    #[test]
    fn test_complement_group() {
        let tree = parse_expression("#(1 : 2) 3").unwrap();
        assert_eq!(tree.display(), "#(1 : 2) 3");
        assert!(matches!(&tree, Rule::Intersection(a, _) if matches!(**a, Rule::CompGrp(_))));
    }

    #[test]
    fn test_complement_object() {
        let tree = parse_expression("#12 -3").unwrap();
        assert_eq!(tree.display(), "#12 -3");
        assert!(matches!(&tree, Rule::Intersection(a, _) if matches!(**a, Rule::CompObj(_))));
    }

    #[test]
    fn test_complement_binds_to_whole_group() {
        let tree = parse_expression("#(5 : -6)").unwrap();
        match tree {
            Rule::CompGrp(inner) => assert_eq!(inner.display(), "5 : -6"),
            other => panic!("expected CompGrp, got {}", other.display()),
        }
    }

    #[test]
    fn test_unmatched_close() {
        assert!(matches!(
            parse_expression("10 ) 11"),
            Err(CsgError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_unmatched_open() {
        assert!(matches!(
            parse_expression("( 10 11"),
            Err(CsgError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_bad_character() {
        assert!(matches!(
            parse_expression("10 & 11"),
            Err(CsgError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_dangling_colon() {
        assert!(parse_expression("10 :").is_err());
        assert!(parse_expression(": 10").is_err());
    }

    #[test]
    fn test_stray_complement_rejected() {
        // A '#' that binds to neither a number nor a bracket is an error,
        // not a silent intersection
        assert!(matches!(
            parse_expression("1 # 2"),
            Err(CsgError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_empty_expression() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("   ").is_err());
    }

    #[test]
    fn test_huge_number_rejected() {
        assert!(parse_expression("99999999999999999999").is_err());
    }

    #[test]
    fn test_redisplay_reparses_identically() {
        for expr in ["-31 -32 33", "10 : 11", "#(1 : 2) 3", "((1 2) : (3 4)) -5"] {
            let tree = parse_expression(expr).unwrap();
            let again = parse_expression(&tree.display()).unwrap();
            assert_eq!(tree.display(), again.display(), "round-trip of '{expr}'");
        }
    }
}
