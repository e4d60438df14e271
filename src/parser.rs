//! Bracket notation parser
//!
//! Turns one line of Penn-style bracket notation, e.g.
//! `(IP (NP (NR 上海) (NR 浦东)) (VP (VV 同步)))`, into a [`Tree`].
//! Whitespace is insignificant. The parser is a single shift/reduce pass
//! over the tokens with an explicit stack, so nesting depth is bounded only
//! by memory.

use memchr::memchr2_iter;
use thiserror::Error;

use crate::tree::{NodeId, Tree, TreeBuilder, TreeError};

/// Error type for bracket parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingError {
    #[error("Parsing Error: Empty String !")]
    Empty,

    #[error("Parsing Error: unexpected ')' at token {position}")]
    UnexpectedClose { position: usize },

    #[error("Parsing Error: {open} unclosed '(' at end of input")]
    Unclosed { open: usize },

    #[error("Parsing Error: bracket closed at token {position} has no label")]
    MissingLabel { position: usize },

    #[error("Parsing Error: input is not a bracketed tree")]
    NotATree,

    #[error("Parsing Error: {0}")]
    Tree(#[from] TreeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Word(&'a str),
}

/// Split a line into delimiters and whitespace-separated words
///
/// Equivalent to padding every `(` and `)` with spaces and splitting on
/// whitespace.
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = 0;

    for delim in memchr2_iter(b'(', b')', line.as_bytes()) {
        tokens.extend(line[rest..delim].split_whitespace().map(Token::Word));
        tokens.push(if line.as_bytes()[delim] == b'(' {
            Token::Open
        } else {
            Token::Close
        });
        rest = delim + 1;
    }
    tokens.extend(line[rest..].split_whitespace().map(Token::Word));

    tokens
}

/// Stack entry: a raw token or an already reduced subtree
#[derive(Debug, Clone, Copy)]
enum Item<'a> {
    Open,
    Word(&'a str),
    Node(NodeId),
}

/// Parse a bracketed string into a Tree
pub fn parse(line: &str) -> Result<Tree, ParsingError> {
    if line.trim().is_empty() {
        return Err(ParsingError::Empty);
    }

    let mut builder = TreeBuilder::new();
    let mut stack: Vec<Item> = Vec::new();

    for (position, token) in tokenize(line).into_iter().enumerate() {
        match token {
            Token::Open => stack.push(Item::Open),
            Token::Word(word) => stack.push(Item::Word(word)),
            Token::Close if closes_literally(&stack) => stack.push(Item::Word(")")),
            Token::Close => reduce(&mut stack, &mut builder, position)?,
        }
    }

    match stack.as_slice() {
        [Item::Node(root)] => Ok(builder.build(*root)?),
        items => {
            let open = items.iter().filter(|item| matches!(item, Item::Open)).count();
            if open > 0 {
                Err(ParsingError::Unclosed { open })
            } else {
                Err(ParsingError::NotATree)
            }
        }
    }
}

/// Parse a sequence of lines, one tree per line
pub fn parse_many<'a, I>(lines: I) -> impl Iterator<Item = Result<Tree, ParsingError>>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().map(parse)
}

/// A `)` right after `( X` with `X` still a bare token is the word `)`,
/// as in `(NN ))`.
fn closes_literally(stack: &[Item]) -> bool {
    matches!(stack, [.., Item::Open, Item::Open | Item::Word(_)])
}

/// Pop back to the matching `(` and push the subtree it encloses
fn reduce(
    stack: &mut Vec<Item>,
    builder: &mut TreeBuilder,
    position: usize,
) -> Result<(), ParsingError> {
    // The top item is always consumed, even a `(`: `(VP ()` is VP over the
    // word "(".
    let Some(top) = stack.pop() else {
        return Err(ParsingError::UnexpectedClose { position });
    };

    // Collected right to left
    let mut items = vec![top];
    loop {
        match stack.pop() {
            Some(Item::Open) => break,
            Some(item) => items.push(item),
            None => return Err(ParsingError::UnexpectedClose { position }),
        }
    }

    // `items` is non-empty; the leftmost item names the constituent
    let Some(head) = items.pop() else {
        return Err(ParsingError::UnexpectedClose { position });
    };
    let label = match head {
        Item::Word(word) => word,
        // Only a stack ending in `( (` could put `(` in the label slot, and
        // that case is a literal `)` word.
        Item::Open => return Err(ParsingError::UnexpectedClose { position }),
        // `( (S ...) )`: an unlabeled wrapper around a single tree
        Item::Node(id) if items.is_empty() => {
            stack.push(Item::Node(id));
            return Ok(());
        }
        Item::Node(_) => return Err(ParsingError::MissingLabel { position }),
    };

    let children = items
        .into_iter()
        .rev()
        .map(|item| match item {
            Item::Node(id) => id,
            Item::Word(word) => builder.leaf(word),
            Item::Open => builder.leaf("("),
        })
        .collect();
    let id = builder.node(label, children)?;
    stack.push(Item::Node(id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squeeze(s: &str) -> String {
        s.split_whitespace().collect()
    }

    const BANK: &[&str] = &[
        "(IP (NP (NP (NR 上海) (NR 浦东)) (NP (NN 开发) (CC 与) (NN 法制) (NN 建设))) (VP (VV 同步)))",
        "(IP (VP 这是) (NP (NN 一个) (NN 测试)))",
        "(S (NP (DT The) (NN dog)) (VP (VBZ runs)) (. .))",
    ];

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("(NP(NN a)  b)"),
            vec![
                Token::Open,
                Token::Word("NP"),
                Token::Open,
                Token::Word("NN"),
                Token::Word("a"),
                Token::Close,
                Token::Word("b"),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for line in BANK {
            let tree = parse(line).unwrap();
            assert_eq!(squeeze(&tree.to_string()), squeeze(line));

            let again = parse(&tree.to_string()).unwrap();
            assert_eq!(again, tree);
        }
    }

    #[test]
    fn test_whitespace_insensitive() {
        let loose = parse("  ( IP(VP 这是 )\n\t(NP  (NN 一个)(NN 测试) ) )  ").unwrap();
        let tight = parse(BANK[1]).unwrap();
        assert_eq!(loose, tight);
        assert_eq!(loose.to_string(), BANK[1]);
    }

    #[test]
    fn test_sentence_and_tags() {
        let tree = parse(BANK[0]).unwrap();

        assert_eq!(tree.words().join(" "), "上海 浦东 开发 与 法制 建设 同步");
        assert_eq!(tree.tags().join(" "), "NR NR NN CC NN NN VV");
        assert_eq!(
            tree.pos_sentence().join(" "),
            "上海_NR 浦东_NR 开发_NN 与_CC 法制_NN 建设_NN 同步_VV"
        );
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_literal_parentheses() {
        let line = "(IP (VP () (NP  (NN 一个) (NN ))))";
        let tree = parse(line).unwrap();

        assert_eq!(squeeze(&tree.to_string()), squeeze(line));
        assert_eq!(tree.words(), ["(", "一个", ")"]);
        assert_eq!(tree.tags(), ["VP", "NN", "NN"]);

        // `( (` then `)`: the `)` is a word and both brackets stay open
        assert_eq!(parse("(( )").unwrap_err(), ParsingError::Unclosed { open: 2 });
    }

    #[test]
    fn test_unlabeled_wrapper() {
        let tree = parse("( (S (NP (PRP It)) (VP (VBZ works))) )").unwrap();
        assert_eq!(tree.root().label, "S");
        assert_eq!(tree.to_string(), "(S (NP (PRP It)) (VP (VBZ works)))");
    }

    #[test]
    fn test_parsing_error() {
        assert_eq!(parse(" ").unwrap_err(), ParsingError::Empty);
        assert_eq!(parse("").unwrap_err(), ParsingError::Empty);
        assert!(matches!(
            parse("(NP (NN a)))").unwrap_err(),
            ParsingError::UnexpectedClose { .. }
        ));
        assert_eq!(
            parse("(S (NP (NN a))").unwrap_err(),
            ParsingError::Unclosed { open: 1 }
        );
        assert_eq!(parse("just words").unwrap_err(), ParsingError::NotATree);
        assert!(matches!(
            parse("((NN a) (NN b))").unwrap_err(),
            ParsingError::MissingLabel { .. }
        ));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(ParsingError::Empty.to_string(), "Parsing Error: Empty String !");
    }

    #[test]
    fn test_parse_many() {
        let trees: Vec<_> = parse_many(BANK.iter().copied()).collect();
        assert_eq!(trees.len(), 3);
        assert!(trees.iter().all(Result::is_ok));
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 20_000;
        let line = format!("{}(NN x){}", "(X ".repeat(depth), ")".repeat(depth));
        let tree = parse(&line).unwrap();

        assert_eq!(tree.depth(), depth + 1);
        assert_eq!(tree.words(), ["x"]);
        assert_eq!(squeeze(&tree.to_string()), squeeze(&line));
    }
}
