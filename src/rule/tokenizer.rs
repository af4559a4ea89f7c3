//! Rule string tokenizer

use smallvec::SmallVec;

/// Token sequence borrowed from the rule string; most rules fit inline
pub type Tokens<'a> = SmallVec<[&'a str; 16]>;

/// Split a rule string into tokens.
///
/// Parentheses always become tokens of their own, everything else is split
/// on whitespace. There is no escaping, so literals cannot contain spaces or
/// parentheses.
pub fn tokenize(rule: &str) -> Tokens<'_> {
    let mut tokens = Tokens::new();

    for word in rule.split_whitespace() {
        let mut start = 0;
        for (i, c) in word.char_indices() {
            if c == '(' || c == ')' {
                if start < i {
                    tokens.push(&word[start..i]);
                }
                tokens.push(&word[i..i + 1]);
                start = i + 1;
            }
        }
        if start < word.len() {
            tokens.push(&word[start..]);
        }
    }

    tokens
}
