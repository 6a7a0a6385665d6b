//! Restores scripts packed with Dean Edwards' P.A.C.K.E.R.
//!
//! Packed scripts look like
//! `eval(function(p,a,c,k,e,d){...}('payload',radix,count,'sym|tab'.split('|'),0,{}))`.
//! Evaluating one of them only ever yields the restored payload, so instead of
//! running the unpacking function we perform the word substitution ourselves.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

use unbaser::Unbaser;

mod unbaser;

static PACKED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(eval\s*\(\s*)?function\s*\(\s*p\s*,\s*a\s*,\s*c\s*,\s*k\s*,\s*e\s*,\s*",
    )
    .unwrap()
});

static ARGS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\}\s*\(\s*'(?P<payload>.*)',\s*(?P<radix>\d+|\[\]),\s*(?P<count>\d+),\s*'(?P<symtab>.*)'\.split\('\|'\)(?:\s*,[^)]*)?\)",
    )
    .unwrap()
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnpackError {
    #[error("Invalid p.a.c.k.e.r data")]
    NotPacked,

    #[error("Could not make sense of p.a.c.k.e.r data (unexpected code structure)")]
    UnexpectedStructure,

    #[error("Invalid radix `{0}`")]
    InvalidRadix(String),

    #[error("Invalid symbol count `{0}`")]
    InvalidCount(String),

    #[error("Malformed p.a.c.k.e.r symtab ({count} != {len})")]
    SymtabMismatch { count: usize, len: usize },

    #[error("Unsupported radix {0}")]
    UnsupportedRadix(usize),
}

/// Whether the source contains a packer invocation, with or without the wrapping `eval(`
pub fn detect(source: &str) -> bool {
    PACKED_REGEX.is_match(source)
}

/// Restores the packed payload, keeping whatever code surrounds the invocation
///
/// # Errors
/// Errors when the source is not packed, the arguments cannot be located,
/// the symbol table size does not match its declared count or the radix is unsupported
pub fn unpack(source: &str) -> Result<String, UnpackError> {
    let head = PACKED_REGEX
        .captures(source)
        .ok_or(UnpackError::NotPacked)?;
    let head_match = head.get(0).ok_or(UnpackError::NotPacked)?;
    let wrapped_in_eval = head.get(1).is_some();

    let args = ARGS_REGEX
        .captures_at(source, head_match.start())
        .ok_or(UnpackError::UnexpectedStructure)?;
    let args_match = args.get(0).ok_or(UnpackError::UnexpectedStructure)?;

    let radix = match &args["radix"] {
        "[]" => 62,
        r => r
            .parse()
            .map_err(|_| UnpackError::InvalidRadix(r.to_string()))?,
    };
    let count = args["count"]
        .parse::<usize>()
        .map_err(|_| UnpackError::InvalidCount(args["count"].to_string()))?;
    let symtab = args["symtab"].split('|').collect::<Vec<_>>();

    if count != symtab.len() {
        return Err(UnpackError::SymtabMismatch {
            count,
            len: symtab.len(),
        });
    }
    debug!(radix, count, "Unpacking p.a.c.k.e.r payload");

    let unbaser = Unbaser::new(radix)?;
    let restored = resolve_string_table(&decode_words(&args["payload"], &symtab, &unbaser));

    let mut tail = &source[args_match.end()..];
    if wrapped_in_eval {
        let trimmed = tail.trim_start();
        tail = trimmed.strip_prefix(')').unwrap_or(tail);
    }

    Ok(format!(
        "{}{restored}{tail}",
        &source[..head_match.start()]
    ))
}

fn decode_words(payload: &str, symtab: &[&str], unbaser: &Unbaser) -> String {
    static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

    let cleaned = payload.replace(r"\\", r"\").replace(r"\'", "'");
    WORD_REGEX
        .replace_all(&cleaned, |caps: &Captures| {
            let word = &caps[0];
            match unbaser.unbase(word) {
                Some(index) if symtab.get(index).is_some_and(|s| !s.is_empty()) => {
                    symtab[index].to_string()
                }
                _ => word.to_string(),
            }
        })
        .into_owned()
}

/// Inlines a leading `var _x=["a","b"];` string table into its `_x[0]` references
fn resolve_string_table(source: &str) -> String {
    static TABLE_REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"var *(_\w+)\=\["(.*?)"\];"#).unwrap());

    let Some(caps) = TABLE_REGEX.captures(source) else {
        return source.to_string();
    };
    let Some(table) = caps.get(0) else {
        return source.to_string();
    };

    let name = &caps[1];
    let mut resolved = source[table.end()..].to_string();
    for (index, value) in caps[2].split("\",\"").enumerate() {
        resolved = resolved.replace(&format!("{name}[{index}]"), &format!("\"{value}\""));
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_packed_invocations() {
        assert!(detect("eval(function(p,a,c,k,e,r){}"));
        assert!(detect("eval ( function(p, a, c, k, e, d"));
        assert!(detect("function(p,a,c,k,e,d){return p}('0',10,1,'x'.split('|'))"));

        assert!(!detect(""));
        assert!(!detect("var a = b"));
        assert!(!detect("function(a,b){return a+b}"));
    }

    #[test]
    fn unpacks_simple_payload() {
        let packed = r"eval(function(p,a,c,k,e,r){e=String;if(!''.replace(/^/,String)){while(c--)r[c]=k[c]||c;k=[function(e){return r[e]}];e=function(){return'\\w+'};c=1};while(c--)if(k[c])p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c]);return p}('0 2=1',62,3,'var||a'.split('|'),0,{}))";
        assert_eq!(unpack(packed).unwrap(), "var a=1");
    }

    #[test]
    fn keeps_surrounding_code() {
        let packed = "function test (){alert ('This is a test!')}; eval(function(p,a,c,k,e,r){e=String;if(!''.replace(/^/,String)){while(c--)r[c]=k[c]||c;k=[function(e){return r[e]}];e=function(){return'\\w+'};c=1};while(c--)if(k[c])p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c]);return p}('0 2=\\'{Íâ–+›ï;ã†Ù¥#\\'',3,3,'var||a'.split('|'),0,{}))";
        assert_eq!(
            unpack(packed).unwrap(),
            "function test (){alert ('This is a test!')}; var a='{Íâ–+›ï;ã†Ù¥#'"
        );
    }

    #[test]
    fn empty_radix_defaults_to_62() {
        let packed = "eval(function(p,a,c,k,e,r){e=function(c){return c.toString(36)};if('0'.replace(0,e)==0){while(c--)r[e(c)]=k[c];k=[function(e){return r[e]||e}];e=function(){return'[0-9ab]'};c=1};while(c--)if(k[c])p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c]);return p}('$(5).a(6(){ $('.8').0(1); $('.b').0(4); $('.9').0(2); $('.7').0(3)})',[],12,'html|52136|555|65103|8088|document|function|r542c|r8ce6|rb0de|ready|rfab0'.split('|'),0,{}))";
        assert_eq!(
            unpack(packed).unwrap(),
            "$(document).ready(function(){ $('.r8ce6').html(52136); $('.rfab0').html(8088); $('.rb0de').html(555); $('.r542c').html(65103)})"
        );
    }

    #[test]
    fn unpacks_without_eval_wrapper() {
        let packed = r#"function(p,a,c,k,e,d){while(c--)if(k[c])p=p.replace(new RegExp('\\b'+c.toString(a)+'\\b','g'),k[c]);return p}('0 1="2://3.4/5/6.7";',10,8,'var|src|https|cdn|example|hls|master|m3u8'.split('|'))"#;
        assert_eq!(
            unpack(packed).unwrap(),
            r#"var src="https://cdn.example/hls/master.m3u8";"#
        );
    }

    #[test]
    fn resolves_string_table() {
        let source = r#"var _0xab=["hello","world"];log(_0xab[0]+_0xab[1])"#;
        assert_eq!(resolve_string_table(source), r#"log("hello"+"world")"#);
    }

    #[test]
    fn rejects_malformed_data() {
        assert_eq!(unpack("var a = 1").unwrap_err(), UnpackError::NotPacked);
        assert_eq!(
            unpack("eval(function(p,a,c,k,e,d){return p}").unwrap_err(),
            UnpackError::UnexpectedStructure
        );
        assert_eq!(
            unpack("eval(function(p,a,c,k,e,d){return p}('0 1',10,3,'a|b'.split('|'),0,{}))")
                .unwrap_err(),
            UnpackError::SymtabMismatch { count: 3, len: 2 }
        );
        assert_eq!(
            unpack("eval(function(p,a,c,k,e,d){return p}('0',99,1,'a'.split('|'),0,{}))")
                .unwrap_err(),
            UnpackError::UnsupportedRadix(99)
        );
    }
}
